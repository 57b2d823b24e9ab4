//! Subject resolution for recognized timetable labels.
//!
//! Recognized labels are often abbreviated ("CN", "Networks") or slightly
//! misspelled. Matching runs an ordered chain of strategies, most precise
//! first, and stops at the first strategy that finds a subject.

use crate::db::{NewSubject, Subject};
use tracing::debug;

/// Colors handed out to subjects created during import.
pub const SUBJECT_PALETTE: [&str; 7] = [
    "#3b82f6", // blue
    "#ef4444", // red
    "#10b981", // green
    "#f59e0b", // amber
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#06b6d4", // cyan
];

/// Minimum word-overlap similarity for a fuzzy match.
const WORD_OVERLAP_THRESHOLD: f64 = 0.7;

/// Shortest shared prefix for two words to count as the same stem.
const MIN_STEM_LEN: usize = 5;

/// Picks a palette color round-robin by how many subjects already exist.
pub fn palette_color(existing_count: usize) -> &'static str {
    SUBJECT_PALETTE[existing_count % SUBJECT_PALETTE.len()]
}

/// A single matching heuristic.
///
/// Both arguments are already trimmed and lower-cased.
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, existing: &str, input: &str) -> bool;
}

/// Names are equal ignoring case.
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn matches(&self, existing: &str, input: &str) -> bool {
        existing == input
    }
}

/// Input is a prefix of the name, or equals the initials of its words.
pub struct AbbreviationMatch;

impl MatchStrategy for AbbreviationMatch {
    fn name(&self) -> &'static str {
        "abbreviation"
    }

    fn matches(&self, existing: &str, input: &str) -> bool {
        existing.starts_with(input) || initials(existing) == input
    }
}

/// Either name contains the other.
pub struct ContainmentMatch;

impl MatchStrategy for ContainmentMatch {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn matches(&self, existing: &str, input: &str) -> bool {
        existing.contains(input) || input.contains(existing)
    }
}

/// Enough of the words line up.
pub struct WordOverlapMatch {
    pub threshold: f64,
}

impl Default for WordOverlapMatch {
    fn default() -> Self {
        Self {
            threshold: WORD_OVERLAP_THRESHOLD,
        }
    }
}

impl MatchStrategy for WordOverlapMatch {
    fn name(&self) -> &'static str {
        "word_overlap"
    }

    fn matches(&self, existing: &str, input: &str) -> bool {
        word_similarity(existing, input) > self.threshold
    }
}

/// First character of each whitespace-separated word.
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

/// Two words match if either contains the other or they share a stem.
///
/// A stem is a common prefix of at least `MIN_STEM_LEN` characters that is
/// also more than half of the longer word, so "analysis" and "analytics"
/// match but "computer" and "computational" do not.
fn words_match(a: &str, b: &str) -> bool {
    if a.contains(b) || b.contains(a) {
        return true;
    }

    let shared = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    let longer = a.chars().count().max(b.chars().count());
    shared >= MIN_STEM_LEN && shared * 2 > longer
}

/// Fraction of `existing` words that have a matching `input` word, over the
/// larger word count.
pub fn word_similarity(existing: &str, input: &str) -> f64 {
    let existing_words: Vec<&str> = existing.split_whitespace().collect();
    let input_words: Vec<&str> = input.split_whitespace().collect();

    let denominator = existing_words.len().max(input_words.len());
    if denominator == 0 {
        return 0.0;
    }

    let matching = existing_words
        .iter()
        .filter(|ew| input_words.iter().any(|iw| words_match(ew, iw)))
        .count();

    matching as f64 / denominator as f64
}

/// Outcome of resolving one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An existing subject matched
    Existing {
        subject_id: i64,
        strategy: &'static str,
    },
    /// Nothing matched; this subject should be created
    Create(NewSubject),
}

/// Ordered chain of matching strategies.
pub struct SubjectResolver {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl SubjectResolver {
    /// Creates a resolver with the standard chain:
    /// exact, abbreviation, containment, word overlap.
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(ExactMatch),
            Box::new(AbbreviationMatch),
            Box::new(ContainmentMatch),
            Box::new(WordOverlapMatch::default()),
        ])
    }

    /// Creates a resolver with a custom chain, evaluated in order.
    pub fn with_strategies(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Finds the best existing subject for `raw_name`.
    ///
    /// Strategies run in order; within a strategy the first subject in
    /// `existing` wins. Blank input never matches.
    pub fn find_match<'a>(
        &self,
        raw_name: &str,
        existing: &'a [Subject],
    ) -> Option<(&'a Subject, &'static str)> {
        let input = raw_name.trim().to_lowercase();
        if input.is_empty() || existing.is_empty() {
            return None;
        }

        let lowered: Vec<String> = existing
            .iter()
            .map(|s| s.name.trim().to_lowercase())
            .collect();

        for strategy in &self.strategies {
            if let Some(pos) = lowered
                .iter()
                .position(|name| strategy.matches(name, &input))
            {
                debug!(
                    input = %input,
                    subject = %existing[pos].name,
                    strategy = strategy.name(),
                    "Resolved subject label"
                );
                return Some((&existing[pos], strategy.name()));
            }
        }

        None
    }

    /// Resolves `raw_name` to an existing subject or describes a new one.
    pub fn resolve(&self, raw_name: &str, existing: &[Subject]) -> Resolution {
        match self.find_match(raw_name, existing) {
            Some((subject, strategy)) => Resolution::Existing {
                subject_id: subject.id,
                strategy,
            },
            None => Resolution::Create(NewSubject {
                name: raw_name.trim().to_string(),
                color: palette_color(existing.len()).to_string(),
            }),
        }
    }
}

impl Default for SubjectResolver {
    fn default() -> Self {
        Self::new()
    }
}
