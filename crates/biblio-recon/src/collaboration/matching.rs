//! Matching reconciled authors against an institutional roster.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::reconcile::IdentityRule;
use crate::config::Tuning;
use crate::models::{CollaborationAuthor, FuzzyMatchResult, RosterEntry, RosterMatch};

/// Strip accents, turn hyphens into spaces, drop `,` and `.`, lowercase and
/// collapse whitespace.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| *c != ',' && *c != '.')
        .map(|c| if c == '-' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two normalized names, 0 to 100.
pub trait SimilarityScorer: Send + Sync {
    fn ratio(&self, a: &str, b: &str) -> u8;
}

/// Normalized Levenshtein similarity as a rounded percentage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

impl SimilarityScorer for LevenshteinRatio {
    fn ratio(&self, a: &str, b: &str) -> u8 {
        let score = (strsim::normalized_levenshtein(a, b) * 100.0).round();
        score.clamp(0.0, 100.0) as u8
    }
}

/// Two-pass roster matcher: structural rule first, similarity ratio second.
pub struct RosterMatcher {
    rule: IdentityRule,
    threshold: u8,
    scorer: Box<dyn SimilarityScorer>,
}

impl RosterMatcher {
    #[must_use]
    pub fn new(rule: IdentityRule, threshold: u8, scorer: Box<dyn SimilarityScorer>) -> Self {
        Self { rule, threshold, scorer }
    }

    /// Matcher with the tuned rule and threshold and the Levenshtein scorer.
    #[must_use]
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(IdentityRule::from_tuning(tuning), tuning.fuzzy_threshold, Box::new(LevenshteinRatio))
    }

    /// Match every author against `roster`, keeping author order.
    ///
    /// Pass 1 applies the identity rule to normalized name parts. Pass 2 scores
    /// each remaining author against every roster name and accepts the best
    /// score when it reaches the threshold; those matches are flagged fuzzy.
    #[must_use]
    pub fn fuzzy_match_roster(&self, authors: &[CollaborationAuthor], roster: &[RosterEntry]) -> RosterMatch {
        let roster_names: Vec<(String, String, String)> = roster
            .iter()
            .map(|entry| {
                let (last, first) = entry.name_parts();
                (normalize_name(&last), normalize_name(&first), normalize_name(&entry.name))
            })
            .collect();

        let structural = |author: &CollaborationAuthor| {
            let last = normalize_name(&author.last_name);
            let first = normalize_name(&author.first_name);
            roster_names.iter().position(|(r_last, r_first, _)| self.rule.same_person(&last, &first, r_last, r_first))
        };

        // pass 1
        let mut outcome: Vec<Option<FuzzyMatchResult>> = authors
            .iter()
            .map(|author| {
                structural(author).map(|i| FuzzyMatchResult {
                    matched_author: author.clone(),
                    roster_entry: roster[i].clone(),
                    confidence: 100,
                    is_fuzzy: false,
                })
            })
            .collect();

        // pass 2
        for (slot, author) in outcome.iter_mut().zip(authors) {
            if slot.is_some() {
                continue;
            }
            let name = normalize_name(&author.full_name);
            let best = roster_names
                .iter()
                .enumerate()
                .map(|(i, (_, _, full))| (i, self.scorer.ratio(&name, full)))
                .fold(None, |best: Option<(usize, u8)>, (i, score)| match best {
                    Some((_, top)) if top >= score => best,
                    _ => Some((i, score)),
                });

            if let Some((i, score)) = best.filter(|(_, score)| *score >= self.threshold) {
                tracing::debug!(author = %author.full_name, roster = %roster[i].name, score, "Fuzzy roster match");
                *slot = Some(FuzzyMatchResult {
                    matched_author: author.clone(),
                    roster_entry: roster[i].clone(),
                    confidence: score,
                    is_fuzzy: true,
                });
            }
        }

        let mut result = RosterMatch::default();
        for (slot, author) in outcome.into_iter().zip(authors) {
            match slot {
                Some(m) => result.matched.push(m),
                None => result.unmatched.push(author.clone()),
            }
        }
        result
    }
}
