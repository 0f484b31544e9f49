use std::ops::RangeInclusive;

use crate::record::PuzzleRecord;

pub const DEFAULT_MAX_RATING_DEVIATION: u32 = 80;
pub const DEFAULT_MIN_POPULARITY: i32 = 20;

/// Conjunctive query over the puzzle database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Exact theme tag, e.g. `mate` or `mateIn2`.
    pub theme: String,
    pub rating: RangeInclusive<u32>,
    pub max_rating_deviation: u32,
    pub min_popularity: i32,
    /// Number of solver moves, for mates that have no dedicated tag.
    pub solver_moves: Option<usize>,
}

impl FilterCriteria {
    pub fn new(theme: impl Into<String>, min_rating: u32, max_rating: u32) -> Self {
        Self {
            theme: theme.into(),
            rating: min_rating..=max_rating,
            max_rating_deviation: DEFAULT_MAX_RATING_DEVIATION,
            min_popularity: DEFAULT_MIN_POPULARITY,
            solver_moves: None,
        }
    }

    /// Mate in `n` within a rating band. Only `mateIn1`..`mateIn3` have
    /// precomputed buckets; any other `n` (Lichess also tags `mateIn4` and
    /// `mateIn5`) filters on `mate` plus the length of the solution.
    pub fn mate_in(n: usize, min_rating: u32, max_rating: u32) -> Self {
        if (1..=3).contains(&n) {
            Self::new(format!("mateIn{n}"), min_rating, max_rating)
        } else {
            Self {
                solver_moves: Some(n),
                ..Self::new("mate", min_rating, max_rating)
            }
        }
    }

    pub fn with_max_rating_deviation(mut self, max: u32) -> Self {
        self.max_rating_deviation = max;
        self
    }

    pub fn with_min_popularity(mut self, min: i32) -> Self {
        self.min_popularity = min;
        self
    }

    pub fn matches(&self, record: &PuzzleRecord) -> bool {
        record.has_theme(&self.theme) && self.matches_metadata(record)
    }

    /// Every predicate except the theme tag.
    pub(crate) fn matches_metadata(&self, record: &PuzzleRecord) -> bool {
        self.rating.contains(&record.rating)
            && record.rating_deviation <= self.max_rating_deviation
            && record.popularity >= self.min_popularity
            && self.solver_moves.is_none_or(|n| record.solver_moves() == n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;

    fn record(themes: &str, rating: u32, rd: u32, popularity: i32, moves: usize) -> PuzzleRecord {
        PuzzleRecord {
            id: "00001".to_string(),
            fen: Fen::default(),
            moves: vec!["e2e4".to_string(); moves],
            rating,
            rating_deviation: rd,
            popularity,
            nb_plays: 100,
            themes: themes.split_whitespace().map(str::to_string).collect(),
            game_url: String::new(),
            opening_tags: Vec::new(),
        }
    }

    #[test]
    fn rating_range_is_inclusive() {
        let c = FilterCriteria::new("mate", 1200, 1300);
        assert!(c.matches(&record("mate mateIn1", 1200, 75, 90, 2)));
        assert!(c.matches(&record("mate mateIn1", 1300, 75, 90, 2)));
        assert!(!c.matches(&record("mate mateIn1", 1199, 75, 90, 2)));
        assert!(!c.matches(&record("mate mateIn1", 1301, 75, 90, 2)));
    }

    #[test]
    fn theme_is_tag_membership_not_substring() {
        let c = FilterCriteria::new("mateIn1", 0, 3000);
        assert!(c.matches(&record("short mateIn1", 1500, 75, 90, 2)));
        assert!(!c.matches(&record("mateIn10", 1500, 75, 90, 2)));
        assert!(!c.matches(&record("mate", 1500, 75, 90, 2)));
    }

    #[test]
    fn deviation_and_popularity_bounds() {
        let c = FilterCriteria::new("mate", 0, 3000);
        assert!(c.matches(&record("mate", 1500, 80, 20, 2)));
        assert!(!c.matches(&record("mate", 1500, 81, 20, 2)));
        assert!(!c.matches(&record("mate", 1500, 80, 19, 2)));

        let relaxed = c.with_max_rating_deviation(200).with_min_popularity(-100);
        assert!(relaxed.matches(&record("mate", 1500, 150, -50, 2)));
    }

    #[test]
    fn mate_in_uses_tag_up_to_three() {
        assert_eq!(FilterCriteria::mate_in(2, 1000, 1100).theme, "mateIn2");
        assert_eq!(FilterCriteria::mate_in(2, 1000, 1100).solver_moves, None);

        let long = FilterCriteria::mate_in(4, 1000, 2000);
        assert_eq!(long.theme, "mate");
        assert!(long.matches(&record("mate mateIn4", 1500, 70, 50, 8)));
        assert!(!long.matches(&record("mate mateIn3", 1500, 70, 50, 6)));

        let five = FilterCriteria::mate_in(5, 1000, 2000);
        assert_eq!((five.theme.as_str(), five.solver_moves), ("mate", Some(5)));
        assert!(five.matches(&record("mate mateIn5", 1500, 70, 50, 10)));
        assert!(!five.matches(&record("mateIn5", 1500, 70, 50, 10)));
    }
}
