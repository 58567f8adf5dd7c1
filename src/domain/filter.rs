//! Journal filters: a conjunction of optional predicates over trades.

use crate::domain::trade::{Direction, Trade};
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeFilter {
    /// Case-insensitive substring of the pair.
    pub pair: Option<String>,
    pub direction: Option<Direction>,
    /// Inclusive lower bound on the close date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the close date.
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of the notes or the pair.
    pub search: Option<String>,
}

impl TradeFilter {
    /// True when no predicate would reject anything. Blank text fields count
    /// as absent, the same as in [`TradeFilter::matches`].
    pub fn is_empty(&self) -> bool {
        non_blank(&self.pair).is_none()
            && self.direction.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && non_blank(&self.search).is_none()
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        if let Some(pair) = non_blank(&self.pair) {
            if !contains_ignore_case(&trade.pair, pair) {
                return false;
            }
        }
        if let Some(direction) = self.direction {
            if trade.direction != direction {
                return false;
            }
        }
        let close_date = trade.close_date();
        if self.from.is_some_and(|from| close_date < from) {
            return false;
        }
        if self.to.is_some_and(|to| close_date > to) {
            return false;
        }
        if let Some(needle) = non_blank(&self.search) {
            let in_notes = trade
                .notes
                .as_deref()
                .is_some_and(|notes| contains_ignore_case(notes, needle));
            if !in_notes && !contains_ignore_case(&trade.pair, needle) {
                return false;
            }
        }
        true
    }

    /// Keeps matching trades in their input order.
    pub fn apply(&self, trades: &[Trade]) -> Vec<Trade> {
        trades.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{sample_trades, TradeId};
    use chrono::NaiveDateTime;

    fn journal() -> Vec<Trade> {
        let now = NaiveDateTime::default();
        sample_trades()
            .into_iter()
            .enumerate()
            .map(|(i, input)| Trade::from_input(TradeId(i as i64 + 1), input, now))
            .collect()
    }

    fn ids(trades: &[Trade]) -> Vec<i64> {
        trades.iter().map(|t| t.id.0).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = TradeFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(&journal())), vec![1, 2, 3, 4]);
    }

    #[test]
    fn blank_text_fields_count_as_empty() {
        let filter = TradeFilter {
            pair: Some("  ".into()),
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(&journal())), ids(&journal()));

        let filter = TradeFilter {
            search: Some(" x ".into()),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn pair_is_case_insensitive_substring() {
        let filter = TradeFilter {
            pair: Some("usd".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&journal())), vec![1, 3, 4]);
    }

    #[test]
    fn blank_pair_is_ignored() {
        let filter = TradeFilter {
            pair: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&journal()).len(), 4);
    }

    #[test]
    fn direction_is_exact() {
        let filter = TradeFilter {
            direction: Some(Direction::Sell),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&journal())), vec![2, 4]);
    }

    #[test]
    fn date_bounds_are_inclusive_on_close_date() {
        let filter = TradeFilter {
            from: Some(date(2024, 3, 2)),
            to: Some(date(2024, 3, 4)),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&journal())), vec![2, 3]);
    }

    #[test]
    fn search_matches_notes_or_pair() {
        let by_notes = TradeFilter {
            search: Some("STOP LOSS".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_notes.apply(&journal())), vec![2]);

        let by_pair = TradeFilter {
            search: Some("cad".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_pair.apply(&journal())), vec![4]);
    }

    #[test]
    fn predicates_combine_as_conjunction() {
        let filter = TradeFilter {
            pair: Some("usd".into()),
            direction: Some(Direction::Buy),
            to: Some(date(2024, 3, 3)),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&journal())), vec![1]);
    }
}
