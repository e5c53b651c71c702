use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One qualifying listing item.
///
/// Created once by the listing extractor; the enrichment phase may set
/// `supplemental_count` and nothing touches it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Ordinal label as printed on the card ("12.", "7", ...)
    pub rank: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<NaiveDate>,
    /// Critic score, expected 0-100
    pub score: Option<u32>,
    /// Absolute URL of the item's detail page
    #[serde(rename = "detailRef")]
    pub detail_ref: Option<String>,
    /// Filled in by enrichment only
    #[serde(rename = "supplementalCount")]
    pub supplemental_count: Option<u32>,
}

impl Record {
    /// Integer sort key derived from `rank`, see [`rank_key`]
    pub fn rank_key(&self) -> u64 {
        rank_key(self.rank.as_deref())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title: String = self.title.as_deref().unwrap_or("?").chars().take(45).collect();
        write!(
            f,
            "Rank {:>3} • {:<45} • MS {}",
            self.rank.as_deref().unwrap_or("?"),
            title,
            self.score.map_or_else(|| "?".to_string(), |s| s.to_string())
        )
    }
}

/// Parse a rank label into its sort key.
///
/// One trailing period is stripped and the remainder must be a non-empty run
/// of ASCII digits; anything else (including an absent label) maps to 0.
pub fn rank_key(rank: Option<&str>) -> u64 {
    let Some(label) = rank else {
        return 0;
    };
    let digits = label.strip_suffix('.').unwrap_or(label);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// Stable ascending sort by rank key; equal keys keep their incoming order.
pub fn sort_by_rank(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(Record::rank_key);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn ranked(rank: Option<&str>, title: &str) -> Record {
        Record {
            rank: rank.map(str::to_string),
            title: Some(title.to_string()),
            ..Record::default()
        }
    }

    #[rstest]
    #[case(Some("12."), 12)]
    #[case(Some("7"), 7)]
    #[case(Some(""), 0)]
    #[case(Some("N/A"), 0)]
    #[case(None, 0)]
    #[case(Some("."), 0)]
    #[case(Some("3.."), 0)]
    #[case(Some("+5"), 0)]
    #[case(Some("007."), 7)]
    fn rank_key_parsing(#[case] label: Option<&str>, #[case] expected: u64) {
        assert_eq!(rank_key(label), expected);
    }

    #[test]
    fn sort_keeps_relative_order_for_equal_keys() {
        let records = vec![
            ranked(Some("3."), "c"),
            ranked(None, "first-unranked"),
            ranked(Some("1."), "a"),
            ranked(Some("N/A"), "second-unranked"),
            ranked(Some("2"), "b"),
        ];

        let titles: Vec<_> = sort_by_rank(records)
            .into_iter()
            .filter_map(|r| r.title)
            .collect();

        assert_eq!(
            titles,
            vec!["first-unranked", "second-unranked", "a", "b", "c"]
        );
    }

    #[test]
    fn display_truncates_long_titles() {
        let record = ranked(Some("1."), &"x".repeat(80));
        let line = record.to_string();
        assert!(line.contains(&"x".repeat(45)));
        assert!(!line.contains(&"x".repeat(46)));
    }

    fn arb_record() -> impl Strategy<Value = Record> {
        (
            prop::option::of(prop_oneof!["[0-9]{1,3}\\.?", "[A-Z/]{0,3}"]),
            "[a-z]{1,8}",
        )
            .prop_map(|(rank, title)| Record {
                rank,
                title: Some(title),
                ..Record::default()
            })
    }

    proptest! {
        #[test]
        fn sorting_twice_is_idempotent(records in prop::collection::vec(arb_record(), 0..40)) {
            let once = sort_by_rank(records);
            let twice = sort_by_rank(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn sorted_keys_are_non_decreasing(records in prop::collection::vec(arb_record(), 0..40)) {
            let sorted = sort_by_rank(records);
            prop_assert!(sorted.windows(2).all(|w| w[0].rank_key() <= w[1].rank_key()));
        }
    }
}
