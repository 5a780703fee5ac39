//! Filter and sort pipeline shared by every list view.

use std::cmp::Ordering;

use crate::domain::allergies::{AllergyIndex, AllergySet};

use super::ListKind;
use super::query::SortDirection;

/// One record that passed the filters, by position in the source slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub index: usize,
    pub allergies: AllergySet,
}

/// Scope, filter and sort `records`. The sort is stable: records with equal
/// keys keep their source order in both directions.
pub fn run<K: ListKind>(
    records: &[K::Record],
    query: &K::Query,
    index: &AllergyIndex,
    sort_field: K::SortField,
    sort_direction: SortDirection,
) -> Vec<Match> {
    if K::restaurant_id(query).is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<Match> = records
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            let allergies = K::allergies(record, index);
            K::matches(record, query, &allergies).then_some(Match {
                index: position,
                allergies,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        let ordering = K::compare(
            &records[a.index],
            &a.allergies,
            &records[b.index],
            &b.allergies,
            sort_field,
        );
        match sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    matches
}

/// Case-insensitive substring search. A blank needle matches everything.
pub fn contains_text(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-folded comparison with a raw tiebreak, so that "apple" sorts next to
/// "Apple" rather than after every capitalized name.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn compare_count(a: usize, b: usize) -> Ordering {
    a.cmp(&b)
}
