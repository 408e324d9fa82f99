//! Pure stages turning fetched record snapshots into what a view displays.
//!
//! Every stage borrows its input and returns a new collection, so the same
//! snapshot can be composed any number of times with identical results.

pub mod view;

use crate::model::{
    Id,
    community::{CommunityMarker, CommunityPostCounts},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "date_desc")]
    NewestFirst,
    #[serde(rename = "date_asc")]
    OldestFirst,
}

/// Keeps the items whose projected text contains `term`, ignoring case.
///
/// An empty term keeps everything. Relative order is preserved.
pub fn filter_by_term<T, F>(items: &[T], term: &str, projection: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    if term.is_empty() {
        return items.to_vec();
    }

    let term = term.to_lowercase();
    items
        .iter()
        .filter(|item| projection(*item).to_lowercase().contains(&term))
        .cloned()
        .collect()
}

/// Orders a copy of `items` by their projected timestamp.
///
/// Items with equal timestamps keep their input order in both directions.
pub fn sort_by_timestamp<T, F>(items: &[T], order: SortOrder, projection: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> OffsetDateTime,
{
    let mut sorted = items.to_vec();
    match order {
        SortOrder::NewestFirst => sorted.sort_by(|a, b| projection(b).cmp(&projection(a))),
        SortOrder::OldestFirst => sorted.sort_by(|a, b| projection(a).cmp(&projection(b))),
    }
    sorted
}

/// Tallies posts per owning community. Posts without a community are skipped.
pub fn count_by_community<I>(community_ids: I) -> CommunityPostCounts
where
    I: IntoIterator<Item = Option<Id<CommunityMarker>>>,
{
    let mut counts = CommunityPostCounts::default();
    for community in community_ids.into_iter().flatten() {
        counts.increment(community);
    }
    counts
}
