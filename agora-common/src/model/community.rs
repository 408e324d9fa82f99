use crate::model::Id;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommunityMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Community {
    pub id: Id<CommunityMarker>,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreateCommunity {
    pub name: String,
    pub description: String,
}

/// A community together with the number of posts it currently holds.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct AnnotatedCommunity {
    #[serde(flatten)]
    pub community: Community,
    pub post_count: u64,
}

/// Number of posts per community, derived from the community ids of a post snapshot.
///
/// Only communities that own at least one post have an entry; everything else
/// counts as zero.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct CommunityPostCounts(HashMap<Id<CommunityMarker>, u64>);

impl CommunityPostCounts {
    #[must_use]
    pub fn get(&self, community: Id<CommunityMarker>) -> u64 {
        self.0.get(&community).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn increment(&mut self, community: Id<CommunityMarker>) {
        *self.0.entry(community).or_insert(0) += 1;
    }
}
