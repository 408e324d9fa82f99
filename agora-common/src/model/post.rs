use crate::model::{Id, community::CommunityMarker, user::UserMarker};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A post as read from the record store.
///
/// `like_count` and `comment_count` are only present when the store computed
/// them for the query; `community_id` is absent for posts outside any community.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub image_url: Option<String>,
    pub avatar_url: Option<String>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub community_id: Option<Id<CommunityMarker>>,
}

/// Post fields as entered by the author.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub community_id: Option<Id<CommunityMarker>>,
}

/// Image attached to a post submission. The bytes are passed through untouched.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A post ready for insertion, after its image has been uploaded.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct NewPost {
    pub author: Id<UserMarker>,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub avatar_url: Option<String>,
    pub community_id: Option<Id<CommunityMarker>>,
}
