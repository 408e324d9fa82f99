use agora_common::model::{
    Id,
    community::{Community, CommunityMarker, CreateCommunity},
    post::{NewPost, Post, PostImage, PostMarker},
};
use std::{error::Error, future::Future};

/// The external store every view reads from and every submission writes to.
pub trait RecordSource: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    /// Whether `error` is the store rejecting a write that breaks a uniqueness rule.
    fn is_unique_violation(error: &Self::Error) -> bool {
        let _ = error;
        false
    }

    /// Posts newest first. Scoped to one community when `community` is given,
    /// otherwise every post with its like and comment counts.
    fn list_posts(
        &self,
        community: Option<Id<CommunityMarker>>,
    ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send;

    /// The owning community of every post, one entry per post.
    fn list_post_community_ids(
        &self,
    ) -> impl Future<Output = Result<Vec<Option<Id<CommunityMarker>>>, Self::Error>> + Send;

    /// Communities newest first.
    fn list_communities(&self) -> impl Future<Output = Result<Vec<Community>, Self::Error>> + Send;

    /// The community's name, or an empty string when there is no such community.
    fn fetch_community_name(
        &self,
        community: Id<CommunityMarker>,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    fn fetch_post(
        &self,
        post: Id<PostMarker>,
    ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send;

    /// Whether a community with this name exists, ignoring case.
    fn community_name_exists(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Stores the image under `path` and returns its public URL.
    fn upload_image(
        &self,
        path: &str,
        image: &PostImage,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    fn insert_post(
        &self,
        post: &NewPost,
    ) -> impl Future<Output = Result<Id<PostMarker>, Self::Error>> + Send;

    fn insert_community(
        &self,
        community: &CreateCommunity,
    ) -> impl Future<Output = Result<Id<CommunityMarker>, Self::Error>> + Send;
}
