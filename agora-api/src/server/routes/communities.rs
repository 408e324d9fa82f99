use crate::server::{
    Composer, Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
    notices::NoticeBoard,
    routes::{Submitted, post_notice, read_mode},
    view::View,
};
use agora_common::model::{
    Id,
    community::{AnnotatedCommunity, CommunityMarker, CreateCommunity},
};
use agora_db::{
    client::DbClient,
    composer::CommunityPosts,
    submit::{COMMUNITY_CREATED, Submitter},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_communities)
        .typed_get(list_community_posts)
        .typed_post(create_community)
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    refresh: bool,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/communities", rejection(ServerError))]
struct ListCommunitiesPath();

async fn list_communities(
    ListCommunitiesPath(): ListCommunitiesPath,
    State(composer): State<Arc<Composer>>,
    Query(query): Query<SearchQuery>,
) -> View<Vec<AnnotatedCommunity>> {
    View(
        composer
            .community_listing(&query.search, read_mode(query.refresh))
            .await,
    )
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/communities/{id}/posts", rejection(ServerError))]
struct ListCommunityPostsPath {
    id: Id<CommunityMarker>,
}

async fn list_community_posts(
    ListCommunityPostsPath { id }: ListCommunityPostsPath,
    State(composer): State<Arc<Composer>>,
    Query(query): Query<SearchQuery>,
) -> View<CommunityPosts> {
    View(
        composer
            .community_posts(id, &query.search, read_mode(query.refresh))
            .await,
    )
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/communities/create", rejection(ServerError))]
struct CreateCommunityPath();

async fn create_community(
    CreateCommunityPath(): CreateCommunityPath,
    State(submitter): State<Arc<Submitter<DbClient>>>,
    State(notices): State<Arc<NoticeBoard>>,
    user: AuthenticatedUser,
    Json(community): Json<CreateCommunity>,
) -> Result<Submitted<Id<CommunityMarker>>> {
    let submitted = submitter
        .create_community(community)
        .await
        .map(|id| Submitted::new(id, COMMUNITY_CREATED));

    Ok(post_notice(&notices, user.author().id, submitted)?)
}

#[cfg(test)]
mod tests {
    use crate::server::routes::communities::{
        CreateCommunityPath, ListCommunitiesPath, ListCommunityPostsPath,
    };
    use agora_common::model::Id;

    #[test]
    fn paths() {
        assert_eq!(ListCommunitiesPath().to_string(), "/communities");
        assert_eq!(
            ListCommunityPostsPath { id: Id::new(2) }.to_string(),
            "/communities/2/posts"
        );
        assert_eq!(CreateCommunityPath().to_string(), "/communities/create");
    }
}
