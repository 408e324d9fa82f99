use crate::server::{
    Composer, Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
    notices::NoticeBoard,
    routes::{Submitted, post_notice, read_mode},
    view::View,
};
use agora_common::{
    compose::{
        SortOrder,
        view::{PostListing, ViewStatus},
    },
    model::{
        Id,
        community::CommunityMarker,
        post::{CreatePost, Post, PostImage, PostMarker},
    },
};
use agora_db::{
    client::DbClient,
    submit::{POST_CREATED, Submitter},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_get(get_post)
        .typed_post(create_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct ListPostsPath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct ListPostsQuery {
    #[serde(default)]
    search: String,
    community: Option<Id<CommunityMarker>>,
    #[serde(default)]
    sort: SortOrder,
    #[serde(default)]
    refresh: bool,
}

async fn list_posts(
    ListPostsPath(): ListPostsPath,
    State(composer): State<Arc<Composer>>,
    Query(query): Query<ListPostsQuery>,
) -> View<Vec<Post>> {
    let listing = PostListing {
        search: &query.search,
        order: query.sort,
    };
    let status = composer
        .post_listing(query.community, &listing, read_mode(query.refresh))
        .await;

    View(status)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct GetPostPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct RefreshQuery {
    #[serde(default)]
    refresh: bool,
}

async fn get_post(
    GetPostPath { id }: GetPostPath,
    State(composer): State<Arc<Composer>>,
    Query(query): Query<RefreshQuery>,
) -> Result<View<Post>> {
    let status = match composer.post(id, read_mode(query.refresh)).await {
        ViewStatus::Ready { data: Some(post) } => ViewStatus::Ready { data: post },
        ViewStatus::Ready { data: None } => return Err(ServerError::PostByIdNotFound(id)),
        ViewStatus::Loading => ViewStatus::Loading,
        ViewStatus::Error { message } => ViewStatus::Error { message },
    };

    Ok(View(status))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/create", rejection(ServerError))]
struct CreatePostPath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct ImageUpload {
    file_name: String,
    content_type: Option<String>,
    /// Base64 encoded bytes.
    data: String,
}

impl ImageUpload {
    fn decode(self) -> Result<PostImage> {
        Ok(PostImage {
            data: STANDARD.decode(self.data)?,
            file_name: self.file_name,
            content_type: self.content_type,
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct CreatePostBody {
    #[serde(flatten)]
    post: CreatePost,
    image: Option<ImageUpload>,
}

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(submitter): State<Arc<Submitter<DbClient>>>,
    State(notices): State<Arc<NoticeBoard>>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePostBody>,
) -> Result<Submitted<Id<PostMarker>>> {
    let image = body.image.map(ImageUpload::decode).transpose()?;
    let submitted = submitter
        .create_post(user.author(), body.post, image)
        .await
        .map(|id| Submitted::new(id, POST_CREATED));

    Ok(post_notice(&notices, user.author().id, submitted)?)
}
