use crate::source::RecordSource;
use agora_common::model::{
    Id,
    community::{Community, CommunityMarker, CreateCommunity},
    post::{NewPost, Post, PostImage, PostMarker},
};
use std::{
    sync::Mutex,
    sync::atomic::{AtomicUsize, Ordering},
};
use thiserror::Error;
use time::{OffsetDateTime, macros::datetime};

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub(crate) enum FakeError {
    #[error("{0}")]
    Unavailable(String),
    #[error("duplicate key value violates unique constraint")]
    UniqueViolation,
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub posts: Vec<Post>,
    pub communities: Vec<Community>,
    pub uploads: Vec<(String, PostImage)>,
    pub failure: Option<String>,
    pub reject_community_insert: bool,
}

/// In-memory record store that counts every call it receives.
#[derive(Default)]
pub(crate) struct FakeSource {
    pub state: Mutex<FakeState>,
    pub calls: AtomicUsize,
}

pub(crate) fn post(id: u64, title: &str, created_at: OffsetDateTime, community: Option<u64>) -> Post {
    Post {
        id: Id::new(id),
        title: title.to_owned(),
        content: format!("About {title}"),
        created_at,
        image_url: None,
        avatar_url: None,
        like_count: Some(id),
        comment_count: Some(0),
        community_id: community.map(Id::new),
    }
}

pub(crate) fn community(id: u64, name: &str, created_at: OffsetDateTime) -> Community {
    Community {
        id: Id::new(id),
        name: name.to_owned(),
        description: format!("All about {name}"),
        created_at,
    }
}

impl FakeSource {
    pub fn with(posts: Vec<Post>, communities: Vec<Community>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                posts,
                communities,
                ..FakeState::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn sample() -> Self {
        Self::with(
            vec![
                post(1, "Hello World", datetime!(2024-01-01 00:00 UTC), Some(1)),
                post(2, "Hi There", datetime!(2024-02-01 00:00 UTC), Some(1)),
                post(3, "Borrow checker", datetime!(2024-03-01 00:00 UTC), Some(2)),
                post(4, "Unfiled hello", datetime!(2023-06-01 00:00 UTC), None),
            ],
            vec![
                community(2, "rustlang", datetime!(2023-02-01 00:00 UTC)),
                community(1, "Rust", datetime!(2023-01-01 00:00 UTC)),
                community(3, "Go", datetime!(2022-01-01 00:00 UTC)),
            ],
        )
    }

    pub fn fail_with(&self, message: &str) {
        self.state.lock().unwrap().failure = Some(message.to_owned());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<std::sync::MutexGuard<'_, FakeState>, FakeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        match &state.failure {
            Some(message) => Err(FakeError::Unavailable(message.clone())),
            None => Ok(state),
        }
    }
}

fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> OffsetDateTime) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

impl RecordSource for FakeSource {
    type Error = FakeError;

    fn is_unique_violation(error: &FakeError) -> bool {
        matches!(error, FakeError::UniqueViolation)
    }

    async fn list_posts(
        &self,
        community: Option<Id<CommunityMarker>>,
    ) -> Result<Vec<Post>, FakeError> {
        let state = self.begin()?;
        let posts = newest_first(&state.posts, |post| post.created_at);
        Ok(match community {
            Some(community) => posts
                .into_iter()
                .filter(|post| post.community_id == Some(community))
                .map(|post| Post {
                    like_count: None,
                    comment_count: None,
                    ..post
                })
                .collect(),
            None => posts,
        })
    }

    async fn list_post_community_ids(
        &self,
    ) -> Result<Vec<Option<Id<CommunityMarker>>>, FakeError> {
        let state = self.begin()?;
        Ok(state.posts.iter().map(|post| post.community_id).collect())
    }

    async fn list_communities(&self) -> Result<Vec<Community>, FakeError> {
        let state = self.begin()?;
        Ok(newest_first(&state.communities, |community| {
            community.created_at
        }))
    }

    async fn fetch_community_name(
        &self,
        community: Id<CommunityMarker>,
    ) -> Result<String, FakeError> {
        let state = self.begin()?;
        Ok(state
            .communities
            .iter()
            .find(|candidate| candidate.id == community)
            .map(|candidate| candidate.name.clone())
            .unwrap_or_default())
    }

    async fn fetch_post(&self, post: Id<PostMarker>) -> Result<Option<Post>, FakeError> {
        let state = self.begin()?;
        Ok(state.posts.iter().find(|candidate| candidate.id == post).cloned())
    }

    async fn community_name_exists(&self, name: &str) -> Result<bool, FakeError> {
        let state = self.begin()?;
        let name = name.to_lowercase();
        Ok(state
            .communities
            .iter()
            .any(|community| community.name.to_lowercase() == name))
    }

    async fn upload_image(&self, path: &str, image: &PostImage) -> Result<String, FakeError> {
        let mut state = self.begin()?;
        state.uploads.push((path.to_owned(), image.clone()));
        Ok(format!("https://storage.test/post-images/{path}"))
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Id<PostMarker>, FakeError> {
        let mut state = self.begin()?;
        let id = Id::new(state.posts.len() as u64 + 100);
        state.posts.push(Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            created_at: OffsetDateTime::now_utc(),
            image_url: Some(post.image_url.clone()),
            avatar_url: post.avatar_url.clone(),
            like_count: Some(0),
            comment_count: Some(0),
            community_id: post.community_id,
        });
        Ok(id)
    }

    async fn insert_community(
        &self,
        community: &CreateCommunity,
    ) -> Result<Id<CommunityMarker>, FakeError> {
        let mut state = self.begin()?;
        if state.reject_community_insert {
            return Err(FakeError::UniqueViolation);
        }
        let id = Id::new(state.communities.len() as u64 + 100);
        state.communities.push(Community {
            id,
            name: community.name.clone(),
            description: community.description.clone(),
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(id)
    }
}
