use crate::{composer::ViewComposer, source::RecordSource};
use agora_common::{
    model::{
        Id, capitalize_first,
        community::{CommunityMarker, CreateCommunity},
        post::{CreatePost, NewPost, PostImage, PostMarker},
        user::Author,
    },
    notification::Notice,
    validation::{ProfanityFilter, ValidationError},
};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, warn};

pub const POST_CREATED: &str = "Post created successfully!";
pub const COMMUNITY_CREATED: &str = "Community created successfully!";

/// What was being created when a submission failed.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Submission {
    Post,
    Community,
}

impl Submission {
    fn failure_message(self) -> &'static str {
        match self {
            Self::Post => "Error creating post. Please try again.",
            Self::Community => "Error creating community. Please try again.",
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A community with this name already exists.")]
    DuplicateCommunity,
    /// The store failed. `message` is the store's own error and stays in the logs.
    #[error("{}", submission.failure_message())]
    Store {
        submission: Submission,
        message: String,
    },
}

pub type Result<T, E = SubmitError> = std::result::Result<T, E>;

impl SubmitError {
    fn store(submission: Submission, err: &impl std::error::Error) -> Self {
        error!(?submission, %err, "Store rejected submission");
        Self::Store {
            submission,
            message: err.to_string(),
        }
    }

    /// What to tell the author about this failure.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(err) => Notice::validation_failure(err.to_string()),
            Self::DuplicateCommunity | Self::Store { .. } => Notice::error(self.to_string()),
        }
    }
}

/// Validates submissions and writes them to the record source.
///
/// Successful writes invalidate the composer's cached views that depend on them.
pub struct Submitter<S> {
    composer: Arc<ViewComposer<S>>,
    filter: ProfanityFilter,
}

impl<S: RecordSource> Submitter<S> {
    pub fn new(composer: Arc<ViewComposer<S>>, filter: ProfanityFilter) -> Self {
        Self { composer, filter }
    }

    fn source(&self) -> &S {
        self.composer.source()
    }

    pub async fn create_post(
        &self,
        author: &Author,
        post: CreatePost,
        image: Option<PostImage>,
    ) -> Result<Id<PostMarker>> {
        let image = self
            .filter
            .validate_post(&post, image.as_ref())
            .inspect_err(|err| warn!(author = %author.id, %err, "Rejected post"))?;

        let title = capitalize_first(&post.title);
        let unix_millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let path = format!("{title}-{unix_millis}-{}", image.file_name);

        let image_url = self
            .source()
            .upload_image(&path, image)
            .await
            .map_err(|err| SubmitError::store(Submission::Post, &err))?;

        let new_post = NewPost {
            author: author.id,
            title,
            content: post.content,
            image_url,
            avatar_url: author.avatar_url.clone(),
            community_id: post.community_id,
        };
        let id = self
            .source()
            .insert_post(&new_post)
            .await
            .map_err(|err| SubmitError::store(Submission::Post, &err))?;

        self.composer.invalidate_posts();
        info!(%id, author = %author.id, %path, "Created post");

        Ok(id)
    }

    /// Creates a community unless one with the same name exists, ignoring case.
    ///
    /// The existence check and the insert are separate calls. A concurrent
    /// insert of the same name is caught by the store's uniqueness rule and
    /// reported the same way.
    pub async fn create_community(
        &self,
        community: CreateCommunity,
    ) -> Result<Id<CommunityMarker>> {
        self.filter
            .validate_community(&community)
            .inspect_err(|err| warn!(name = %community.name, %err, "Rejected community"))?;

        let community = CreateCommunity {
            name: capitalize_first(&community.name),
            ..community
        };

        let exists = self
            .source()
            .community_name_exists(&community.name)
            .await
            .map_err(|err| SubmitError::store(Submission::Community, &err))?;
        if exists {
            warn!(name = %community.name, "Community name is taken");
            return Err(SubmitError::DuplicateCommunity);
        }

        let id = match self.source().insert_community(&community).await {
            Ok(id) => id,
            Err(err) if S::is_unique_violation(&err) => {
                warn!(name = %community.name, "Community name was taken concurrently");
                return Err(SubmitError::DuplicateCommunity);
            }
            Err(err) => return Err(SubmitError::store(Submission::Community, &err)),
        };

        self.composer.invalidate_communities();
        info!(%id, name = %community.name, "Created community");

        Ok(id)
    }
}
