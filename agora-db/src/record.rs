use agora_common::model::{
    Id, ModelValidationError, community::Community, post::Post, session::Session,
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub image_url: Option<String>,
    pub avatar_url: Option<String>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub community_id: Option<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommunityRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct SessionRecord {
    pub user_id: i64,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
}

fn count(value: Option<i64>) -> Result<Option<u64>, ModelValidationError> {
    value
        .map(|count| u64::try_from(count).map_err(|_| ModelValidationError::NegativeCount(count)))
        .transpose()
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.try_into()?,
            title: value.title,
            content: value.content,
            created_at: value.created_at,
            image_url: value.image_url,
            avatar_url: value.avatar_url,
            like_count: count(value.like_count)?,
            comment_count: count(value.comment_count)?,
            community_id: value.community_id.map(Id::try_from).transpose()?,
        })
    }
}

impl TryFrom<CommunityRecord> for Community {
    type Error = ModelValidationError;

    fn try_from(value: CommunityRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.try_into()?,
            name: value.name,
            description: value.description,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = ModelValidationError;

    fn try_from(value: SessionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.try_into()?,
            avatar_url: value.avatar_url,
            created_at: value.created_at,
            expires_at: value.expires_at,
        })
    }
}
