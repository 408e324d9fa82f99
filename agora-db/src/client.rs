use crate::{
    record::{CommunityRecord, PostRecord, SessionRecord},
    source::RecordSource,
};
use agora_common::model::{
    Id, ModelValidationError,
    community::{Community, CommunityMarker, CreateCommunity},
    post::{NewPost, Post, PostImage, PostMarker},
    session::Session,
};
use sqlx::{PgPool, migrate::MigrateError, query, query_as, query_scalar};
use thiserror::Error;
use tracing::debug;

pub const POST_IMAGE_BUCKET: &str = "post-images";

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Applying migrations failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Postgres backed record store.
pub struct DbClient {
    pool: PgPool,
    storage_public_url: String,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, storage_public_url: impl Into<String>) -> Self {
        let storage_public_url = storage_public_url.into().trim_end_matches('/').to_owned();

        Self {
            pool,
            storage_public_url,
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    #[must_use]
    pub fn public_image_url(&self, path: &str) -> String {
        format!(
            "{}/{POST_IMAGE_BUCKET}/{}",
            self.storage_public_url,
            urlencoding::encode(path)
        )
    }

    pub async fn fetch_session(&self, access_token: &str) -> Result<Option<Session>> {
        let record = query_as::<_, SessionRecord>(
            "
            SELECT
                sessions.user_id,
                sessions.avatar_url,
                sessions.created_at,
                sessions.expires_at
            FROM
                auth.sessions
            WHERE
                sessions.access_token = $1
            ",
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;

        let session = record.map(Session::try_from).transpose()?;
        Ok(session)
    }
}

impl RecordSource for DbClient {
    type Error = DbError;

    fn is_unique_violation(error: &DbError) -> bool {
        matches!(error, DbError::Sqlx(sqlx::Error::Database(err)) if err.is_unique_violation())
    }

    async fn list_posts(&self, community: Option<Id<CommunityMarker>>) -> Result<Vec<Post>> {
        let records = match community {
            Some(community) => {
                query_as::<_, PostRecord>(
                    "
                    SELECT
                        posts.id,
                        posts.title,
                        posts.content,
                        posts.created_at,
                        posts.image_url,
                        posts.avatar_url,
                        NULL::BIGINT AS like_count,
                        NULL::BIGINT AS comment_count,
                        posts.community_id
                    FROM
                        board.posts
                    WHERE
                        posts.community_id = $1
                    ORDER BY
                        posts.created_at DESC
                    ",
                )
                .bind(i64::from(community))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                query_as::<_, PostRecord>(
                    "
                    SELECT
                        posts.id,
                        posts.title,
                        posts.content,
                        posts.created_at,
                        posts.image_url,
                        posts.avatar_url,
                        (
                            SELECT COUNT(*) FROM board.votes
                            WHERE votes.post_id = posts.id AND votes.vote = 1
                        ) AS like_count,
                        (
                            SELECT COUNT(*) FROM board.comments
                            WHERE comments.post_id = posts.id
                        ) AS comment_count,
                        posts.community_id
                    FROM
                        board.posts
                    ORDER BY
                        posts.created_at DESC
                    ",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn list_post_community_ids(&self) -> Result<Vec<Option<Id<CommunityMarker>>>> {
        let records = query_scalar::<_, Option<i64>>(
            "
            SELECT
                posts.community_id
            FROM
                board.posts
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let ids = records
            .into_iter()
            .map(|id| id.map(Id::try_from).transpose())
            .collect::<Result<_, _>>()?;
        Ok(ids)
    }

    async fn list_communities(&self) -> Result<Vec<Community>> {
        let records = query_as::<_, CommunityRecord>(
            "
            SELECT
                communities.id,
                communities.name,
                communities.description,
                communities.created_at
            FROM
                board.communities
            ORDER BY
                communities.created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let communities = records
            .into_iter()
            .map(Community::try_from)
            .collect::<Result<_, _>>()?;
        Ok(communities)
    }

    async fn fetch_community_name(&self, community: Id<CommunityMarker>) -> Result<String> {
        let name = query_scalar::<_, String>(
            "
            SELECT
                communities.name
            FROM
                board.communities
            WHERE
                communities.id = $1
            ",
        )
        .bind(i64::from(community))
        .fetch_optional(&self.pool)
        .await?;

        Ok(name.unwrap_or_default())
    }

    async fn fetch_post(&self, post: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            SELECT
                posts.id,
                posts.title,
                posts.content,
                posts.created_at,
                posts.image_url,
                posts.avatar_url,
                NULL::BIGINT AS like_count,
                NULL::BIGINT AS comment_count,
                posts.community_id
            FROM
                board.posts
            WHERE
                posts.id = $1
            ",
        )
        .bind(i64::from(post))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn community_name_exists(&self, name: &str) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM board.communities
                WHERE lower(communities.name) = lower($1)
            )
            ",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn upload_image(&self, path: &str, image: &PostImage) -> Result<String> {
        query(
            "
            INSERT INTO storage.objects (bucket, path, content_type, data)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(POST_IMAGE_BUCKET)
        .bind(path)
        .bind(image.content_type.as_deref())
        .bind(image.data.as_slice())
        .execute(&self.pool)
        .await?;

        debug!(path, size = image.data.len(), "Stored post image");

        Ok(self.public_image_url(path))
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Id<PostMarker>> {
        let returned_id = query_scalar::<_, i64>(
            "
            INSERT INTO board.posts
                (author_id, title, content, image_url, avatar_url, community_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING posts.id
            ",
        )
        .bind(i64::from(post.author))
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.avatar_url.as_deref())
        .bind(post.community_id.map(i64::from))
        .fetch_one(&self.pool)
        .await?;

        Ok(returned_id.try_into()?)
    }

    async fn insert_community(&self, community: &CreateCommunity) -> Result<Id<CommunityMarker>> {
        let returned_id = query_scalar::<_, i64>(
            "
            INSERT INTO board.communities (name, description)
            VALUES ($1, $2)
            RETURNING communities.id
            ",
        )
        .bind(&community.name)
        .bind(&community.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(returned_id.try_into()?)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::DbClient;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn public_image_urls_are_encoded() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/agora")
            .unwrap();
        let client = DbClient::new(pool, "https://storage.example/public/");

        assert_eq!(
            client.public_image_url("Hello world-1700000000000-cat.png"),
            "https://storage.example/public/post-images/Hello%20world-1700000000000-cat.png"
        );
    }
}
