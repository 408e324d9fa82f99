use crate::{cache::QueryCache, source::RecordSource};
use agora_common::{
    compose::{
        count_by_community,
        view::{
            PostListing, ViewStatus, compose_community_listing, compose_community_posts,
            compose_post_listing,
        },
    },
    model::{
        Id,
        community::{AnnotatedCommunity, Community, CommunityMarker},
        post::{Post, PostMarker},
    },
};
use serde::Serialize;
use std::{future::Future, sync::Arc};
use tracing::warn;

/// Whether a view may be answered from the cache.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum ReadMode {
    #[default]
    Cached,
    /// Fetch again even if a result is cached, e.g. on navigation back to the view.
    Refresh,
}

/// Posts of one community together with its display name.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct CommunityPosts {
    /// Empty when the community does not exist.
    pub community_name: String,
    pub posts: Vec<Post>,
}

type CommunityIds = Arc<[Option<Id<CommunityMarker>>]>;

/// Turns fetched records into the listings the board shows.
///
/// Records are shared through per-query caches so views over the same query
/// reuse one fetch. The composition itself never touches the source.
pub struct ViewComposer<S> {
    source: Arc<S>,
    posts: QueryCache<Option<Id<CommunityMarker>>, Arc<[Post]>>,
    communities: QueryCache<(), Arc<[Community]>>,
    post_community_ids: QueryCache<(), CommunityIds>,
    community_names: QueryCache<Id<CommunityMarker>, Arc<str>>,
    post_details: QueryCache<Id<PostMarker>, Option<Post>>,
}

async fn read<K, V, F, Fut, E>(
    cache: &QueryCache<K, V>,
    key: &K,
    mode: ReadMode,
    fetcher: F,
) -> ViewStatus<V>
where
    K: Eq + std::hash::Hash + Clone + std::fmt::Debug,
    V: Clone,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<V, E>>,
    E: std::fmt::Display,
{
    match mode {
        ReadMode::Cached => cache.read_or_fetch(key, fetcher).await,
        ReadMode::Refresh => cache.refresh(key, fetcher).await,
    }
}

impl<S: RecordSource> ViewComposer<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            posts: QueryCache::new(),
            communities: QueryCache::new(),
            post_community_ids: QueryCache::new(),
            community_names: QueryCache::new(),
            post_details: QueryCache::new(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    async fn posts(
        &self,
        community: Option<Id<CommunityMarker>>,
        mode: ReadMode,
    ) -> ViewStatus<Arc<[Post]>> {
        read(&self.posts, &community, mode, || async move {
            self.source.list_posts(community).await.map(Arc::from)
        })
        .await
    }

    /// Posts filtered by title and sorted by creation time, optionally scoped to one community.
    pub async fn post_listing(
        &self,
        community: Option<Id<CommunityMarker>>,
        listing: &PostListing<'_>,
        mode: ReadMode,
    ) -> ViewStatus<Vec<Post>> {
        self.posts(community, mode)
            .await
            .map(|posts| compose_post_listing(&posts, listing))
    }

    /// Communities in store order, filtered by name and annotated with their post counts.
    ///
    /// Either fetch failing fails the whole view.
    pub async fn community_listing(
        &self,
        search: &str,
        mode: ReadMode,
    ) -> ViewStatus<Vec<AnnotatedCommunity>> {
        let (communities, community_ids) = tokio::join!(
            read(&self.communities, &(), mode, || async move {
                self.source.list_communities().await.map(Arc::from)
            }),
            read(&self.post_community_ids, &(), mode, || async move {
                self.source.list_post_community_ids().await.map(Arc::from)
            }),
        );

        communities
            .zip(community_ids)
            .map(|(communities, community_ids)| {
                let counts = count_by_community(community_ids.iter().copied());
                compose_community_listing(&communities, &counts, search)
            })
    }

    /// Posts of one community filtered by title, in the order the source returned them.
    ///
    /// A failed name lookup leaves the name empty instead of failing the view.
    pub async fn community_posts(
        &self,
        community: Id<CommunityMarker>,
        search: &str,
        mode: ReadMode,
    ) -> ViewStatus<CommunityPosts> {
        let (posts, name) = tokio::join!(
            self.posts(Some(community), mode),
            read(&self.community_names, &community, mode, || async move {
                self.source
                    .fetch_community_name(community)
                    .await
                    .map(Arc::from)
            }),
        );

        let community_name = match name {
            ViewStatus::Ready { data } => data.to_string(),
            ViewStatus::Error { message } => {
                warn!(%community, error = %message, "Could not fetch community name");
                String::new()
            }
            ViewStatus::Loading => String::new(),
        };

        posts.map(|posts| CommunityPosts {
            community_name,
            posts: compose_community_posts(&posts, search),
        })
    }

    /// A single post, `None` when there is no post with this id.
    pub async fn post(&self, post: Id<PostMarker>, mode: ReadMode) -> ViewStatus<Option<Post>> {
        read(&self.post_details, &post, mode, || async move {
            self.source.fetch_post(post).await
        })
        .await
    }

    /// Drops everything derived from posts. Call after a post was created.
    pub fn invalidate_posts(&self) {
        self.posts.invalidate_all();
        self.post_community_ids.invalidate(&());
        self.post_details.invalidate_all();
    }

    /// Drops everything derived from communities. Call after a community was created.
    pub fn invalidate_communities(&self) {
        self.communities.invalidate(&());
        self.community_names.invalidate_all();
    }
}
