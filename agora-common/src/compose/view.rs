use crate::{
    compose::{SortOrder, filter_by_term, sort_by_timestamp},
    model::{
        community::{AnnotatedCommunity, Community, CommunityPostCounts},
        post::Post,
    },
};
use serde::{Deserialize, Serialize};

/// What a view shows while its records are pending, failed, or loaded.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewStatus<T> {
    Loading,
    Error { message: String },
    Ready { data: T },
}

impl<T> ViewStatus<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewStatus<U> {
        match self {
            Self::Loading => ViewStatus::Loading,
            Self::Error { message } => ViewStatus::Error { message },
            Self::Ready { data } => ViewStatus::Ready { data: f(data) },
        }
    }

    /// Combines two statuses; the first failure wins, then loading.
    pub fn zip<U>(self, other: ViewStatus<U>) -> ViewStatus<(T, U)> {
        match (self, other) {
            (Self::Error { message }, _) | (_, ViewStatus::Error { message }) => {
                ViewStatus::Error { message }
            }
            (Self::Loading, _) | (_, ViewStatus::Loading) => ViewStatus::Loading,
            (Self::Ready { data: a }, ViewStatus::Ready { data: b }) => {
                ViewStatus::Ready { data: (a, b) }
            }
        }
    }

    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready { data } => Some(data),
            Self::Loading | Self::Error { .. } => None,
        }
    }
}

/// Parameters of the post listing view.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostListing<'a> {
    pub search: &'a str,
    pub order: SortOrder,
}

/// Title search followed by a chronological sort.
///
/// Community scoping has already happened when `posts` was fetched.
#[must_use]
pub fn compose_post_listing(posts: &[Post], listing: &PostListing<'_>) -> Vec<Post> {
    let filtered = filter_by_term(posts, listing.search, |post| &post.title);
    sort_by_timestamp(&filtered, listing.order, |post| post.created_at)
}

/// Name search over communities, each annotated with its post count.
///
/// The store order of `communities` is kept.
#[must_use]
pub fn compose_community_listing(
    communities: &[Community],
    counts: &CommunityPostCounts,
    search: &str,
) -> Vec<AnnotatedCommunity> {
    filter_by_term(communities, search, |community| &community.name)
        .into_iter()
        .map(|community| AnnotatedCommunity {
            post_count: counts.get(community.id),
            community,
        })
        .collect()
}

/// Title search over posts that were fetched for one community, without sorting.
#[must_use]
pub fn compose_community_posts(posts: &[Post], search: &str) -> Vec<Post> {
    filter_by_term(posts, search, |post| &post.title)
}

#[cfg(test)]
mod tests {
    use crate::{
        compose::{
            SortOrder, count_by_community,
            view::{
                PostListing, ViewStatus, compose_community_listing, compose_community_posts,
                compose_post_listing,
            },
        },
        model::{Id, community::Community, post::Post},
    };
    use time::{OffsetDateTime, macros::datetime};

    fn post(id: u64, title: &str, created_at: OffsetDateTime) -> Post {
        Post {
            id: Id::new(id),
            title: title.to_owned(),
            content: format!("content of {title}"),
            created_at,
            image_url: Some(format!("https://cdn.example/{id}.png")),
            avatar_url: None,
            like_count: Some(0),
            comment_count: Some(0),
            community_id: None,
        }
    }

    fn community(id: u64, name: &str) -> Community {
        Community {
            id: Id::new(id),
            name: name.to_owned(),
            description: String::new(),
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn post_listing_filters_then_sorts() {
        let posts = vec![
            post(1, "Rust tips", datetime!(2024-01-01 00:00 UTC)),
            post(2, "Go tips", datetime!(2024-03-01 00:00 UTC)),
            post(3, "More rust", datetime!(2024-02-01 00:00 UTC)),
        ];

        let newest = compose_post_listing(
            &posts,
            &PostListing {
                search: "RUST",
                order: SortOrder::NewestFirst,
            },
        );
        assert_eq!(
            newest.iter().map(|post| post.id.get()).collect::<Vec<_>>(),
            [3, 1]
        );

        let oldest = compose_post_listing(
            &posts,
            &PostListing {
                search: "",
                order: SortOrder::OldestFirst,
            },
        );
        assert_eq!(
            oldest.iter().map(|post| post.id.get()).collect::<Vec<_>>(),
            [1, 3, 2]
        );
    }

    #[test]
    fn post_listing_is_deterministic() {
        let posts = vec![
            post(1, "a", datetime!(2024-01-01 00:00 UTC)),
            post(2, "ab", datetime!(2024-01-01 00:00 UTC)),
            post(3, "abc", datetime!(2023-01-01 00:00 UTC)),
        ];
        let listing = PostListing {
            search: "a",
            order: SortOrder::NewestFirst,
        };

        let first = compose_post_listing(&posts, &listing);
        let second = compose_post_listing(&posts, &listing);
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|post| post.id.get()).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn community_listing_matches_case_insensitively_in_store_order() {
        let communities = vec![community(1, "Rust"), community(2, "rustlang"), community(3, "Go")];
        let counts = count_by_community([Some(Id::new(2)), Some(Id::new(2)), None]);

        let listing = compose_community_listing(&communities, &counts, "rust");
        assert_eq!(
            listing
                .iter()
                .map(|entry| (entry.community.name.as_str(), entry.post_count))
                .collect::<Vec<_>>(),
            [("Rust", 0), ("rustlang", 2)]
        );

        let everything = compose_community_listing(&communities, &counts, "");
        assert_eq!(everything.len(), 3);
        assert_eq!(everything[2].post_count, 0);
    }

    #[test]
    fn community_posts_are_not_resorted() {
        let posts = vec![
            post(1, "older first", datetime!(2020-01-01 00:00 UTC)),
            post(2, "newer", datetime!(2024-01-01 00:00 UTC)),
        ];
        let listed = compose_community_posts(&posts, "");
        assert_eq!(listed, posts);
        assert_eq!(compose_community_posts(&posts, "NEW").len(), 1);
    }

    #[test]
    fn failed_status_is_not_ready() {
        let status = ViewStatus::<Vec<Post>>::Error {
            message: "network error".to_owned(),
        };
        assert_eq!(status.map(|posts| posts.len()).ready(), None);
    }

    #[test]
    fn status_zip_and_map() {
        let ready = ViewStatus::<u8>::Ready { data: 1 };
        let loading = ViewStatus::<u8>::Loading;
        let failed = ViewStatus::<u8>::Error {
            message: "down".to_owned(),
        };

        assert_eq!(
            ready.clone().zip(ready.clone()).map(|(a, b)| a + b),
            ViewStatus::Ready { data: 2 }
        );
        assert_eq!(ready.clone().zip(loading.clone()), ViewStatus::Loading);
        assert_eq!(
            loading.zip(failed.clone()),
            ViewStatus::Error {
                message: "down".to_owned()
            }
        );
    }

    #[test]
    fn status_wire_format() {
        let json = serde_json::to_value(ViewStatus::Ready { data: [1, 2] }).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "ready", "data": [1, 2] }));

        let json = serde_json::to_value(ViewStatus::<()>::Error {
            message: "network error".to_owned(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "error", "message": "network error" })
        );
    }
}
