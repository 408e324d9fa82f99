//! Checks applied to submissions before anything is sent to the record store.

use crate::model::{
    community::CreateCommunity,
    post::{CreatePost, PostImage},
};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::warn;

/// Words rejected when no custom pattern is configured.
pub const DEFAULT_PROFANITY_WORDS: &[&str] = &[
    "arse",
    "arsehole",
    "asshole",
    "bastard",
    "bitch",
    "bollocks",
    "bullshit",
    "crap",
    "cunt",
    "dick",
    "dickhead",
    "fuck",
    "fucker",
    "fucking",
    "motherfucker",
    "piss",
    "prick",
    "shit",
    "slut",
    "twat",
    "wanker",
    "whore",
];

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum InvalidFilterPatternError {
    #[error("Profanity pattern does not compile: {0}")]
    Invalid(String),
    #[error("Profanity pattern matches innocuous text")]
    TooPermissive,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum ValidationError {
    #[error("Please enter a post title before submitting.")]
    MissingTitle,
    #[error("Please enter post content before submitting.")]
    MissingContent,
    #[error("Please select an image before submitting.")]
    MissingImage,
    #[error("Profanity is not allowed in post title or content.")]
    ProfanePost,
    #[error("Please enter a community name before submitting.")]
    MissingCommunityName,
    #[error("Profanity is not allowed in community name or description.")]
    ProfaneCommunity,
}

/// Case-insensitive whole-word matcher for disallowed words.
#[derive(Clone, Debug)]
pub struct ProfanityFilter {
    /// `None` matches nothing.
    regex: Option<Regex>,
}

impl ProfanityFilter {
    /// Builds a whole-word filter. An empty word list matches nothing.
    ///
    /// Fails when the combined pattern exceeds the regex size limit.
    pub fn from_words(words: &[&str]) -> Result<Self, InvalidFilterPatternError> {
        if words.is_empty() {
            return Ok(Self { regex: None });
        }

        let alternatives = words
            .iter()
            .map(|word| regex::escape(word))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&format!(r"\b(?:{alternatives})\b"))
            .case_insensitive(true)
            .build()
            .map_err(|err| InvalidFilterPatternError::Invalid(err.to_string()))?;

        Ok(Self { regex: Some(regex) })
    }

    /// Builds a filter from a user supplied pattern, or the default word list
    /// when there is none.
    ///
    /// Patterns that match a bare digit are rejected since they would flag
    /// nearly every submission.
    pub fn from_pattern(pattern: Option<&str>) -> Result<Self, InvalidFilterPatternError> {
        let Some(pattern) = pattern.filter(|pattern| !pattern.is_empty()) else {
            return Self::from_words(DEFAULT_PROFANITY_WORDS);
        };

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| InvalidFilterPatternError::Invalid(err.to_string()))?;

        if regex.is_match("1") {
            return Err(InvalidFilterPatternError::TooPermissive);
        }

        Ok(Self { regex: Some(regex) })
    }

    #[must_use]
    pub fn is_profane(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|regex| regex.is_match(text))
    }

    /// Checks a post submission and hands back its image once everything passes.
    pub fn validate_post<'i>(
        &self,
        post: &CreatePost,
        image: Option<&'i PostImage>,
    ) -> Result<&'i PostImage, ValidationError> {
        if post.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if post.content.trim().is_empty() {
            return Err(ValidationError::MissingContent);
        }
        let Some(image) = image else {
            return Err(ValidationError::MissingImage);
        };
        if self.is_profane(&post.title) || self.is_profane(&post.content) {
            return Err(ValidationError::ProfanePost);
        }
        Ok(image)
    }

    pub fn validate_community(&self, community: &CreateCommunity) -> Result<(), ValidationError> {
        if community.name.trim().is_empty() {
            return Err(ValidationError::MissingCommunityName);
        }
        if self.is_profane(&community.name) || self.is_profane(&community.description) {
            return Err(ValidationError::ProfaneCommunity);
        }
        Ok(())
    }
}

impl Default for ProfanityFilter {
    /// The default word list. Falls back to matching nothing, with a warning,
    /// if the list cannot be compiled.
    fn default() -> Self {
        Self::from_words(DEFAULT_PROFANITY_WORDS).unwrap_or_else(|err| {
            warn!(%err, "Default profanity filter unavailable, accepting all text");
            Self { regex: None }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            community::CreateCommunity,
            post::{CreatePost, PostImage},
        },
        validation::{InvalidFilterPatternError, ProfanityFilter, ValidationError},
    };

    fn image() -> PostImage {
        PostImage {
            file_name: "cat.png".to_owned(),
            content_type: Some("image/png".to_owned()),
            data: vec![0x89, 0x50, 0x4E, 0x47],
        }
    }

    fn create_post(title: &str, content: &str) -> CreatePost {
        CreatePost {
            title: title.to_owned(),
            content: content.to_owned(),
            community_id: None,
        }
    }

    #[test]
    fn default_filter_matches_whole_words_only() {
        let filter = ProfanityFilter::default();
        assert!(filter.is_profane("what the FUCK"));
        assert!(filter.is_profane("Shit happens"));
        assert!(!filter.is_profane("Scunthorpe United"));
        assert!(!filter.is_profane("a classic assessment"));
        assert!(!filter.is_profane(""));
    }

    #[test]
    fn custom_patterns() {
        let filter = ProfanityFilter::from_pattern(Some("(foo|bar)")).unwrap();
        assert!(filter.is_profane("FOO fighters"));
        assert!(!filter.is_profane("baz"));

        assert!(matches!(
            ProfanityFilter::from_pattern(Some("[")),
            Err(InvalidFilterPatternError::Invalid(_))
        ));
        assert_eq!(
            ProfanityFilter::from_pattern(Some(".*")).unwrap_err(),
            InvalidFilterPatternError::TooPermissive
        );
        assert_eq!(
            ProfanityFilter::from_pattern(Some("(foo|bar|)")).unwrap_err(),
            InvalidFilterPatternError::TooPermissive
        );

        let fallback = ProfanityFilter::from_pattern(None).unwrap();
        assert!(fallback.is_profane("bullshit"));
        let empty = ProfanityFilter::from_pattern(Some("")).unwrap();
        assert!(empty.is_profane("bullshit"));
    }

    #[test]
    fn word_lists() {
        let filter = ProfanityFilter::from_words(&["darn", "heck"]).unwrap();
        assert!(filter.is_profane("Darn it"));
        assert!(!filter.is_profane("darned"));

        let nothing = ProfanityFilter::from_words(&[]).unwrap();
        assert!(!nothing.is_profane("anything at all"));
    }

    #[test]
    fn post_validation_order() {
        let filter = ProfanityFilter::default();
        let image = image();

        assert_eq!(
            filter.validate_post(&create_post("  ", "body"), Some(&image)),
            Err(ValidationError::MissingTitle)
        );
        assert_eq!(
            filter.validate_post(&create_post("title", ""), Some(&image)),
            Err(ValidationError::MissingContent)
        );
        assert_eq!(
            filter.validate_post(&create_post("title", "body"), None),
            Err(ValidationError::MissingImage)
        );
        assert_eq!(
            filter.validate_post(&create_post("title", "total crap"), Some(&image)),
            Err(ValidationError::ProfanePost)
        );
        assert_eq!(
            filter.validate_post(&create_post("title", "body"), Some(&image)),
            Ok(&image)
        );
    }

    #[test]
    fn community_validation() {
        let filter = ProfanityFilter::default();
        let community = |name: &str, description: &str| CreateCommunity {
            name: name.to_owned(),
            description: description.to_owned(),
        };

        assert_eq!(
            filter.validate_community(&community(" ", "")),
            Err(ValidationError::MissingCommunityName)
        );
        assert_eq!(
            filter.validate_community(&community("rust", "no bullshit allowed")),
            Err(ValidationError::ProfaneCommunity)
        );
        assert_eq!(filter.validate_community(&community("rust", "")), Ok(()));
        assert_eq!(
            ValidationError::ProfaneCommunity.to_string(),
            "Profanity is not allowed in community name or description."
        );
    }
}
