use crate::model::Id;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// The signed-in user a submission is attributed to.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Author {
    pub id: Id<UserMarker>,
    pub avatar_url: Option<String>,
}
