use serde::{Deserialize, Serialize};

/// Relationship between an actor and a target, seen from the actor's side.
///
/// Following is orthogonal and reported separately in [`Relationship`];
/// `Following` is only used when no friendship-related state applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipState {
    Unconnected,
    Following,
    RequestSent,
    RequestReceived,
    Friends,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub actor: String,
    pub target: String,
    pub state: RelationshipState,
    /// actor → target
    pub following: bool,
    /// target → actor
    pub followed_by: bool,
}

/// Outcome of a successful friend operation, mostly useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendTransition {
    RequestCreated,
    RequestAccepted,
    RequestDeclined,
    RequestWithdrawn,
    FriendRemoved,
}

impl FriendTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendTransition::RequestCreated => "request_created",
            FriendTransition::RequestAccepted => "request_accepted",
            FriendTransition::RequestDeclined => "request_declined",
            FriendTransition::RequestWithdrawn => "request_withdrawn",
            FriendTransition::FriendRemoved => "friend_removed",
        }
    }
}
