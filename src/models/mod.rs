pub mod friend_request;
pub mod relationship;
pub mod user;

pub use friend_request::FriendRequest;
pub use relationship::{FriendTransition, Relationship, RelationshipState};
pub use user::{RegisterUserRequest, User, UserProfile};
