//! Storage interface the relationship engine depends on.
//!
//! The identity store half (`find_user`, `save_user`, `find_followers`) and the
//! relationship ledger half (`*_request*`) live on one trait so that a single
//! transition can be committed atomically across both.

pub mod memory;
pub mod surreal;

use crate::{
    error::Result,
    models::{FriendRequest, User},
};
use async_trait::async_trait;
use std::collections::BTreeSet;

pub use memory::MemoryStore;
pub use surreal::SurrealStore;

/// 一次状态转换需要落库的全部写操作
///
/// Applied in order: request deletions, request insertions, user saves.
/// Adapters must apply a change set all-or-nothing, and reject it with
/// `ConstraintViolation` when a precondition no longer holds: every request
/// to delete must still exist and every pair in `require_absent` must have no
/// pending request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub require_absent: Vec<(String, String)>,
    pub delete_requests: Vec<FriendRequest>,
    pub create_requests: Vec<FriendRequest>,
    pub save_users: Vec<User>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_no_request(mut self, user_from: &str, user_to: &str) -> Self {
        self.require_absent.push((user_from.to_string(), user_to.to_string()));
        self
    }

    pub fn delete_request(mut self, request: FriendRequest) -> Self {
        self.delete_requests.push(request);
        self
    }

    pub fn create_request(mut self, request: FriendRequest) -> Self {
        self.create_requests.push(request);
        self
    }

    pub fn save_user(mut self, user: User) -> Self {
        self.save_users.push(user);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.delete_requests.is_empty() && self.create_requests.is_empty() && self.save_users.is_empty()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialStore: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// Inserts a user with version 0, otherwise updates it if the stored
    /// version still matches. Returns the stored record with its new version.
    ///
    /// Fails with `ConstraintViolation` on a duplicate username/email or a
    /// stale version.
    async fn save_user(&self, user: User) -> Result<User>;

    /// Usernames whose `following` set contains `username`.
    async fn find_followers(&self, username: &str) -> Result<BTreeSet<String>>;

    async fn find_request(&self, user_from: &str, user_to: &str) -> Result<Option<FriendRequest>>;

    /// Fails with `ConstraintViolation` if a request for the same ordered
    /// pair already exists.
    async fn save_request(&self, request: FriendRequest) -> Result<()>;

    /// Deleting a request that no longer exists is not an error.
    async fn delete_request(&self, request: &FriendRequest) -> Result<()>;

    async fn find_requests_from(&self, username: &str) -> Result<Vec<FriendRequest>>;

    async fn find_requests_to(&self, username: &str) -> Result<Vec<FriendRequest>>;

    async fn commit(&self, changes: ChangeSet) -> Result<()>;
}

pub(crate) const STALE_REQUEST: &str = "stale friend request state";
pub(crate) const STALE_USER: &str = "stale user record";
