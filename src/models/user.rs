use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// 身份存储中的用户记录
///
/// `followers` 不在这里保存：它是 `following` 的反向视图，由存储层按需推导。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub following: BTreeSet<String>,
    #[serde(default)]
    pub friends: BTreeSet<String>,
    /// 乐观锁版本号；0 表示尚未持久化
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            following: BTreeSet::new(),
            friends: BTreeSet::new(),
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Adds `username` to the following set. Self-references are ignored.
    pub fn follow(&mut self, username: &str) -> bool {
        if username == self.username {
            return false;
        }
        self.following.insert(username.to_string())
    }

    pub fn unfollow(&mut self, username: &str) -> bool {
        self.following.remove(username)
    }

    pub fn is_following(&self, username: &str) -> bool {
        self.following.contains(username)
    }

    pub fn add_friend(&mut self, username: &str) -> bool {
        if username == self.username {
            return false;
        }
        self.friends.insert(username.to_string())
    }

    pub fn remove_friend(&mut self, username: &str) -> bool {
        self.friends.remove(username)
    }

    pub fn is_friend(&self, username: &str) -> bool {
        self.friends.contains(username)
    }
}

/// 对外展示的用户资料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    pub friends: Vec<String>,
}

impl UserProfile {
    pub fn from_user(user: User, followers: BTreeSet<String>) -> Self {
        Self {
            username: user.username,
            email: user.email,
            following: user.following.into_iter().collect(),
            followers: followers.into_iter().collect(),
            friends: user.friends.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(
        length(min = 1, max = 32, message = "Username must be between 1 and 32 characters"),
        regex(path = "crate::utils::validation::USERNAME_REGEX", message = "Username may only contain letters, digits, '_', '.' and '-'")
    )]
    pub username: String,

    #[validate(
        email(message = "Email is not valid"),
        length(max = 256, message = "Email must be at most 256 characters")
    )]
    pub email: String,
}
