use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 待处理的好友请求：有向边 user_from → user_to
///
/// 每个有序对最多存在一条；唯一性由存储层的约束保证。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: String,
    pub user_from: String,
    pub user_to: String,
    pub created_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn new(user_from: &str, user_to: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_from: user_from.to_string(),
            user_to: user_to.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn is_between(&self, user_from: &str, user_to: &str) -> bool {
        self.user_from == user_from && self.user_to == user_to
    }
}
