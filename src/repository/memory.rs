use super::{ChangeSet, SocialStore, STALE_REQUEST, STALE_USER};
use crate::{
    error::{AppError, Result},
    models::{FriendRequest, User},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

type RequestKey = (String, String);

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    requests: HashMap<RequestKey, FriendRequest>,
}

impl Tables {
    /// 检查一次用户写入是否能通过唯一约束和版本校验，不修改任何数据
    fn check_user(&self, user: &User) -> Result<()> {
        if !user.is_persisted() {
            if self.users.contains_key(&user.username) {
                return Err(AppError::constraint_violation("username already taken"));
            }
            if self.users.values().any(|u| u.email == user.email) {
                return Err(AppError::constraint_violation("email already taken"));
            }
            return Ok(());
        }

        match self.users.get(&user.username) {
            Some(stored) if stored.version == user.version => Ok(()),
            _ => Err(AppError::constraint_violation(STALE_USER)),
        }
    }

    fn put_user(&mut self, mut user: User) -> User {
        user.version += 1;
        self.users.insert(user.username.clone(), user.clone());
        user
    }
}

fn request_key(user_from: &str, user_to: &str) -> RequestKey {
    (user_from.to_string(), user_to.to_string())
}

/// 进程内存储，主要用于测试和本地开发
///
/// The whole state sits behind one lock, so every `commit` is a single
/// critical section.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }

    pub fn request_count(&self) -> usize {
        self.tables.read().requests.len()
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(username).cloned())
    }

    async fn save_user(&self, user: User) -> Result<User> {
        let mut tables = self.tables.write();
        tables.check_user(&user)?;
        Ok(tables.put_user(user))
    }

    async fn find_followers(&self, username: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .filter(|u| u.is_following(username))
            .map(|u| u.username.clone())
            .collect())
    }

    async fn find_request(&self, user_from: &str, user_to: &str) -> Result<Option<FriendRequest>> {
        Ok(self
            .tables
            .read()
            .requests
            .get(&request_key(user_from, user_to))
            .cloned())
    }

    async fn save_request(&self, request: FriendRequest) -> Result<()> {
        let mut tables = self.tables.write();
        let key = request_key(&request.user_from, &request.user_to);
        if tables.requests.contains_key(&key) {
            return Err(AppError::constraint_violation("friend request already exists"));
        }
        tables.requests.insert(key, request);
        Ok(())
    }

    async fn delete_request(&self, request: &FriendRequest) -> Result<()> {
        self.tables
            .write()
            .requests
            .remove(&request_key(&request.user_from, &request.user_to));
        Ok(())
    }

    async fn find_requests_from(&self, username: &str) -> Result<Vec<FriendRequest>> {
        Ok(self
            .tables
            .read()
            .requests
            .values()
            .filter(|r| r.user_from == username)
            .cloned()
            .collect())
    }

    async fn find_requests_to(&self, username: &str) -> Result<Vec<FriendRequest>> {
        Ok(self
            .tables
            .read()
            .requests
            .values()
            .filter(|r| r.user_to == username)
            .cloned()
            .collect())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        let mut tables = self.tables.write();

        // 先整体校验，全部通过后再写入
        for (user_from, user_to) in &changes.require_absent {
            if tables.requests.contains_key(&request_key(user_from, user_to)) {
                return Err(AppError::constraint_violation(STALE_REQUEST));
            }
        }
        let deleted: BTreeSet<RequestKey> = changes
            .delete_requests
            .iter()
            .map(|r| request_key(&r.user_from, &r.user_to))
            .collect();
        if deleted.iter().any(|key| !tables.requests.contains_key(key)) {
            return Err(AppError::constraint_violation(STALE_REQUEST));
        }
        for request in &changes.create_requests {
            let key = request_key(&request.user_from, &request.user_to);
            if tables.requests.contains_key(&key) && !deleted.contains(&key) {
                return Err(AppError::constraint_violation("friend request already exists"));
            }
        }
        for user in &changes.save_users {
            tables.check_user(user)?;
        }

        for key in deleted {
            tables.requests.remove(&key);
        }
        for request in changes.create_requests {
            let key = request_key(&request.user_from, &request.user_to);
            tables.requests.insert(key, request);
        }
        for user in changes.save_users {
            tables.put_user(user);
        }

        debug!(
            "Committed change set; {} users, {} pending requests stored",
            tables.users.len(),
            tables.requests.len()
        );
        Ok(())
    }
}
