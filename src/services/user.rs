use crate::{
    error::{AppError, Result},
    models::{RegisterUserRequest, User, UserProfile},
    repository::SocialStore,
    services::transition::USER_NOT_FOUND,
    utils::validation::validate_registration,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 用户服务，处理用户注册和资料查询
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn SocialStore>,
}

impl UserService {
    /// 创建新的用户服务实例
    pub async fn new(store: Arc<dyn SocialStore>) -> Result<Self> {
        Ok(Self { store })
    }

    /// 注册新用户；用户名或邮箱重复时返回 Conflict
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterUserRequest) -> Result<UserProfile> {
        validate_registration(&request)?;

        let user = User::new(request.username, request.email);
        let saved = self.store.save_user(user).await.map_err(|e| match e {
            AppError::ConstraintViolation(_) => {
                AppError::conflict("User with given username or email already exists")
            }
            other => other,
        })?;

        info!("Registered user {}", saved.username);
        Ok(UserProfile::from_user(saved, Default::default()))
    }

    /// 根据用户名获取用户资料
    pub async fn get_profile(&self, username: &str) -> Result<UserProfile> {
        debug!("Getting profile for user: {}", username);

        let user = self
            .store
            .find_user(username)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
        let followers = self.store.find_followers(username).await?;

        Ok(UserProfile::from_user(user, followers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use crate::services::RelationshipService;
    use fake::faker::internet::en::{SafeEmail, Username};
    use fake::Fake;

    fn request(username: &str, email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_generated_users() {
        let service = UserService::new(Arc::new(MemoryStore::new())).await.unwrap();

        for i in 0..10 {
            let base: String = Username().fake();
            // faker 的用户名可能重复，追加序号保证唯一
            let username = format!("{}{}", base.replace(|c: char| !c.is_ascii_alphanumeric(), ""), i);
            let email: String = SafeEmail().fake();
            let email = format!("{i}.{email}");

            let profile = service.register(request(&username, &email)).await.unwrap();
            assert_eq!(profile.username, username);
            assert!(profile.following.is_empty());
            assert!(profile.followers.is_empty());
            assert!(profile.friends.is_empty());
        }
    }

    #[tokio::test]
    async fn test_register_duplicates_conflict() {
        let service = UserService::new(Arc::new(MemoryStore::new())).await.unwrap();
        service.register(request("alice", "alice@example.com")).await.unwrap();

        let err = service
            .register(request("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = service
            .register(request("alicia", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let service = UserService::new(Arc::new(MemoryStore::new())).await.unwrap();

        assert!(service.register(request("", "a@example.com")).await.is_err());
        assert!(service.register(request("bad name", "a@example.com")).await.is_err());
        assert!(service.register(request("alice", "nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_profile_includes_derived_followers() {
        let store: Arc<dyn SocialStore> = Arc::new(MemoryStore::new());
        let users = UserService::new(store.clone()).await.unwrap();
        let relationships = RelationshipService::new(store).await.unwrap();

        users.register(request("alice", "alice@example.com")).await.unwrap();
        users.register(request("bob", "bob@example.com")).await.unwrap();
        relationships.follow("alice", "bob").await.unwrap();

        let bob = users.get_profile("bob").await.unwrap();
        assert_eq!(bob.followers, vec!["alice"]);
        assert!(bob.following.is_empty());

        let alice = users.get_profile("alice").await.unwrap();
        assert_eq!(alice.following, vec!["bob"]);

        let err = users.get_profile("ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
