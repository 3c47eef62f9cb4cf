use crate::{
    config::{Config, StorageBackend},
    error::Result,
    repository::{MemoryStore, SocialStore, SurrealStore},
    services::{Database, RelationshipService, UserService},
};
use std::sync::Arc;
use tracing::{info, warn};

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 存储适配器
    pub store: Arc<dyn SocialStore>,

    /// 用户服务
    pub user_service: UserService,

    /// 关系服务
    pub relationship_service: RelationshipService,
}

impl AppState {
    /// 按配置选择存储后端并初始化所有服务
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn SocialStore> = match config.storage_backend {
            StorageBackend::Memory => {
                if config.is_production() {
                    warn!("Using in-memory storage in production; data will not survive a restart");
                }
                Arc::new(MemoryStore::new())
            }
            StorageBackend::Surrealdb => {
                let db = Database::new(&config).await?;
                db.verify_connection().await?;
                db.apply_schema().await?;
                Arc::new(SurrealStore::new(Arc::new(db)))
            }
        };
        info!("Storage backend: {:?}", config.storage_backend);

        Self::with_store(config, store).await
    }

    pub async fn with_store(config: Config, store: Arc<dyn SocialStore>) -> Result<Self> {
        let user_service = UserService::new(store.clone()).await?;
        let relationship_service = RelationshipService::new(store.clone()).await?;

        Ok(Self {
            config,
            store,
            user_service,
            relationship_service,
        })
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_wires_shared_store() {
        let state = AppState::new(Config::default()).await.unwrap();
        assert!(!state.is_production());

        state
            .user_service
            .register(crate::models::RegisterUserRequest {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await
            .unwrap();

        // 两个服务共享同一个存储
        assert!(state.store.find_user("alice").await.unwrap().is_some());
        assert!(matches!(
            state.relationship_service.follow("alice", "bob").await,
            Err(crate::error::AppError::NotFound(_))
        ));
    }
}
