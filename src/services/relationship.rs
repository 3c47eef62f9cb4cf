use crate::{
    error::{AppError, Result},
    models::{FriendTransition, Relationship, User},
    repository::{ChangeSet, SocialStore},
    services::transition::{self, PairSnapshot, USER_NOT_FOUND},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 关系服务：关注、好友请求和好友关系
///
/// Every operation takes the caller's username explicitly; the request
/// boundary resolves it once from the authenticated principal.
#[derive(Clone)]
pub struct RelationshipService {
    store: Arc<dyn SocialStore>,
}

impl RelationshipService {
    pub async fn new(store: Arc<dyn SocialStore>) -> Result<Self> {
        Ok(Self { store })
    }

    async fn load_user(&self, username: &str) -> Result<User> {
        self.store
            .find_user(username)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
    }

    async fn load_pair(&self, actor: &str, target: &str) -> Result<PairSnapshot> {
        let actor_user = self.load_user(actor).await?;
        let target_user = self.load_user(target).await?;
        let outgoing = self.store.find_request(actor, target).await?;
        let incoming = self.store.find_request(target, actor).await?;

        Ok(PairSnapshot {
            actor: actor_user,
            target: target_user,
            outgoing,
            incoming,
        })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        self.store.commit(changes).await.map_err(AppError::lost_race)
    }

    /// 关注用户
    #[instrument(skip(self))]
    pub async fn follow(&self, actor: &str, target: &str) -> Result<()> {
        debug!("User {} following user {}", actor, target);
        transition::ensure_distinct(actor, target)?;

        let actor_user = self.load_user(actor).await?;
        self.load_user(target).await?;

        self.commit(transition::follow(actor_user, target)?).await?;
        info!("User {} followed user {}", actor, target);
        Ok(())
    }

    /// 取消关注用户
    #[instrument(skip(self))]
    pub async fn unfollow(&self, actor: &str, target: &str) -> Result<()> {
        debug!("User {} unfollowing user {}", actor, target);
        transition::ensure_distinct(actor, target)?;

        let actor_user = self.load_user(actor).await?;
        self.load_user(target).await?;

        self.commit(transition::unfollow(actor_user, target)?).await?;
        info!("User {} unfollowed user {}", actor, target);
        Ok(())
    }

    /// 发送好友请求，或接受对方已发来的请求
    #[instrument(skip(self))]
    pub async fn request_or_accept_friend(&self, actor: &str, target: &str) -> Result<FriendTransition> {
        debug!("User {} requesting friendship with {}", actor, target);
        transition::ensure_distinct(actor, target)?;

        let snapshot = self.load_pair(actor, target).await?;
        let next = transition::request_or_accept(snapshot)?;
        self.commit(next.changes).await?;

        info!("{} -> {}: {}", actor, target, next.kind.as_str());
        Ok(next.kind)
    }

    /// 拒绝收到的请求、撤回发出的请求或解除好友关系
    #[instrument(skip(self))]
    pub async fn remove_or_decline_friend(&self, actor: &str, target: &str) -> Result<FriendTransition> {
        debug!("User {} removing or declining {}", actor, target);
        transition::ensure_distinct(actor, target)?;

        let snapshot = self.load_pair(actor, target).await?;
        let next = transition::remove_or_decline(snapshot)?;
        self.commit(next.changes).await?;

        info!("{} -> {}: {}", actor, target, next.kind.as_str());
        Ok(next.kind)
    }

    /// Usernames the user has sent pending requests to. Empty is `NotFound`.
    pub async fn list_outgoing_requests(&self, username: &str) -> Result<BTreeSet<String>> {
        let targets: BTreeSet<String> = self
            .store
            .find_requests_from(username)
            .await?
            .into_iter()
            .map(|r| r.user_to)
            .collect();

        if targets.is_empty() {
            return Err(AppError::not_found("User didn't send friend requests"));
        }
        Ok(targets)
    }

    /// Usernames with pending requests to the user. Empty is `NotFound`.
    pub async fn list_incoming_requests(&self, username: &str) -> Result<BTreeSet<String>> {
        let senders: BTreeSet<String> = self
            .store
            .find_requests_to(username)
            .await?
            .into_iter()
            .map(|r| r.user_from)
            .collect();

        if senders.is_empty() {
            return Err(AppError::not_found("User has no incoming friend requests"));
        }
        Ok(senders)
    }

    /// 查询两个用户之间的关系
    pub async fn relationship(&self, actor: &str, target: &str) -> Result<Relationship> {
        transition::ensure_distinct(actor, target)?;
        let snapshot = self.load_pair(actor, target).await?;
        Ok(transition::relationship(&snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FriendRequest, RelationshipState};
    use crate::repository::{MemoryStore, MockSocialStore};

    async fn service_with(names: &[&str]) -> (RelationshipService, MemoryStore) {
        let store = MemoryStore::new();
        for name in names {
            store
                .save_user(User::new(*name, format!("{name}@example.com")))
                .await
                .unwrap();
        }
        let service = RelationshipService::new(Arc::new(store.clone())).await.unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_self_target_never_touches_storage() {
        // 没有设置任何期望：任何存储调用都会直接 panic
        let store = MockSocialStore::new();
        let service = RelationshipService::new(Arc::new(store)).await.unwrap();

        for result in [
            service.follow("alice", "alice").await,
            service.unfollow("alice", "alice").await,
        ] {
            assert!(matches!(result, Err(AppError::InvalidOperation(_))));
        }
        assert!(matches!(
            service.request_or_accept_friend("alice", "alice").await,
            Err(AppError::InvalidOperation(_))
        ));
        assert!(matches!(
            service.remove_or_decline_friend("alice", "alice").await,
            Err(AppError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn test_lost_race_reported_as_conflict() {
        let mut store = MockSocialStore::new();
        store.expect_find_user().returning(|name| {
            let mut user = User::new(name, format!("{name}@example.com"));
            user.version = 1;
            Ok(Some(user))
        });
        store.expect_find_request().returning(|_, _| Ok(None));
        store
            .expect_commit()
            .times(1)
            .returning(|_| Err(AppError::constraint_violation("friend request already exists")));

        let service = RelationshipService::new(Arc::new(store)).await.unwrap();
        let err = service.request_or_accept_friend("alice", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_users_are_not_found() {
        let (service, _) = service_with(&["alice"]).await;

        let err = service.follow("alice", "ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == USER_NOT_FOUND));

        let err = service.request_or_accept_friend("ghost", "alice").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_follow_and_unfollow_are_idempotent() {
        let (service, store) = service_with(&["alice", "bob"]).await;

        service.unfollow("alice", "bob").await.unwrap();
        service.follow("alice", "bob").await.unwrap();
        service.follow("alice", "bob").await.unwrap();
        assert!(store.find_user("alice").await.unwrap().unwrap().is_following("bob"));

        service.unfollow("alice", "bob").await.unwrap();
        service.unfollow("alice", "bob").await.unwrap();
        assert!(!store.find_user("alice").await.unwrap().unwrap().is_following("bob"));
    }

    #[tokio::test]
    async fn test_request_lists() {
        let (service, store) = service_with(&["alice", "bob", "carol"]).await;

        assert!(matches!(
            service.list_outgoing_requests("alice").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.list_incoming_requests("bob").await,
            Err(AppError::NotFound(_))
        ));

        store.save_request(FriendRequest::new("alice", "bob")).await.unwrap();
        store.save_request(FriendRequest::new("alice", "carol")).await.unwrap();

        let outgoing = service.list_outgoing_requests("alice").await.unwrap();
        assert_eq!(outgoing.into_iter().collect::<Vec<_>>(), vec!["bob", "carol"]);

        let incoming = service.list_incoming_requests("bob").await.unwrap();
        assert_eq!(incoming.into_iter().collect::<Vec<_>>(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_relationship_view_follows_transitions() {
        let (service, _) = service_with(&["alice", "bob"]).await;

        let view = service.relationship("alice", "bob").await.unwrap();
        assert_eq!(view.state, RelationshipState::Unconnected);

        service.request_or_accept_friend("alice", "bob").await.unwrap();
        assert_eq!(
            service.relationship("alice", "bob").await.unwrap().state,
            RelationshipState::RequestSent
        );
        let view = service.relationship("bob", "alice").await.unwrap();
        assert_eq!(view.state, RelationshipState::RequestReceived);
        assert!(view.followed_by);

        service.request_or_accept_friend("bob", "alice").await.unwrap();
        let view = service.relationship("alice", "bob").await.unwrap();
        assert_eq!(view.state, RelationshipState::Friends);
        assert!(view.following && view.followed_by);
    }
}
