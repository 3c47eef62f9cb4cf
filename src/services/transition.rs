//! Decision logic for the follow / friend-request / friendship state machine.
//!
//! Nothing in here touches storage: each function takes the current state of a
//! pair of users and returns the writes needed to reach the next state, or the
//! typed failure for that state.

use crate::{
    error::{AppError, Result},
    models::{FriendRequest, FriendTransition, Relationship, RelationshipState, User},
    repository::ChangeSet,
};

pub const USER_NOT_FOUND: &str = "User with given username not found";
pub const SELF_TARGET: &str = "Cannot target yourself";
pub const ALREADY_FRIENDS: &str = "already friends";
pub const REQUEST_ALREADY_SENT: &str = "request already sent";
pub const NOT_FRIENDS: &str = "not friends";

/// Current state of an (actor, target) pair as loaded from storage.
#[derive(Debug, Clone)]
pub struct PairSnapshot {
    pub actor: User,
    pub target: User,
    /// FriendRequest(actor → target)
    pub outgoing: Option<FriendRequest>,
    /// FriendRequest(target → actor)
    pub incoming: Option<FriendRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub kind: FriendTransition,
    pub changes: ChangeSet,
}

pub fn ensure_distinct(actor: &str, target: &str) -> Result<()> {
    if actor == target {
        return Err(AppError::invalid_operation(SELF_TARGET));
    }
    Ok(())
}

/// Accepts an incoming request if there is one, otherwise sends a new one.
///
/// The incoming request is checked first: if both directions exist at once,
/// the call is an acceptance and the stale outgoing request is dropped too.
pub fn request_or_accept(snapshot: PairSnapshot) -> Result<Transition> {
    let PairSnapshot {
        mut actor,
        mut target,
        outgoing,
        incoming,
    } = snapshot;
    ensure_distinct(&actor.username, &target.username)?;

    if let Some(incoming) = incoming {
        actor.add_friend(&target.username);
        target.add_friend(&actor.username);
        actor.follow(&target.username);

        let mut changes = ChangeSet::new().delete_request(incoming);
        if let Some(outgoing) = outgoing {
            changes = changes.delete_request(outgoing);
        }
        return Ok(Transition {
            kind: FriendTransition::RequestAccepted,
            changes: changes.save_user(actor).save_user(target),
        });
    }

    if outgoing.is_some() {
        return Err(AppError::conflict(REQUEST_ALREADY_SENT));
    }

    if actor.is_friend(&target.username) {
        return Err(AppError::conflict(ALREADY_FRIENDS));
    }

    // Commit fails if a crossing request landed after the snapshot.
    let changes = ChangeSet::new()
        .require_no_request(&target.username, &actor.username)
        .create_request(FriendRequest::new(&actor.username, &target.username));
    actor.follow(&target.username);
    Ok(Transition {
        kind: FriendTransition::RequestCreated,
        changes: changes.save_user(actor),
    })
}

/// Declines an incoming request, withdraws an outgoing one, or ends a
/// friendship, in that order of precedence.
pub fn remove_or_decline(snapshot: PairSnapshot) -> Result<Transition> {
    let PairSnapshot {
        mut actor,
        mut target,
        outgoing,
        incoming,
    } = snapshot;
    ensure_distinct(&actor.username, &target.username)?;

    // The requester keeps following the decliner.
    if let Some(incoming) = incoming {
        return Ok(Transition {
            kind: FriendTransition::RequestDeclined,
            changes: ChangeSet::new().delete_request(incoming),
        });
    }

    if let Some(outgoing) = outgoing {
        actor.unfollow(&target.username);
        return Ok(Transition {
            kind: FriendTransition::RequestWithdrawn,
            changes: ChangeSet::new().delete_request(outgoing).save_user(actor),
        });
    }

    if actor.is_friend(&target.username) {
        actor.remove_friend(&target.username);
        target.remove_friend(&actor.username);
        actor.unfollow(&target.username);
        return Ok(Transition {
            kind: FriendTransition::FriendRemoved,
            changes: ChangeSet::new().save_user(actor).save_user(target),
        });
    }

    Err(AppError::conflict(NOT_FRIENDS))
}

/// Adds `target` to the actor's following set. Already following is a no-op.
pub fn follow(mut actor: User, target: &str) -> Result<ChangeSet> {
    ensure_distinct(&actor.username, target)?;
    if actor.follow(target) {
        Ok(ChangeSet::new().save_user(actor))
    } else {
        Ok(ChangeSet::new())
    }
}

/// Removes `target` from the actor's following set. Not following is a no-op.
pub fn unfollow(mut actor: User, target: &str) -> Result<ChangeSet> {
    ensure_distinct(&actor.username, target)?;
    if actor.unfollow(target) {
        Ok(ChangeSet::new().save_user(actor))
    } else {
        Ok(ChangeSet::new())
    }
}

pub fn relationship(snapshot: &PairSnapshot) -> Relationship {
    let actor = &snapshot.actor;
    let target = &snapshot.target;
    let following = actor.is_following(&target.username);

    let state = if actor.is_friend(&target.username) {
        RelationshipState::Friends
    } else if snapshot.incoming.is_some() {
        RelationshipState::RequestReceived
    } else if snapshot.outgoing.is_some() {
        RelationshipState::RequestSent
    } else if following {
        RelationshipState::Following
    } else {
        RelationshipState::Unconnected
    };

    Relationship {
        actor: actor.username.clone(),
        target: target.username.clone(),
        state,
        following,
        followed_by: target.is_following(&actor.username),
    }
}
