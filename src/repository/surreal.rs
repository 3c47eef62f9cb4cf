use super::{ChangeSet, SocialStore, STALE_REQUEST, STALE_USER};
use crate::{
    error::{AppError, Result},
    models::{FriendRequest, User},
    services::Database,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

const USER_FIELDS: &str = "username, email, following, friends, version, created_at";
const REQUEST_FIELDS: &str = "meta::id(id) AS id, user_from, user_to, created_at";

/// Maps index and optimistic-lock failures onto `ConstraintViolation`.
fn classify(err: surrealdb::Error) -> AppError {
    let message = err.to_string();
    if message.contains("already contains") {
        AppError::ConstraintViolation(message)
    } else if message.contains(STALE_USER) {
        AppError::constraint_violation(STALE_USER)
    } else if message.contains(STALE_REQUEST) {
        AppError::constraint_violation(STALE_REQUEST)
    } else {
        AppError::Database(err)
    }
}

/// Runs a write and surfaces the most meaningful statement error.
///
/// A failed transaction reports every statement as failed, so a constraint
/// violation is preferred over the generic "not executed" errors.
async fn execute(db: &Database, sql: &str, params: Value) -> Result<surrealdb::Response> {
    let mut response = db
        .client
        .query(sql)
        .bind(params)
        .await
        .map_err(classify)?;

    let errors: Vec<AppError> = response
        .take_errors()
        .into_values()
        .map(classify)
        .collect();
    if errors.is_empty() {
        return Ok(response);
    }

    let mut fallback = None;
    for err in errors {
        if matches!(err, AppError::ConstraintViolation(_)) {
            return Err(err);
        }
        if fallback.is_none() {
            fallback = Some(err);
        }
    }
    Err(fallback.unwrap_or_else(|| AppError::internal("query failed")))
}

/// 基于 SurrealDB 的存储实现
#[derive(Clone)]
pub struct SurrealStore {
    db: Arc<Database>,
}

impl SurrealStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
        Ok(serde_json::to_value(value)?)
    }
}

/// 把一次用户写入展开成 SurrealQL 语句，参数写入 `params`
fn push_user_write(sql: &mut String, params: &mut Map<String, Value>, idx: usize, user: &User) -> Result<()> {
    if !user.is_persisted() {
        let mut record = SurrealStore::to_value(user)?;
        record["version"] = json!(1);
        params.insert(format!("u{idx}"), record);
        sql.push_str(&format!("CREATE user CONTENT $u{idx};\n"));
        return Ok(());
    }

    params.insert(format!("u{idx}_username"), json!(user.username));
    params.insert(format!("u{idx}_version"), json!(user.version));
    params.insert(format!("u{idx}_following"), json!(user.following));
    params.insert(format!("u{idx}_friends"), json!(user.friends));
    sql.push_str(&format!(
        "LET $saved{idx} = (UPDATE user SET following = $u{idx}_following, friends = $u{idx}_friends, \
         version = version + 1 WHERE username = $u{idx}_username AND version = $u{idx}_version RETURN AFTER);\n\
         IF array::len($saved{idx}) = 0 {{ THROW \"{STALE_USER}\"; }};\n"
    ));
    Ok(())
}

#[async_trait]
impl SocialStore for SurrealStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_FIELDS} FROM user WHERE username = $username LIMIT 1");
        let mut response = self
            .db
            .query_with_params(&sql, json!({ "username": username }))
            .await?;
        let users: Vec<User> = response.take(0)?;
        Ok(users.into_iter().next())
    }

    async fn save_user(&self, user: User) -> Result<User> {
        let mut sql = String::new();
        let mut params = Map::new();
        push_user_write(&mut sql, &mut params, 0, &user)?;
        execute(&self.db, &sql, Value::Object(params)).await?;

        let mut saved = user;
        saved.version += 1;
        Ok(saved)
    }

    async fn find_followers(&self, username: &str) -> Result<BTreeSet<String>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT VALUE username FROM user WHERE following CONTAINS $username",
                json!({ "username": username }),
            )
            .await?;
        let followers: Vec<String> = response.take(0)?;
        Ok(followers.into_iter().collect())
    }

    async fn find_request(&self, user_from: &str, user_to: &str) -> Result<Option<FriendRequest>> {
        let sql = format!(
            "SELECT {REQUEST_FIELDS} FROM friend_request WHERE user_from = $user_from AND user_to = $user_to LIMIT 1"
        );
        let mut response = self
            .db
            .query_with_params(&sql, json!({ "user_from": user_from, "user_to": user_to }))
            .await?;
        let requests: Vec<FriendRequest> = response.take(0)?;
        Ok(requests.into_iter().next())
    }

    async fn save_request(&self, request: FriendRequest) -> Result<()> {
        debug!("Saving friend request {} -> {}", request.user_from, request.user_to);
        execute(
            &self.db,
            "CREATE friend_request CONTENT $request",
            json!({ "request": Self::to_value(&request)? }),
        )
        .await?;
        Ok(())
    }

    async fn delete_request(&self, request: &FriendRequest) -> Result<()> {
        execute(
            &self.db,
            "DELETE friend_request WHERE user_from = $user_from AND user_to = $user_to",
            json!({ "user_from": request.user_from, "user_to": request.user_to }),
        )
        .await?;
        Ok(())
    }

    async fn find_requests_from(&self, username: &str) -> Result<Vec<FriendRequest>> {
        let sql = format!("SELECT {REQUEST_FIELDS} FROM friend_request WHERE user_from = $username");
        let mut response = self
            .db
            .query_with_params(&sql, json!({ "username": username }))
            .await?;
        Ok(response.take(0)?)
    }

    async fn find_requests_to(&self, username: &str) -> Result<Vec<FriendRequest>> {
        let sql = format!("SELECT {REQUEST_FIELDS} FROM friend_request WHERE user_to = $username");
        let mut response = self
            .db
            .query_with_params(&sql, json!({ "username": username }))
            .await?;
        Ok(response.take(0)?)
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        let mut params = Map::new();

        for (idx, (user_from, user_to)) in changes.require_absent.iter().enumerate() {
            params.insert(format!("a{idx}_from"), json!(user_from));
            params.insert(format!("a{idx}_to"), json!(user_to));
            sql.push_str(&format!(
                "IF array::len((SELECT id FROM friend_request WHERE user_from = $a{idx}_from AND user_to = $a{idx}_to)) > 0 \
                 {{ THROW \"{STALE_REQUEST}\"; }};\n"
            ));
        }
        for (idx, request) in changes.delete_requests.iter().enumerate() {
            params.insert(format!("d{idx}_from"), json!(request.user_from));
            params.insert(format!("d{idx}_to"), json!(request.user_to));
            sql.push_str(&format!(
                "LET $deleted{idx} = (DELETE friend_request WHERE user_from = $d{idx}_from AND user_to = $d{idx}_to RETURN BEFORE);\n\
                 IF array::len($deleted{idx}) = 0 {{ THROW \"{STALE_REQUEST}\"; }};\n"
            ));
        }
        for (idx, request) in changes.create_requests.iter().enumerate() {
            params.insert(format!("c{idx}"), Self::to_value(request)?);
            sql.push_str(&format!("CREATE friend_request CONTENT $c{idx};\n"));
        }
        for (idx, user) in changes.save_users.iter().enumerate() {
            push_user_write(&mut sql, &mut params, idx, user)?;
        }
        sql.push_str("COMMIT TRANSACTION;");

        debug!("Committing transaction:\n{}", sql);
        execute(&self.db, &sql, Value::Object(params)).await?;
        Ok(())
    }
}
