use crate::error::{AppError, Result};
use crate::models::RegisterUserRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

/// 用户名只能包含字母、数字、下划线、点和连字符
pub static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username regex is valid"));

/// 验证用户名格式，返回第一条可读的错误
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::validation("Username must not be blank"));
    }

    if username.chars().count() > 32 {
        return Err(AppError::validation("Username must be at most 32 characters"));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::validation(
            "Username may only contain letters, digits, '_', '.' and '-'",
        ));
    }

    Ok(())
}

/// 注册请求的完整校验：先给出用户名的明确错误，再跑 derive 规则
pub fn validate_registration(request: &RegisterUserRequest) -> Result<()> {
    validate_username(&request.username)?;
    request.validate()?;
    Ok(())
}
