use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    ValidatorError(#[from] validator::ValidationErrors),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 稳定的错误码，供表示层直接透传
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidOperation(_) => "INVALID_OPERATION",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            AppError::Validation(_) | AppError::ValidatorError(_) => "VALIDATION_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 面向调用方的原因描述（不带前缀）
    pub fn reason(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::InvalidOperation(msg)
            | AppError::Conflict(msg)
            | AppError::ConstraintViolation(msg)
            | AppError::Validation(msg)
            | AppError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// A storage-level uniqueness or version race lost by a relationship
    /// mutation is reported as a conflict; everything else passes through.
    pub fn lost_race(self) -> Self {
        match self {
            AppError::ConstraintViolation(msg) => {
                tracing::warn!("Relationship write lost a race: {}", msg);
                AppError::Conflict(msg)
            }
            other => other,
        }
    }
}

// 便利函数，用于创建常见错误
impl AppError {
    pub fn not_found(msg: &str) -> Self {
        Self::NotFound(msg.to_string())
    }

    pub fn invalid_operation(msg: &str) -> Self {
        Self::InvalidOperation(msg.to_string())
    }

    pub fn conflict(msg: &str) -> Self {
        Self::Conflict(msg.to_string())
    }

    pub fn constraint_violation(msg: &str) -> Self {
        Self::ConstraintViolation(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
