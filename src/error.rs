//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use serde::Serialize;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// 授权失败。无论原因是权限不足还是实体不存在，对外表现一致
    #[error("Authentication failed")]
    Unauthorized,

    /// 动作配置错误（缺少必填设置、未知权限类型等）
    #[error("Invalid action configuration: {0}")]
    BadConfiguration(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// 文档/角色存储查询失败，调用方可重试
    #[error("Store error: {0}")]
    Store(String),

    /// 动作执行失败，中止当前请求剩余的管线
    #[error("Action '{action}' failed: {cause}")]
    ActionExecution { action: String, cause: anyhow::Error },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Unauthorized => 401,
            AppError::NotFound(_) => 404,
            AppError::BadConfiguration(_) | AppError::BadRequest(_) => 400,
            AppError::Store(_)
            | AppError::ActionExecution { .. }
            | AppError::Config(_)
            | AppError::Internal(_) => 500,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized => "Authentication failed".to_string(),
            AppError::NotFound(msg) => format!("Resource not found: {}", msg),
            AppError::BadConfiguration(msg) => format!("Invalid action configuration: {}", msg),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Store(_) => "Storage error occurred".to_string(),
            AppError::ActionExecution { action, .. } => format!("Action '{}' failed", action),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code()
    }

    // 便捷方法
    pub fn store(msg: impl Into<String>) -> Self {
        AppError::Store(msg.into())
    }

    pub fn bad_configuration(msg: impl Into<String>) -> Self {
        AppError::BadConfiguration(msg.into())
    }

    pub fn action(action: impl Into<String>, cause: anyhow::Error) -> Self {
        AppError::ActionExecution {
            action: action.into(),
            cause,
        }
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl ErrorResponse {
    /// 构造错误响应并记录日志
    pub fn from_error(err: &AppError) -> Self {
        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            code = err.code(),
            message = %err,
            request_id = %request_id,
            "Application error"
        );

        ErrorResponse {
            error: ErrorDetail {
                code: err.code(),
                message: err.user_message(),
                request_id,
            },
        }
    }
}

/// 从 String 转换为 AppError::Config
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Config(s)
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}
