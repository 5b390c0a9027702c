//! Webhook 动作
//! 把请求/提交数据投递到外部 URL，传输实现由调用方注入

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use validator::Validate;

use crate::context::ExecutionContext;
use crate::error::{AppError, Result};
use crate::models::action::{ActionDescriptor, ActionMethod, HandlerPhase};

use super::ActionUnit;

/// Webhook 传输契约（HTTP 实现不在本核心范围内）
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn deliver(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<()>;
}

/// Webhook 动作设置
#[derive(Debug, Deserialize, Validate)]
pub struct WebhookSettings {
    #[validate(length(min = 1))]
    pub url: String,
    /// true 时投递失败中止管线，否则仅记日志
    #[serde(default)]
    pub block: bool,
}

impl WebhookSettings {
    fn parse(settings: &serde_json::Value) -> Result<Self> {
        let parsed: WebhookSettings = serde_json::from_value(settings.clone()).map_err(|e| {
            AppError::bad_configuration(format!("webhook action settings: {}", e))
        })?;
        parsed.validate().map_err(|e| {
            AppError::bad_configuration(format!("webhook action settings: {}", e))
        })?;
        Ok(parsed)
    }
}

/// Webhook 动作
///
/// 在管线内同步等待投递完成，维持动作间的顺序保证；
/// 不做重试，重试策略属于传输实现。
pub struct WebhookAction {
    transport: Arc<dyn WebhookTransport>,
}

impl WebhookAction {
    pub fn new(transport: Arc<dyn WebhookTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ActionUnit for WebhookAction {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn resolve(
        &self,
        action: &ActionDescriptor,
        _phase: HandlerPhase,
        method: ActionMethod,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        let settings = WebhookSettings::parse(&action.settings)?;

        let payload = serde_json::json!({
            "request": ctx.request.data,
            "submission": ctx.submission,
            "method": method.as_str(),
            "form": ctx.request.form_id,
        });

        match self.transport.deliver(&settings.url, &payload).await {
            Ok(()) => Ok(()),
            Err(e) if settings.block => Err(AppError::action(self.name(), e)),
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request.request_id,
                    url = %settings.url,
                    error = %e,
                    "Webhook delivery failed (non-blocking)"
                );
                Ok(())
            }
        }
    }
}
