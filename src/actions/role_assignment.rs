//! 角色分配动作
//! 在提交实体上添加/移除角色（用户资源以提交形式存储）

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;
use validator::Validate;

use crate::context::ExecutionContext;
use crate::error::{AppError, Result};
use crate::models::action::{ActionDescriptor, ActionMethod, HandlerPhase};
use crate::store::{DocumentStore, RoleQuery};

use super::ActionUnit;

/// 分配目标：已有资源或本次新建的资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Association {
    Existing,
    New,
}

/// 分配方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleOp {
    Add,
    Remove,
}

/// 角色分配动作设置
#[derive(Debug, Deserialize, Validate)]
pub struct RoleSettings {
    pub association: Association,
    #[serde(rename = "type")]
    pub op: RoleOp,
    #[validate(length(min = 1))]
    pub role: String,
}

impl RoleSettings {
    fn parse(settings: &serde_json::Value) -> Result<Self> {
        let parsed: RoleSettings = serde_json::from_value(settings.clone()).map_err(|e| {
            AppError::bad_configuration(format!("role action settings: {}", e))
        })?;
        parsed.validate().map_err(|e| {
            AppError::bad_configuration(format!("role action settings: {}", e))
        })?;
        Ok(parsed)
    }
}

/// 角色分配动作
///
/// 需要管线顺序保证：通常配置在保存动作之后（更低优先级），
/// 此时上下文里已有物化完成的提交实体可供改写。
pub struct RoleAssignmentAction {
    store: Arc<dyn DocumentStore>,
}

impl RoleAssignmentAction {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ActionUnit for RoleAssignmentAction {
    fn name(&self) -> &'static str {
        "role"
    }

    async fn resolve(
        &self,
        action: &ActionDescriptor,
        _phase: HandlerPhase,
        _method: ActionMethod,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        let settings = RoleSettings::parse(&action.settings)?;

        // 角色必须真实存在；配错的角色 id 属于配置错误
        let role = self
            .store
            .find_role(&RoleQuery::by_id(settings.role.clone()))
            .await?
            .ok_or_else(|| {
                AppError::bad_configuration(format!("role '{}' not found", settings.role))
            })?;

        let Some(submission) = ctx.submission.as_mut() else {
            // 运行到这里却没有提交实体，说明动作顺序配置不当
            return Err(AppError::action(
                self.name(),
                anyhow!("no submission resource available to assign roles on"),
            ));
        };

        match settings.op {
            RoleOp::Add => {
                if !submission.roles.contains(&role.id) {
                    submission.roles.push(role.id.clone());
                }
            }
            RoleOp::Remove => {
                submission.roles.retain(|r| r != &role.id);
            }
        }

        tracing::debug!(
            request_id = %ctx.request.request_id,
            role = %role.id,
            op = ?settings.op,
            "Role assignment applied"
        );

        Ok(())
    }
}
