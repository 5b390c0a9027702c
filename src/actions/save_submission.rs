//! 保存提交动作
//! 在 before 阶段把请求载荷物化为待持久化的提交实体

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::context::ExecutionContext;
use crate::error::{AppError, Result};
use crate::models::action::{ActionDescriptor, ActionMethod, HandlerPhase};
use crate::models::submission::Submission;

use super::ActionUnit;

/// 保存动作设置
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SaveSettings {
    /// 映射后的数据挂载到该属性下（可选）
    #[validate(length(min = 1))]
    #[serde(default)]
    pub property: Option<String>,
    /// 字段改名映射：目标字段 -> 源字段
    #[serde(default)]
    pub fields: Option<std::collections::HashMap<String, String>>,
}

impl SaveSettings {
    fn parse(settings: &serde_json::Value) -> Result<Self> {
        if settings.is_null() {
            return Ok(Self::default());
        }
        let parsed: SaveSettings = serde_json::from_value(settings.clone())
            .map_err(|e| AppError::bad_configuration(format!("save action settings: {}", e)))?;
        parsed
            .validate()
            .map_err(|e| AppError::bad_configuration(format!("save action settings: {}", e)))?;
        Ok(parsed)
    }
}

/// 保存提交动作
///
/// 实际持久化仍由外部 CRUD 层完成；本动作只负责在执行上下文里
/// 构造/更新提交实体：字段映射、属性挂载与所有者指派。
#[derive(Default)]
pub struct SaveSubmissionAction;

impl SaveSubmissionAction {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionUnit for SaveSubmissionAction {
    fn name(&self) -> &'static str {
        "save"
    }

    async fn resolve(
        &self,
        action: &ActionDescriptor,
        phase: HandlerPhase,
        method: ActionMethod,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        // 只在写操作的 before 阶段有事可做
        if phase != HandlerPhase::Before
            || !matches!(method, ActionMethod::Create | ActionMethod::Update)
        {
            return Ok(());
        }

        let settings = SaveSettings::parse(&action.settings)?;

        let payload = ctx.request.data.clone();
        let mut mapped = match &settings.fields {
            Some(fields) => {
                let mut object = serde_json::Map::new();
                for (target, source) in fields {
                    if let Some(value) = payload.get(source) {
                        object.insert(target.clone(), value.clone());
                    }
                }
                serde_json::Value::Object(object)
            }
            None => payload.clone(),
        };
        if let Some(property) = &settings.property {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(property.clone(), mapped);
            mapped = serde_json::Value::Object(wrapper);
        }

        // 所有者指派：仅 `_all` 授权（或管理员）可沿用载荷自带的所有者
        let payload_owner = payload
            .get("owner")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let may_assign = ctx
            .decision
            .map_or(false, |d| d.assign_owner || d.is_admin);
        let owner = match payload_owner {
            Some(owner) if may_assign => Some(owner),
            _ => ctx.request.caller.user_id.clone(),
        };

        match ctx.submission.as_mut() {
            Some(submission) => {
                submission.data = mapped;
                submission.updated_at = Utc::now();
                if submission.owner.is_none() {
                    submission.owner = owner;
                }
            }
            None => {
                let now = Utc::now();
                let id = ctx
                    .request
                    .submission_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                ctx.submission = Some(Submission {
                    id,
                    form: ctx.request.form_id.clone().unwrap_or_default(),
                    owner,
                    data: mapped,
                    access: Vec::new(),
                    roles: Vec::new(),
                    deleted: None,
                    created_at: now,
                    updated_at: now,
                });
            }
        }

        Ok(())
    }
}
