//! Form domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::access::PermissionEntry;
use super::{FormId, UserId};

/// Form（表单模式文档）
///
/// `access` 约束表单实体自身，`submissionAccess` 约束其下的提交实体。
/// `components` 为不透明的 JSON 模式，组件校验不在本核心范围内。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: FormId,
    pub title: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub access: Vec<PermissionEntry>,
    #[serde(default)]
    pub submission_access: Vec<PermissionEntry>,
    #[serde(default)]
    pub components: serde_json::Value,
    #[serde(default)]
    pub deleted: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
