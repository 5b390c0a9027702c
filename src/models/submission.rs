//! Submission domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::access::ResourcePermissionEntry;
use super::{FormId, RoleId, SubmissionId, UserId};

/// Submission（表单数据文档）
///
/// `access` 是资源粒度的权限条目，由外部行级过滤器消费；
/// `roles` 存在是因为用户资源以提交形式存储，角色分配动作会改写它。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub form: FormId,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub access: Vec<ResourcePermissionEntry>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub deleted: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
