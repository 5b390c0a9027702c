//! Role domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RoleId;

/// Role
///
/// 每个租户应恰有一个 `default` 角色和一个 `admin` 角色，
/// 该唯一性由角色存储保证，不在本核心校验。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 匿名/未分配角色的调用者回落到的角色
    #[serde(default)]
    pub default: bool,
    /// 持有该角色即绕过所有权限检查
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub deleted: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
