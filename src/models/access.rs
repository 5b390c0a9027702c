//! 访问规则模型
//! 权限条目的持久化形态与请求期展开出的访问快照

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Id, RoleId, UserId};

/// 角色粒度的权限类型（form.access / form.submissionAccess 条目）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    CreateAll,
    ReadAll,
    UpdateAll,
    DeleteAll,
    CreateOwn,
    ReadOwn,
    UpdateOwn,
    DeleteOwn,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::CreateAll => "create_all",
            AccessType::ReadAll => "read_all",
            AccessType::UpdateAll => "update_all",
            AccessType::DeleteAll => "delete_all",
            AccessType::CreateOwn => "create_own",
            AccessType::ReadOwn => "read_own",
            AccessType::UpdateOwn => "update_own",
            AccessType::DeleteOwn => "delete_own",
        }
    }

    /// 是否为 `_all` 变体（对匹配角色无条件放行）
    pub fn is_all(&self) -> bool {
        matches!(
            self,
            AccessType::CreateAll
                | AccessType::ReadAll
                | AccessType::UpdateAll
                | AccessType::DeleteAll
        )
    }
}

/// 权限条目
///
/// `roles` 在持久化文档里可能是纯字符串，也可能是带 `_id` 的对象引用，
/// 展开快照时统一转为规范字符串形式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionEntry {
    #[serde(rename = "type")]
    pub access_type: AccessType,
    #[serde(default)]
    pub roles: Vec<serde_json::Value>,
}

/// 资源粒度的权限类型（提交实体自身的 access 条目）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAccessType {
    Read,
    Write,
    Admin,
}

/// 资源粒度权限条目，由外部的行级过滤器消费
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePermissionEntry {
    #[serde(rename = "type")]
    pub access_type: ResourceAccessType,
    #[serde(default)]
    pub resources: Vec<Id>,
}

/// 将持久化的角色引用转为规范字符串
///
/// 支持纯字符串和带 `_id` 字段的对象两种形态，其余形态视为无效引用。
pub fn canonical_role_id(value: &serde_json::Value) -> Option<RoleId> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}

/// 单个实体（表单或提交）的展开访问规则
#[derive(Debug, Clone, Default)]
pub struct EntityAccess {
    pub owner: Option<UserId>,
    grants: HashMap<AccessType, Vec<RoleId>>,
}

impl EntityAccess {
    /// 从权限条目列表展开。同类型条目的角色列表合并
    pub fn from_entries(owner: Option<UserId>, entries: &[PermissionEntry]) -> Self {
        let mut grants: HashMap<AccessType, Vec<RoleId>> = HashMap::new();
        for entry in entries {
            let roles = grants.entry(entry.access_type).or_default();
            for role_ref in &entry.roles {
                if let Some(role_id) = canonical_role_id(role_ref) {
                    if !roles.contains(&role_id) {
                        roles.push(role_id);
                    }
                }
            }
        }
        Self { owner, grants }
    }

    /// 某一权限类型下被授权的角色列表
    pub fn roles_for(&self, access_type: AccessType) -> &[RoleId] {
        self.grants
            .get(&access_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// 被决策的实体种类，选择快照中对应的访问规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Form,
    Submission,
}

/// 请求期访问快照
///
/// 每个请求构建一次，构建后只读，不跨请求复用，也不持久化。
#[derive(Debug, Clone, Default)]
pub struct AccessSnapshot {
    pub form: EntityAccess,
    pub submission: EntityAccess,
    pub default_role: Option<RoleId>,
    pub admin_role: Option<RoleId>,
}

impl AccessSnapshot {
    pub fn entity(&self, kind: EntityKind) -> &EntityAccess {
        match kind {
            EntityKind::Form => &self.form,
            EntityKind::Submission => &self.submission,
        }
    }
}
