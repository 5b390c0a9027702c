//! Caller identity model

use std::collections::HashSet;

use super::{RoleId, UserId};

/// 调用者身份
///
/// 由外部请求层解码令牌后注入；匿名调用者 `user_id` 为 None，
/// 角色集合在决策时回落到默认角色。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Option<UserId>,
    pub roles: HashSet<RoleId>,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<UserId>, roles: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            roles: roles.into_iter().collect(),
        }
    }

    /// 匿名调用者
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            roles: HashSet::new(),
        }
    }

    /// 携带角色的匿名调用者（例如仅持默认角色）
    pub fn anonymous_with_roles(roles: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            user_id: None,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    /// 生效角色集合：自身角色非空用自身，否则回落到默认角色
    pub fn effective_roles(&self, default_role: Option<&RoleId>) -> HashSet<RoleId> {
        if !self.roles.is_empty() {
            return self.roles.clone();
        }
        default_role.cloned().into_iter().collect()
    }
}
