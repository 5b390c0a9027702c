//! 权限决策服务
//! 纯函数式的允许/拒绝决策，并产出下游消费的副作用标志

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::context::EntityRef;
use crate::error::{AppError, Result};
use crate::models::access::{AccessSnapshot, AccessType};
use crate::models::auth::CallerIdentity;

/// HTTP 方法到权限类型对的映射，`_all` 变体在前
static METHOD_ACCESS: Lazy<HashMap<&'static str, [AccessType; 2]>> = Lazy::new(|| {
    HashMap::from([
        ("POST", [AccessType::CreateAll, AccessType::CreateOwn]),
        ("GET", [AccessType::ReadAll, AccessType::ReadOwn]),
        ("PUT", [AccessType::UpdateAll, AccessType::UpdateOwn]),
        ("DELETE", [AccessType::DeleteAll, AccessType::DeleteOwn]),
    ])
});

/// 权限决策结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub is_admin: bool,
    /// 调用方可在载荷中指定任意所有者（仅 `_all` 授权放开）
    pub assign_owner: bool,
    /// 无需外部行级所有者过滤收窄结果
    pub skip_owner_filter: bool,
}

impl PermissionDecision {
    fn denied() -> Self {
        Self {
            allowed: false,
            is_admin: false,
            assign_owner: false,
            skip_owner_filter: false,
        }
    }

    fn admin() -> Self {
        Self {
            allowed: true,
            is_admin: true,
            assign_owner: false,
            skip_owner_filter: true,
        }
    }
}

/// 外部注入的管理员强制判定（如服务器内部调用）
pub type AdminOverride = dyn Fn(&CallerIdentity) -> bool + Send + Sync;

/// 权限决策引擎
///
/// `decide` 不做任何 I/O，不依赖时间，相同输入必得相同输出。
#[derive(Default)]
pub struct PermissionService {
    admin_override: Option<Box<AdminOverride>>,
}

impl PermissionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin_override(
        mut self,
        hook: impl Fn(&CallerIdentity) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.admin_override = Some(Box::new(hook));
        self
    }

    /// 对给定实体与方法做出允许/拒绝决策
    ///
    /// `payload` 是 POST/PUT 的请求载荷，用于判断调用方是否试图
    /// 自带所有者。未知方法与缺失实体一律拒绝，不抛错。
    pub fn decide(
        &self,
        identity: &CallerIdentity,
        snapshot: &AccessSnapshot,
        entity: Option<&EntityRef>,
        method: &str,
        payload: Option<&serde_json::Value>,
    ) -> PermissionDecision {
        let roles = identity.effective_roles(snapshot.default_role.as_ref());

        // 管理员绕过所有后续检查
        let is_admin = snapshot
            .admin_role
            .as_ref()
            .map_or(false, |admin| roles.contains(admin))
            || self
                .admin_override
                .as_ref()
                .map_or(false, |hook| hook(identity));
        if is_admin {
            return PermissionDecision::admin();
        }

        // 无实体范围的请求默认拒绝，是否开放由调用层决定
        let Some(entity) = entity else {
            tracing::debug!(method = %method, "No entity in scope, denying by default");
            return PermissionDecision::denied();
        };

        let method_key = method.to_uppercase();
        let Some(access_types) = METHOD_ACCESS.get(method_key.as_str()) else {
            // 无映射的方法是致命输入，但不抛错
            tracing::error!(method = %method, "No access mapping for method, denying");
            return PermissionDecision::denied();
        };

        let access = snapshot.entity(entity.kind);
        let mut decision = PermissionDecision::denied();

        // 所有权预检：暂定放行，仍须遍历权限类型以产出副作用标志
        if identity.user_id.is_some() && access.owner == identity.user_id {
            decision.allowed = true;
        }

        let payload_has_owner = payload
            .and_then(|p| p.get("owner"))
            .map_or(false, |v| !v.is_null());

        for access_type in access_types {
            let granted = access.roles_for(*access_type);
            if !roles.iter().any(|role| granted.contains(role)) {
                continue;
            }

            if access_type.is_all() {
                decision.allowed = true;
                decision.skip_owner_filter = true;
                if matches!(method_key.as_str(), "POST" | "PUT") && payload_has_owner {
                    decision.assign_owner = true;
                }
            } else if *access_type == AccessType::CreateOwn {
                // 实体尚不存在，匿名自注册场景也放行
                decision.allowed = true;
            } else if identity.user_id.is_some() && access.owner == identity.user_id {
                decision.allowed = true;
            } else if entity.is_index() {
                // index 请求放行，所有者过滤留给外部行级过滤器
                decision.allowed = true;
            }
        }

        decision
    }

    /// 决策并在拒绝时返回统一的授权失败
    pub fn require(
        &self,
        identity: &CallerIdentity,
        snapshot: &AccessSnapshot,
        entity: Option<&EntityRef>,
        method: &str,
        payload: Option<&serde_json::Value>,
    ) -> Result<PermissionDecision> {
        let decision = self.decide(identity, snapshot, entity, method, payload);

        if !decision.allowed {
            tracing::warn!(
                user_id = ?identity.user_id,
                method = %method,
                entity = ?entity,
                "Permission denied"
            );
            metrics::counter!("authz_decisions_total", "outcome" => "denied").increment(1);
            return Err(AppError::Unauthorized);
        }

        metrics::counter!("authz_decisions_total", "outcome" => "granted").increment(1);
        Ok(decision)
    }
}
