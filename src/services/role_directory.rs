//! 角色目录服务
//! 解析周知的 default / admin 角色，并按条件查找角色

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::role::Role;
use crate::store::{DocumentStore, RoleQuery};

/// 角色目录
///
/// 背靠外部角色存储。查无角色是合法结果（返回 None，
/// 决策引擎视之为永不匹配）；查询本身失败才是错误。
pub struct RoleDirectory {
    store: Arc<dyn DocumentStore>,
}

impl RoleDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// 周知的默认角色
    pub async fn default_role(&self) -> Result<Option<Role>> {
        self.find(&RoleQuery::default_role()).await
    }

    /// 周知的管理员角色
    pub async fn admin_role(&self) -> Result<Option<Role>> {
        self.find(&RoleQuery::admin_role()).await
    }

    /// 按条件查找角色
    pub async fn find(&self, query: &RoleQuery) -> Result<Option<Role>> {
        self.store.find_role(query).await.map_err(|e| {
            tracing::error!(error = %e, ?query, "Role lookup failed");
            AppError::store(format!("role resolution failed: {}", e))
        })
    }
}
