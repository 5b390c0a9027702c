//! 访问规则解析服务
//! 为一次请求加载并展开全部相关访问规则，产出只读快照

use std::sync::Arc;

use crate::cache::RequestCache;
use crate::context::RequestContext;
use crate::error::{AppError, Result};
use crate::models::access::{AccessSnapshot, EntityAccess};
use crate::services::role_directory::RoleDirectory;
use crate::store::DocumentStore;

/// 访问规则解析器
///
/// 无副作用，给定相同输入与稳定存储时幂等，可安全重复调用。
pub struct AccessResolver {
    store: Arc<dyn DocumentStore>,
    roles: RoleDirectory,
}

impl AccessResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let roles = RoleDirectory::new(Arc::clone(&store));
        Self { store, roles }
    }

    /// 构建请求的访问快照
    ///
    /// 表单只加载一次（经请求级缓存），其 `access` / `submissionAccess`
    /// 分别展开为表单实体和提交实体的角色授权表；提交文档只贡献
    /// 所有者，其自身的资源粒度 access 由外部过滤器消费，不进快照。
    ///
    /// 目标表单或提交不存在时返回 `Unauthorized`：对外不区分
    /// “无此实体”与“无权限”，避免存在性泄露。
    pub async fn resolve(&self, ctx: &RequestContext, cache: &RequestCache) -> Result<AccessSnapshot> {
        let mut snapshot = AccessSnapshot::default();

        // 角色查询出错是 StoreError；查无 default/admin 角色是合法的
        snapshot.default_role = self.roles.default_role().await?.map(|r| r.id);
        snapshot.admin_role = self.roles.admin_role().await?.map(|r| r.id);

        // 无表单范围的操作：中性快照，下游仍按默认角色决策
        let Some(form_id) = &ctx.form_id else {
            return Ok(snapshot);
        };

        let form = cache
            .form(self.store.as_ref(), form_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(form_id = %form_id, "Form not found while resolving access");
                AppError::Unauthorized
            })?;

        snapshot.form = EntityAccess::from_entries(form.owner.clone(), &form.access);

        let submission_owner = match &ctx.submission_id {
            Some(submission_id) => {
                let submission = cache
                    .submission(self.store.as_ref(), form_id, submission_id)
                    .await?
                    .ok_or_else(|| {
                        tracing::debug!(
                            form_id = %form_id,
                            submission_id = %submission_id,
                            "Submission not found while resolving access"
                        );
                        AppError::Unauthorized
                    })?;
                submission.owner.clone()
            }
            None => None,
        };

        snapshot.submission =
            EntityAccess::from_entries(submission_owner, &form.submission_access);

        Ok(snapshot)
    }
}
