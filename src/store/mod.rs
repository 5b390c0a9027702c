//! 文档存储抽象层
//! 本核心不实现持久化，仅消费此查询契约

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::action::ActionDescriptor;
use crate::models::form::Form;
use crate::models::role::Role;
use crate::models::submission::Submission;
use crate::models::{FormId, RoleId, SubmissionId};

pub use memory::MemoryStore;

/// 角色查询条件
///
/// 按 id 精确查找，或按 `default` / `admin` 标志查找相应的周知角色。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleQuery {
    pub id: Option<RoleId>,
    pub default: Option<bool>,
    pub admin: Option<bool>,
}

impl RoleQuery {
    pub fn by_id(id: impl Into<RoleId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn default_role() -> Self {
        Self {
            default: Some(true),
            ..Self::default()
        }
    }

    pub fn admin_role() -> Self {
        Self {
            admin: Some(true),
            ..Self::default()
        }
    }
}

/// 文档查询契约
///
/// 所有方法均为异步且可能以 `AppError::Store` 失败；
/// 查无此档返回 `Ok(None)`，不是错误。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 按 id 查找未删除的表单
    async fn find_form(&self, id: &FormId) -> Result<Option<Form>>;

    /// 在指定表单下按 id 查找未删除的提交
    async fn find_submission(
        &self,
        form_id: &FormId,
        id: &SubmissionId,
    ) -> Result<Option<Submission>>;

    /// 按条件查找未删除的角色
    async fn find_role(&self, query: &RoleQuery) -> Result<Option<Role>>;

    /// 列出表单下全部未删除的动作文档，保持存储顺序
    async fn find_actions(&self, form_id: &FormId) -> Result<Vec<ActionDescriptor>>;
}
