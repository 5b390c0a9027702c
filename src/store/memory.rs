//! 内存文档存储
//! 供测试与嵌入式调用方使用的进程内 DocumentStore 实现

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::action::ActionDescriptor;
use crate::models::form::Form;
use crate::models::role::Role;
use crate::models::submission::Submission;
use crate::models::{FormId, SubmissionId};

use super::{DocumentStore, RoleQuery};

#[derive(Default)]
struct Inner {
    forms: HashMap<FormId, Form>,
    submissions: HashMap<(FormId, SubmissionId), Submission>,
    roles: Vec<Role>,
    /// 保持插入顺序，同优先级动作的并列顺序由此决定
    actions: Vec<ActionDescriptor>,
}

/// 进程内文档存储
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_form(&self, form: Form) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.forms.insert(form.id.clone(), form);
    }

    pub fn insert_submission(&self, submission: Submission) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner
            .submissions
            .insert((submission.form.clone(), submission.id.clone()), submission);
    }

    pub fn insert_role(&self, role: Role) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.roles.push(role);
    }

    pub fn insert_action(&self, action: ActionDescriptor) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.actions.push(action);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_form(&self, id: &FormId) -> Result<Option<Form>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .forms
            .get(id)
            .filter(|f| f.deleted.is_none())
            .cloned())
    }

    async fn find_submission(
        &self,
        form_id: &FormId,
        id: &SubmissionId,
    ) -> Result<Option<Submission>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .submissions
            .get(&(form_id.clone(), id.clone()))
            .filter(|s| s.deleted.is_none())
            .cloned())
    }

    async fn find_role(&self, query: &RoleQuery) -> Result<Option<Role>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .roles
            .iter()
            .filter(|r| r.deleted.is_none())
            .find(|r| {
                query.id.as_ref().map_or(true, |id| &r.id == id)
                    && query.default.map_or(true, |d| r.default == d)
                    && query.admin.map_or(true, |a| r.admin == a)
            })
            .cloned())
    }

    async fn find_actions(&self, form_id: &FormId) -> Result<Vec<ActionDescriptor>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .actions
            .iter()
            .filter(|a| &a.form == form_id && a.deleted.is_none())
            .cloned()
            .collect())
    }
}
