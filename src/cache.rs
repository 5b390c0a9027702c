//! 请求级缓存
//! 同一请求内对表单/提交/动作文档的查找做记忆化，避免重复存储往返

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::models::action::ActionDescriptor;
use crate::models::form::Form;
use crate::models::submission::Submission;
use crate::models::{FormId, SubmissionId};
use crate::store::DocumentStore;

/// 请求级缓存
///
/// 生命周期严格等于一个请求：随 RequestScope 创建，随之丢弃，
/// 绝不跨请求共享（请求隔离不变量）。查不到的结果同样被记忆，
/// 同一请求内不会为同一 id 重复打存储。
#[derive(Default)]
pub struct RequestCache {
    forms: Mutex<HashMap<FormId, Option<Arc<Form>>>>,
    submissions: Mutex<HashMap<(FormId, SubmissionId), Option<Arc<Submission>>>>,
    actions: Mutex<HashMap<FormId, Arc<Vec<ActionDescriptor>>>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找表单，命中缓存则不再访问存储
    pub async fn form(
        &self,
        store: &dyn DocumentStore,
        id: &FormId,
    ) -> Result<Option<Arc<Form>>> {
        if let Some(cached) = self.lock_forms().get(id) {
            return Ok(cached.clone());
        }

        // 锁不跨 await 持有；极端情况下同一请求并发未命中会重复加载一次，无害
        let loaded = store.find_form(id).await?.map(Arc::new);
        self.lock_forms().insert(id.clone(), loaded.clone());
        Ok(loaded)
    }

    /// 查找提交，命中缓存则不再访问存储
    pub async fn submission(
        &self,
        store: &dyn DocumentStore,
        form_id: &FormId,
        id: &SubmissionId,
    ) -> Result<Option<Arc<Submission>>> {
        let key = (form_id.clone(), id.clone());
        if let Some(cached) = self.lock_submissions().get(&key) {
            return Ok(cached.clone());
        }

        let loaded = store.find_submission(form_id, id).await?.map(Arc::new);
        self.lock_submissions().insert(key, loaded.clone());
        Ok(loaded)
    }

    /// 取出已缓存的动作列表
    pub fn cached_actions(&self, form_id: &FormId) -> Option<Arc<Vec<ActionDescriptor>>> {
        self.lock_actions().get(form_id).cloned()
    }

    /// 写入处理完毕的动作列表（注册表负责排序与过滤）
    pub fn put_actions(&self, form_id: &FormId, actions: Arc<Vec<ActionDescriptor>>) {
        self.lock_actions().insert(form_id.clone(), actions);
    }

    fn lock_forms(&self) -> std::sync::MutexGuard<'_, HashMap<FormId, Option<Arc<Form>>>> {
        self.forms.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_submissions(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(FormId, SubmissionId), Option<Arc<Submission>>>> {
        self.submissions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_actions(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<FormId, Arc<Vec<ActionDescriptor>>>> {
        self.actions.lock().unwrap_or_else(|e| e.into_inner())
    }
}
