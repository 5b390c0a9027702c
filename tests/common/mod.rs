//! 测试公共模块
//! 提供实体构造辅助与可注入的测试桩

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use form_system::actions::{ActionSet, ActionUnit, WebhookTransport};
use form_system::config::EngineConfig;
use form_system::context::ExecutionContext;
use form_system::error::{AppError, Result};
use form_system::models::access::{EntityAccess, PermissionEntry};
use form_system::models::action::{
    ActionDescriptor, ActionMethod, Condition, HandlerPhase,
};
use form_system::models::form::Form;
use form_system::models::role::Role;
use form_system::models::submission::Submission;
use form_system::models::{FormId, RoleId, SubmissionId, UserId};
use form_system::store::{DocumentStore, MemoryStore, RoleQuery};

/// 创建测试配置（pretty 日志、短沙箱超时）
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.logging.level = "debug".to_string();
    config.logging.format = "pretty".to_string();
    config
}

pub fn role(id: &str, default: bool, admin: bool) -> Role {
    let now = Utc::now();
    Role {
        id: id.to_string(),
        title: id.to_string(),
        description: None,
        default,
        admin,
        deleted: None,
        created_at: now,
        updated_at: now,
    }
}

/// 权限条目：类型 + 角色 id 列表
pub fn entry(access_type: &str, roles: &[&str]) -> PermissionEntry {
    serde_json::from_value(json!({"type": access_type, "roles": roles})).unwrap()
}

pub fn form(
    id: &str,
    owner: Option<&str>,
    access: Vec<PermissionEntry>,
    submission_access: Vec<PermissionEntry>,
) -> Form {
    let now = Utc::now();
    Form {
        id: id.to_string(),
        title: id.to_string(),
        name: id.to_string(),
        path: format!("/{}", id),
        owner: owner.map(|o| o.to_string()),
        access,
        submission_access,
        components: json!([]),
        deleted: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn submission(id: &str, form: &str, owner: Option<&str>) -> Submission {
    let now = Utc::now();
    Submission {
        id: id.to_string(),
        form: form.to_string(),
        owner: owner.map(|o| o.to_string()),
        data: json!({}),
        access: Vec::new(),
        roles: Vec::new(),
        deleted: None,
        created_at: now,
        updated_at: now,
    }
}

/// 动作描述文档
pub fn descriptor(
    name: &str,
    title: &str,
    form: &str,
    priority: i32,
    handler: Vec<HandlerPhase>,
    method: Vec<ActionMethod>,
) -> ActionDescriptor {
    let now = Utc::now();
    ActionDescriptor {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        title: title.to_string(),
        form: form.to_string(),
        priority,
        handler,
        method,
        settings: serde_json::Value::Null,
        condition: None,
        deleted: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn with_condition(mut action: ActionDescriptor, condition: Condition) -> ActionDescriptor {
    action.condition = Some(condition);
    action
}

pub fn with_settings(
    mut action: ActionDescriptor,
    settings: serde_json::Value,
) -> ActionDescriptor {
    action.settings = settings;
    action
}

/// 直接构造访问快照用的实体访问规则
pub fn entity_access(owner: Option<&str>, grants: &[(&str, &[&str])]) -> EntityAccess {
    let entries: Vec<PermissionEntry> = grants
        .iter()
        .map(|(access_type, roles)| entry(access_type, roles))
        .collect();
    EntityAccess::from_entries(owner.map(|o| o.to_string()), &entries)
}

/// 按执行顺序记录动作标题的测试动作，注册名 "test"
pub struct RecordingAction {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl RecordingAction {
    pub fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl ActionUnit for RecordingAction {
    fn name(&self) -> &'static str {
        "test"
    }

    async fn resolve(
        &self,
        action: &ActionDescriptor,
        _phase: HandlerPhase,
        _method: ActionMethod,
        _ctx: &mut ExecutionContext,
    ) -> Result<()> {
        self.log.lock().unwrap().push(action.title.clone());
        Ok(())
    }
}

/// 必定失败的测试动作，注册名 "fail"
pub struct FailingAction;

#[async_trait]
impl ActionUnit for FailingAction {
    fn name(&self) -> &'static str {
        "fail"
    }

    async fn resolve(
        &self,
        _action: &ActionDescriptor,
        _phase: HandlerPhase,
        _method: ActionMethod,
        _ctx: &mut ExecutionContext,
    ) -> Result<()> {
        Err(AppError::action("fail", anyhow::anyhow!("boom")))
    }
}

/// 执行时取消请求的测试动作，注册名 "cancel"
pub struct CancellingAction {
    pub log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ActionUnit for CancellingAction {
    fn name(&self) -> &'static str {
        "cancel"
    }

    async fn resolve(
        &self,
        action: &ActionDescriptor,
        _phase: HandlerPhase,
        _method: ActionMethod,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        self.log.lock().unwrap().push(action.title.clone());
        ctx.cancel();
        Ok(())
    }
}

/// 记录投递并可配置失败的 Webhook 传输桩
#[derive(Default)]
pub struct RecordingTransport {
    pub delivered: Mutex<Vec<(String, serde_json::Value)>>,
    pub fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn deliver(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("delivery refused");
        }
        self.delivered
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        Ok(())
    }
}

/// 统计表单查找次数的存储包装，用于验证请求级缓存
pub struct CountingStore {
    inner: MemoryStore,
    pub form_lookups: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            form_lookups: AtomicUsize::new(0),
        }
    }

    pub fn form_lookup_count(&self) -> usize {
        self.form_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn find_form(&self, id: &FormId) -> Result<Option<Form>> {
        self.form_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_form(id).await
    }

    async fn find_submission(
        &self,
        form_id: &FormId,
        id: &SubmissionId,
    ) -> Result<Option<Submission>> {
        self.inner.find_submission(form_id, id).await
    }

    async fn find_role(&self, query: &RoleQuery) -> Result<Option<Role>> {
        self.inner.find_role(query).await
    }

    async fn find_actions(&self, form_id: &FormId) -> Result<Vec<ActionDescriptor>> {
        self.inner.find_actions(form_id).await
    }
}

/// 角色查询必定失败的存储，用于覆盖角色解析错误路径
pub struct BrokenRoleStore {
    inner: MemoryStore,
}

impl BrokenRoleStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DocumentStore for BrokenRoleStore {
    async fn find_form(&self, id: &FormId) -> Result<Option<Form>> {
        self.inner.find_form(id).await
    }

    async fn find_submission(
        &self,
        form_id: &FormId,
        id: &SubmissionId,
    ) -> Result<Option<Submission>> {
        self.inner.find_submission(form_id, id).await
    }

    async fn find_role(&self, _query: &RoleQuery) -> Result<Option<Role>> {
        Err(AppError::store("role backend unavailable"))
    }

    async fn find_actions(&self, form_id: &FormId) -> Result<Vec<ActionDescriptor>> {
        self.inner.find_actions(form_id).await
    }
}

/// 常用角色 id
pub const DEFAULT_ROLE: &str = "role-default";
pub const ADMIN_ROLE: &str = "role-admin";
pub const AUTH_ROLE: &str = "role-authenticated";

/// 预置 default/admin/authenticated 三个角色的内存存储
pub fn store_with_roles() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_role(role(DEFAULT_ROLE, true, false));
    store.insert_role(role(ADMIN_ROLE, false, true));
    store.insert_role(role(AUTH_ROLE, false, false));
    store
}

/// 带记录动作与失败动作的注册集合
pub fn test_unit_set(log: Arc<Mutex<Vec<String>>>) -> ActionSet {
    ActionSet::new()
        .register(Arc::new(RecordingAction::new(log.clone())))
        .register(Arc::new(FailingAction))
        .register(Arc::new(CancellingAction { log }))
}

/// 区分 RoleId 便于阅读
pub fn role_id(id: &str) -> RoleId {
    id.to_string()
}

pub fn user_id(id: &str) -> UserId {
    id.to_string()
}
