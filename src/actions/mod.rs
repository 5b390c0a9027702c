//! 动作实现模块
//! ActionUnit 契约与内建的保存/角色分配/Webhook 动作

pub mod role_assignment;
pub mod save_submission;
pub mod webhook;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::models::action::{ActionDescriptor, ActionMethod, HandlerPhase};
use crate::store::DocumentStore;

pub use role_assignment::RoleAssignmentAction;
pub use save_submission::SaveSubmissionAction;
pub use webhook::{WebhookAction, WebhookTransport};

/// 动作实现契约
///
/// 每个实现以稳定名字注册，`resolve` 通过执行上下文与后续动作
/// 及 CRUD 层通信：对上下文的改写必须就地进行，后续动作才能
/// 观察到先前动作的效果。
#[async_trait]
pub trait ActionUnit: Send + Sync {
    /// 注册名，与动作文档的 `name` 字段对应
    fn name(&self) -> &'static str;

    /// 执行动作，`action` 是触发本次调用的动作文档（含 settings）。
    /// 返回错误即中止当前请求剩余的管线
    async fn resolve(
        &self,
        action: &ActionDescriptor,
        phase: HandlerPhase,
        method: ActionMethod,
        ctx: &mut ExecutionContext,
    ) -> Result<()>;
}

/// 已注册动作实现的集合
///
/// 启动时构建一次，之后只读，以稳定名字做封闭分发。
#[derive(Default)]
pub struct ActionSet {
    units: HashMap<&'static str, Arc<dyn ActionUnit>>,
}

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个实现；同名后注册者覆盖先注册者
    pub fn register(mut self, unit: Arc<dyn ActionUnit>) -> Self {
        self.units.insert(unit.name(), unit);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionUnit>> {
        self.units.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.units.keys().copied().collect()
    }
}

/// 内建动作集合
pub fn default_set(
    store: Arc<dyn DocumentStore>,
    webhook_transport: Arc<dyn WebhookTransport>,
) -> ActionSet {
    ActionSet::new()
        .register(Arc::new(SaveSubmissionAction::new()))
        .register(Arc::new(RoleAssignmentAction::new(store)))
        .register(Arc::new(WebhookAction::new(webhook_transport)))
}
