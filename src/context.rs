//! 请求上下文与执行上下文
//! 管线内动作之间以及动作与 CRUD 层之间的显式副作用通道

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::models::access::EntityKind;
use crate::models::auth::CallerIdentity;
use crate::models::form::Form;
use crate::models::submission::Submission;
use crate::models::{FormId, Id, SubmissionId};
use crate::services::permission_service::PermissionDecision;

/// 被决策的目标实体
///
/// `id` 为空字符串表示列表（index）式请求：授权引擎放行，
/// 行级所有者过滤交由外部协作方收窄。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Id,
}

impl EntityRef {
    pub fn form(id: impl Into<Id>) -> Self {
        Self {
            kind: EntityKind::Form,
            id: id.into(),
        }
    }

    pub fn submission(id: impl Into<Id>) -> Self {
        Self {
            kind: EntityKind::Submission,
            id: id.into(),
        }
    }

    /// index 式请求（无具体实体 id）
    pub fn is_index(&self) -> bool {
        self.id.is_empty()
    }
}

/// 一次 CRUD 操作的请求上下文，由外部请求层构造
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// HTTP 风格方法（POST/GET/PUT/DELETE），未知方法一律拒绝
    pub method: String,
    pub form_id: Option<FormId>,
    pub submission_id: Option<SubmissionId>,
    pub entity: Option<EntityRef>,
    pub caller: CallerIdentity,
    /// 请求载荷（提交数据），条件求值与保存动作都从这里读取
    pub data: serde_json::Value,
}

impl RequestContext {
    /// 表单实体请求（GET/PUT/DELETE /form/:id 或 POST /form）
    pub fn form_request(
        method: impl Into<String>,
        form_id: Option<FormId>,
        caller: CallerIdentity,
        data: serde_json::Value,
    ) -> Self {
        let entity = Some(EntityRef::form(form_id.clone().unwrap_or_default()));
        Self {
            request_id: Uuid::new_v4(),
            method: method.into(),
            form_id,
            submission_id: None,
            entity,
            caller,
            data,
        }
    }

    /// 提交实体请求；`submission_id` 为 None 表示列表/新建
    pub fn submission_request(
        method: impl Into<String>,
        form_id: FormId,
        submission_id: Option<SubmissionId>,
        caller: CallerIdentity,
        data: serde_json::Value,
    ) -> Self {
        let entity = Some(EntityRef::submission(
            submission_id.clone().unwrap_or_default(),
        ));
        Self {
            request_id: Uuid::new_v4(),
            method: method.into(),
            form_id: Some(form_id),
            submission_id,
            entity,
            caller,
            data,
        }
    }

    /// 无实体范围的集合级请求（默认拒绝路径）
    pub fn collection_request(method: impl Into<String>, caller: CallerIdentity) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method: method.into(),
            form_id: None,
            submission_id: None,
            entity: None,
            caller,
            data: serde_json::Value::Null,
        }
    }

    /// 当前操作是否携带具体实体 id
    pub fn has_entity_id(&self) -> bool {
        self.entity.as_ref().map_or(false, |e| !e.is_index())
    }
}

/// 执行上下文
///
/// 管线按引用传递的可变结构，是动作间唯一的副作用通道。
/// 动作可读写的字段：
/// - `submission`：待持久化/已加载的提交，保存动作在此物化数据，
///   角色分配动作改写其 `roles`
/// - `response`：动作写给 CRUD 层的响应载荷
///
/// 其余字段只读。取消标志置位后，管线不再启动后续动作，
/// 已派发的动作仍会执行完毕。
pub struct ExecutionContext {
    pub request: RequestContext,
    pub form: Option<Arc<Form>>,
    pub submission: Option<Submission>,
    pub decision: Option<PermissionDecision>,
    pub response: Option<serde_json::Value>,
    cancelled: Arc<AtomicBool>,
}

impl ExecutionContext {
    pub fn new(request: RequestContext) -> Self {
        Self {
            request,
            form: None,
            submission: None,
            decision: None,
            response: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 请求取消句柄，可交给调用方在请求中止时置位
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
