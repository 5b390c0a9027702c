//! Action domain models
//! 动作描述文档、生命周期阶段、操作与执行条件

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FormId, Id};

/// 生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerPhase {
    /// CRUD 执行之前
    Before,
    /// CRUD 执行之后
    After,
}

impl HandlerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerPhase::Before => "before",
            HandlerPhase::After => "after",
        }
    }
}

/// 动作绑定的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionMethod {
    Create,
    Read,
    Update,
    Delete,
    Index,
}

impl ActionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionMethod::Create => "create",
            ActionMethod::Read => "read",
            ActionMethod::Update => "update",
            ActionMethod::Delete => "delete",
            ActionMethod::Index => "index",
        }
    }

    /// 由 HTTP 方法与是否携带具体实体 id 推导操作。
    /// 无具体 id 的 GET 是列表（index）请求
    pub fn from_request(method: &str, has_entity_id: bool) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "POST" => Some(ActionMethod::Create),
            "GET" => Some(if has_entity_id {
                ActionMethod::Read
            } else {
                ActionMethod::Index
            }),
            "PUT" => Some(ActionMethod::Update),
            "DELETE" => Some(ActionMethod::Delete),
            _ => None,
        }
    }
}

/// 条件比较算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOp {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "notEqual")]
    NotEqual,
}

/// 动作执行条件
///
/// `custom` 为沙箱脚本源码，存在时优先于声明式的 field/eq/value 比较。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub eq: Option<ConditionOp>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub custom: Option<String>,
}

/// 动作描述文档
///
/// 请求期加载后不再变更；按 `priority` 降序执行，同序保持存储顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub id: Id,
    /// 已注册动作实现的稳定名字（如 "save"、"role"、"webhook"）
    pub name: String,
    pub title: String,
    pub form: FormId,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub handler: Vec<HandlerPhase>,
    #[serde(default)]
    pub method: Vec<ActionMethod>,
    /// 各动作实现自行解释的不透明设置
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub deleted: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActionDescriptor {
    /// 是否绑定到给定阶段与操作
    pub fn matches(&self, phase: HandlerPhase, method: ActionMethod) -> bool {
        self.handler.contains(&phase) && self.method.contains(&method)
    }
}
