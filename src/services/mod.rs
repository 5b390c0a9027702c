//! 核心服务层
//! 授权决策引擎与动作执行管线的各组成部分

pub mod access_resolver;
pub mod action_registry;
pub mod condition;
pub mod permission_service;
pub mod pipeline;
pub mod role_directory;

pub use access_resolver::AccessResolver;
pub use action_registry::ActionRegistry;
pub use condition::ConditionEvaluator;
pub use permission_service::{PermissionDecision, PermissionService};
pub use pipeline::{ActionPipeline, PipelineReport};
pub use role_directory::RoleDirectory;
