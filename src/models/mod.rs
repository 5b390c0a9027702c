//! 数据模型模块
//! 表单、提交、角色、动作等核心实体，以及请求期派生的访问快照

pub mod access;
pub mod action;
pub mod auth;
pub mod form;
pub mod role;
pub mod submission;

/// 实体标识符的规范字符串形式
pub type Id = String;

pub type FormId = Id;
pub type SubmissionId = Id;
pub type RoleId = Id;
pub type UserId = Id;
