//! 权限决策引擎单元测试
//! 覆盖管理员绕过、own/all 语义、匿名自注册与决策幂等性

use serde_json::json;

use form_system::context::EntityRef;
use form_system::models::access::AccessSnapshot;
use form_system::models::auth::CallerIdentity;
use form_system::services::permission_service::PermissionService;

mod common;
use common::{entity_access, ADMIN_ROLE, DEFAULT_ROLE};

fn snapshot() -> AccessSnapshot {
    AccessSnapshot {
        default_role: Some(DEFAULT_ROLE.to_string()),
        admin_role: Some(ADMIN_ROLE.to_string()),
        ..AccessSnapshot::default()
    }
}

/// 管理员无条件放行，与实体和方法无关
#[test]
fn test_admin_bypasses_everything() {
    let service = PermissionService::new();
    let identity = CallerIdentity::new("u1", [ADMIN_ROLE.to_string()]);
    let snapshot = snapshot();

    for method in ["POST", "GET", "PUT", "DELETE"] {
        let decision = service.decide(
            &identity,
            &snapshot,
            Some(&EntityRef::submission("s1")),
            method,
            None,
        );
        assert!(decision.allowed, "admin must be allowed for {}", method);
        assert!(decision.is_admin);
        assert!(decision.skip_owner_filter);
    }

    // 无实体也一样放行
    let decision = service.decide(&identity, &snapshot, None, "DELETE", None);
    assert!(decision.allowed);
}

/// 外部注入的管理员判定与角色等效
#[test]
fn test_admin_override_hook() {
    let service =
        PermissionService::new().with_admin_override(|caller| caller.user_id.is_none());
    let decision = service.decide(
        &CallerIdentity::anonymous(),
        &snapshot(),
        None,
        "GET",
        None,
    );
    assert!(decision.allowed);
    assert!(decision.is_admin);
}

/// `_all` 授权胜过所有权要求
#[test]
fn test_all_grant_beats_ownership() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.form = entity_access(Some("u1"), &[("update_all", &["role-x"])]);

    // 非所有者但持有 update_all
    let identity = CallerIdentity::new("u2", ["role-x".to_string()]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::form("f1")),
        "PUT",
        None,
    );
    assert!(decision.allowed);
    assert!(decision.skip_owner_filter);
}

/// 仅有 `_own` 授权且非所有者则拒绝
#[test]
fn test_own_grant_requires_ownership() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.submission = entity_access(Some("u1"), &[("read_own", &["role-x"])]);

    let identity = CallerIdentity::new("u2", ["role-x".to_string()]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::submission("s1")),
        "GET",
        None,
    );
    assert!(!decision.allowed);

    // 所有者本人则放行
    let owner = CallerIdentity::new("u1", ["role-x".to_string()]);
    let decision = service.decide(
        &owner,
        &snap,
        Some(&EntityRef::submission("s1")),
        "GET",
        None,
    );
    assert!(decision.allowed);
    assert!(!decision.skip_owner_filter);
}

/// create_own 与所有权无关，匿名自注册也放行
#[test]
fn test_create_own_is_ownerless() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.form = entity_access(None, &[("create_own", &["role-x"])]);

    let identity = CallerIdentity::anonymous_with_roles(["role-x".to_string()]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::form("")),
        "POST",
        None,
    );
    assert!(decision.allowed);
    assert!(!decision.is_admin);
    assert!(!decision.assign_owner);
}

/// index 式请求放行但保留外部行级过滤
#[test]
fn test_index_read_own_defers_filtering() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.submission = entity_access(Some("u1"), &[("read_own", &["role-x"])]);

    let identity = CallerIdentity::new("u2", ["role-x".to_string()]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::submission("")),
        "GET",
        None,
    );
    assert!(decision.allowed);
    assert!(!decision.skip_owner_filter, "owner filter must stay on for index");
}

/// 仅 `_all` 授权可沿用载荷自带的所有者
#[test]
fn test_assign_owner_only_for_all_grants() {
    let service = PermissionService::new();
    let payload = json!({"owner": "u9", "data": {}});

    let mut snap = snapshot();
    snap.submission = entity_access(None, &[("create_all", &["role-x"])]);
    let identity = CallerIdentity::new("u2", ["role-x".to_string()]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::submission("")),
        "POST",
        Some(&payload),
    );
    assert!(decision.allowed);
    assert!(decision.assign_owner);

    // create_own 不放开所有者指派
    let mut snap = snapshot();
    snap.submission = entity_access(None, &[("create_own", &["role-x"])]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::submission("")),
        "POST",
        Some(&payload),
    );
    assert!(decision.allowed);
    assert!(!decision.assign_owner);

    // GET 不涉及所有者指派
    let mut snap = snapshot();
    snap.submission = entity_access(None, &[("read_all", &["role-x"])]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::submission("s1")),
        "GET",
        Some(&payload),
    );
    assert!(decision.allowed);
    assert!(!decision.assign_owner);
}

/// 匿名调用者回落到默认角色
#[test]
fn test_anonymous_falls_back_to_default_role() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.form = entity_access(None, &[("read_all", &[DEFAULT_ROLE])]);

    let decision = service.decide(
        &CallerIdentity::anonymous(),
        &snap,
        Some(&EntityRef::form("f1")),
        "GET",
        None,
    );
    assert!(decision.allowed);
}

/// 所有权预检：没有任何角色授权时所有者本人仍可访问
#[test]
fn test_ownership_precheck_grants_without_role_match() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.form = entity_access(Some("u1"), &[]);

    let identity = CallerIdentity::new("u1", ["role-unrelated".to_string()]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::form("f1")),
        "PUT",
        None,
    );
    assert!(decision.allowed);
    assert!(!decision.skip_owner_filter);
}

/// 未映射的方法一律拒绝（不抛错）
#[test]
fn test_unknown_method_denied() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.form = entity_access(None, &[("update_all", &["role-x"])]);

    let identity = CallerIdentity::new("u1", ["role-x".to_string()]);
    let decision = service.decide(
        &identity,
        &snap,
        Some(&EntityRef::form("f1")),
        "PATCH",
        None,
    );
    assert!(!decision.allowed);
}

/// 无实体范围默认拒绝
#[test]
fn test_no_entity_denied() {
    let service = PermissionService::new();
    let identity = CallerIdentity::new("u1", ["role-x".to_string()]);
    let decision = service.decide(&identity, &snapshot(), None, "GET", None);
    assert!(!decision.allowed);
}

/// 相同输入必得相同输出
#[test]
fn test_decide_is_idempotent() {
    let service = PermissionService::new();
    let mut snap = snapshot();
    snap.submission = entity_access(Some("u1"), &[("read_own", &["role-x"]), ("update_all", &["role-y"])]);

    let identity = CallerIdentity::new("u1", ["role-x".to_string(), "role-y".to_string()]);
    let entity = EntityRef::submission("s1");

    let first = service.decide(&identity, &snap, Some(&entity), "PUT", None);
    let second = service.decide(&identity, &snap, Some(&entity), "PUT", None);
    assert_eq!(first, second);
    assert!(first.allowed);
}

/// require 在拒绝时给出统一的授权失败
#[test]
fn test_require_maps_denial_to_unauthorized() {
    let service = PermissionService::new();
    let result = service.require(
        &CallerIdentity::anonymous(),
        &snapshot(),
        Some(&EntityRef::form("f1")),
        "DELETE",
        None,
    );
    let err = result.unwrap_err();
    assert_eq!(err.code(), 401);
}
