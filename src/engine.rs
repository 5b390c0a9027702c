//! 引擎门面
//! 持有长生命周期协作方，按请求铸造相互隔离的 RequestScope

use std::sync::Arc;

use crate::actions::ActionSet;
use crate::cache::RequestCache;
use crate::config::EngineConfig;
use crate::context::{ExecutionContext, RequestContext};
use crate::error::Result;
use crate::models::access::AccessSnapshot;
use crate::models::action::{ActionMethod, HandlerPhase};
use crate::models::auth::CallerIdentity;
use crate::services::access_resolver::AccessResolver;
use crate::services::action_registry::ActionRegistry;
use crate::services::condition::ConditionEvaluator;
use crate::services::permission_service::{PermissionDecision, PermissionService};
use crate::services::pipeline::{ActionPipeline, PipelineReport};
use crate::store::DocumentStore;

/// 表单系统核心引擎
///
/// 每个进程构建一次；外部请求层对每次 CRUD 操作调用 `request()`
/// 取得独立作用域。典型调用序列：
///
/// `authorize` → `before` → （外部 CRUD 执行）→ `after`
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    units: Arc<ActionSet>,
    config: EngineConfig,
    permissions: PermissionService,
}

impl Engine {
    pub fn new(store: Arc<dyn DocumentStore>, units: ActionSet, config: EngineConfig) -> Self {
        Self {
            store,
            units: Arc::new(units),
            config,
            permissions: PermissionService::new(),
        }
    }

    /// 注入外部管理员强制判定（如服务器内部调用）
    pub fn with_admin_override(
        mut self,
        hook: impl Fn(&CallerIdentity) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.permissions = PermissionService::new().with_admin_override(hook);
        self
    }

    /// 为一次请求铸造作用域
    ///
    /// 缓存随作用域新建，请求隔离由构造保证：任何快照或动作列表
    /// 都不会在两次请求之间存活。
    pub fn request(&self, request: RequestContext) -> RequestScope<'_> {
        let resolver = AccessResolver::new(Arc::clone(&self.store));
        let registry = ActionRegistry::new(Arc::clone(&self.store), Arc::clone(&self.units));
        let condition = ConditionEvaluator::new(&self.config.sandbox);
        RequestScope {
            engine: self,
            cache: RequestCache::new(),
            resolver,
            pipeline: ActionPipeline::new(registry, condition),
            snapshot: None,
            ctx: ExecutionContext::new(request),
        }
    }
}

/// 单次请求的执行作用域
pub struct RequestScope<'e> {
    engine: &'e Engine,
    cache: RequestCache,
    resolver: AccessResolver,
    pipeline: ActionPipeline,
    snapshot: Option<AccessSnapshot>,
    ctx: ExecutionContext,
}

impl RequestScope<'_> {
    /// 构建访问快照并做出授权决策
    ///
    /// 拒绝与“目标不存在”对外同样表现为 `Unauthorized`。
    /// 决策结果写入执行上下文，供后续动作消费。
    pub async fn authorize(&mut self) -> Result<PermissionDecision> {
        let snapshot = self.resolver.resolve(&self.ctx.request, &self.cache).await?;

        // 表单已进缓存，顺手挂到上下文上供动作读取
        if let Some(form_id) = self.ctx.request.form_id.clone() {
            self.ctx.form = self
                .cache
                .form(self.engine.store.as_ref(), &form_id)
                .await?;
        }

        let payload = match &self.ctx.request.data {
            serde_json::Value::Null => None,
            data => Some(data),
        };
        let decision = self.engine.permissions.require(
            &self.ctx.request.caller,
            &snapshot,
            self.ctx.request.entity.as_ref(),
            &self.ctx.request.method,
            payload,
        )?;

        self.ctx.decision = Some(decision);
        self.snapshot = Some(snapshot);
        Ok(decision)
    }

    /// 执行 before 阶段动作
    pub async fn before(&mut self) -> Result<PipelineReport> {
        self.run_phase(HandlerPhase::Before).await
    }

    /// 执行 after 阶段动作
    pub async fn after(&mut self) -> Result<PipelineReport> {
        self.run_phase(HandlerPhase::After).await
    }

    async fn run_phase(&mut self, phase: HandlerPhase) -> Result<PipelineReport> {
        let Some(method) = ActionMethod::from_request(
            &self.ctx.request.method,
            self.ctx.request.has_entity_id(),
        ) else {
            // 未知方法在 authorize 已拒绝；这里兜底为空跑
            tracing::debug!(method = %self.ctx.request.method, "No action method mapping, skipping pipeline");
            return Ok(PipelineReport::default());
        };
        self.pipeline
            .execute(phase, method, &mut self.ctx, &self.cache)
            .await
    }

    /// 本次请求的访问快照（authorize 之后可用）
    pub fn snapshot(&self) -> Option<&AccessSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    /// 交出执行上下文（请求结束时 CRUD 层取走累计的副作用）
    pub fn into_context(self) -> ExecutionContext {
        self.ctx
    }
}
