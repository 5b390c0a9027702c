//! 动作执行管线
//! 按优先级顺序串行执行一次请求命中的全部动作

use std::time::Instant;

use crate::cache::RequestCache;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::models::action::{ActionMethod, HandlerPhase};
use crate::services::action_registry::ActionRegistry;
use crate::services::condition::ConditionEvaluator;

/// 单次管线运行的结果报告
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
}

/// 动作执行管线
///
/// 严格串行：上一个动作完整结束（含其异步副作用）后才求值下一个，
/// 顺序保证是承重的——高优先级的保存动作必须先于角色分配动作落定。
/// 任何动作报错立即中止整条管线并原样上抛该错误，不做补偿回滚。
pub struct ActionPipeline {
    registry: ActionRegistry,
    condition: ConditionEvaluator,
}

impl ActionPipeline {
    pub fn new(registry: ActionRegistry, condition: ConditionEvaluator) -> Self {
        Self {
            registry,
            condition,
        }
    }

    /// 执行给定阶段与操作命中的动作序列
    pub async fn execute(
        &self,
        phase: HandlerPhase,
        method: ActionMethod,
        ctx: &mut ExecutionContext,
        cache: &RequestCache,
    ) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        // 无表单范围的请求没有可执行的动作
        let Some(form_id) = ctx.request.form_id.clone() else {
            return Ok(report);
        };

        let actions = self.registry.load(cache, &form_id).await?;
        let filtered = self.registry.filter(&actions, Some(phase), Some(method));

        tracing::debug!(
            request_id = %ctx.request.request_id,
            phase = phase.as_str(),
            method = method.as_str(),
            count = filtered.len(),
            "Executing action pipeline"
        );

        for descriptor in &filtered {
            // 协作式取消：不再启动后续动作，已派发的动作不被抢占
            if ctx.is_cancelled() {
                tracing::info!(
                    request_id = %ctx.request.request_id,
                    action = %descriptor.name,
                    "Request cancelled, stopping pipeline"
                );
                break;
            }

            if !self.condition.should_execute(descriptor, &ctx.request.data).await {
                tracing::debug!(
                    request_id = %ctx.request.request_id,
                    action = %descriptor.name,
                    "Condition not met, action skipped"
                );
                metrics::counter!("actions_skipped_total", "action" => descriptor.name.clone())
                    .increment(1);
                report.skipped.push(descriptor.name.clone());
                continue;
            }

            // 注册表加载时已剔除未知名字；此处查不到只可能是竞态配置，跳过
            let Some(unit) = self.registry.unit(&descriptor.name) else {
                tracing::debug!(action = %descriptor.name, "No unit for action, skipped");
                continue;
            };

            let started = Instant::now();
            let result = unit.resolve(descriptor, phase, method, ctx).await;
            metrics::histogram!("action_execution_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            if let Err(e) = result {
                tracing::warn!(
                    request_id = %ctx.request.request_id,
                    action = %descriptor.name,
                    error = %e,
                    "Action failed, aborting pipeline"
                );
                metrics::counter!("actions_failed_total", "action" => descriptor.name.clone())
                    .increment(1);
                return Err(e);
            }

            metrics::counter!("actions_executed_total", "action" => descriptor.name.clone())
                .increment(1);
            report.executed.push(descriptor.name.clone());
        }

        Ok(report)
    }
}
