//! 动作注册表服务
//! 加载表单的动作配置，按优先级排序并按阶段/操作过滤

use std::sync::Arc;

use crate::actions::{ActionSet, ActionUnit};
use crate::cache::RequestCache;
use crate::error::Result;
use crate::models::action::{ActionDescriptor, ActionMethod, HandlerPhase};
use crate::models::FormId;
use crate::store::DocumentStore;

/// 动作注册表
///
/// 已注册实现集合在启动时构建且不再变化；
/// 动作文档列表按请求缓存，请求结束即弃。
pub struct ActionRegistry {
    store: Arc<dyn DocumentStore>,
    units: Arc<ActionSet>,
}

impl ActionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, units: Arc<ActionSet>) -> Self {
        Self { store, units }
    }

    /// 按名字取已注册的动作实现
    pub fn unit(&self, name: &str) -> Option<Arc<dyn ActionUnit>> {
        self.units.get(name)
    }

    /// 加载表单的动作列表（请求生命周期内缓存）
    ///
    /// 按 `priority` 降序稳定排序，同序保持存储顺序。
    /// 没有对应实现的动作名在加载时静默跳过：孤儿配置是被容忍的，
    /// 不构成错误。
    pub async fn load(
        &self,
        cache: &RequestCache,
        form_id: &FormId,
    ) -> Result<Arc<Vec<ActionDescriptor>>> {
        if let Some(cached) = cache.cached_actions(form_id) {
            return Ok(cached);
        }

        let mut actions = self.store.find_actions(form_id).await?;
        actions.retain(|action| {
            let known = self.units.contains(&action.name);
            if !known {
                tracing::debug!(
                    action = %action.name,
                    form_id = %form_id,
                    "Skipping action with no registered implementation"
                );
            }
            known
        });
        // 稳定排序：等优先级的并列顺序即存储顺序
        actions.sort_by_key(|action| std::cmp::Reverse(action.priority));

        let actions = Arc::new(actions);
        cache.put_actions(form_id, Arc::clone(&actions));
        Ok(actions)
    }

    /// 过滤出绑定到给定阶段与操作的动作，None 表示通配
    ///
    /// 返回副本视图，不改动缓存中的列表。
    pub fn filter(
        &self,
        actions: &[ActionDescriptor],
        phase: Option<HandlerPhase>,
        method: Option<ActionMethod>,
    ) -> Vec<ActionDescriptor> {
        actions
            .iter()
            .filter(|action| phase.map_or(true, |p| action.handler.contains(&p)))
            .filter(|action| method.map_or(true, |m| action.method.contains(&m)))
            .cloned()
            .collect()
    }
}
