//! 条件求值服务
//! 决定单次动作调用是否执行；内部任何故障都折算为“不执行”

use std::time::Duration;

use mlua::{HookTriggers, Lua, LuaSerdeExt, Table};

use crate::config::SandboxConfig;
use crate::models::action::{ActionDescriptor, Condition, ConditionOp};

/// 条件求值器
///
/// 永不报错：脚本异常、语法错误、超时统统折算为 false（动作失败关闭），
/// 与决策引擎里所有权判断的语义相独立。
pub struct ConditionEvaluator {
    timeout: Duration,
    instruction_budget: u32,
}

impl ConditionEvaluator {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            instruction_budget: config.instruction_budget,
        }
    }

    /// 判定动作是否应当执行
    ///
    /// `custom` 脚本存在时优先；否则走声明式 field/eq/value 比较；
    /// 完全无条件则默认执行。
    pub async fn should_execute(
        &self,
        action: &ActionDescriptor,
        data: &serde_json::Value,
    ) -> bool {
        let Some(condition) = &action.condition else {
            return true;
        };

        if let Some(script) = condition.custom.as_deref() {
            if !script.trim().is_empty() {
                return self.eval_script(&action.name, script, data).await;
            }
        }

        Self::eval_field(condition, data)
    }

    /// 在受限沙箱中求值自定义脚本
    ///
    /// 脚本只见两个绑定：`data`（请求提交数据的副本）与可变输出
    /// 标志 `execute`；返回布尔值与置位 `execute` 等效。指令数上限
    /// 在 VM 内兜底，墙钟超时在外层兜底，任一触发都视为 false。
    async fn eval_script(&self, action_name: &str, script: &str, data: &serde_json::Value) -> bool {
        let script = script.to_string();
        let data = data.clone();
        let budget = self.instruction_budget;

        let task = tokio::task::spawn_blocking(move || run_sandboxed(&script, &data, budget));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(execute))) => execute,
            Ok(Ok(Err(e))) => {
                tracing::debug!(action = %action_name, error = %e, "Condition script failed, skipping action");
                false
            }
            Ok(Err(e)) => {
                tracing::debug!(action = %action_name, error = %e, "Condition task panicked, skipping action");
                false
            }
            Err(_) => {
                tracing::debug!(action = %action_name, "Condition script timed out, skipping action");
                metrics::counter!("condition_sandbox_timeouts_total").increment(1);
                false
            }
        }
    }

    /// 声明式比较。field/eq/value 任一缺失即视为空条件，默认执行
    fn eval_field(condition: &Condition, data: &serde_json::Value) -> bool {
        let (Some(field), Some(op), Some(expected)) =
            (&condition.field, &condition.eq, &condition.value)
        else {
            return true;
        };

        let equal = lookup_path(data, field)
            .map_or(false, |actual| comparable(actual) == comparable(expected));

        match op {
            ConditionOp::Equals => equal,
            ConditionOp::NotEqual => !equal,
        }
    }
}

/// 在白名单环境里同步执行脚本，返回 execute 标志
fn run_sandboxed(script: &str, data: &serde_json::Value, budget: u32) -> mlua::Result<bool> {
    let lua = Lua::new();
    let env = build_sandbox_env(&lua)?;

    env.set("data", lua.to_value(data)?)?;
    env.set("execute", mlua::Value::Nil)?;

    let chunk = lua
        .load(script)
        .set_name("=condition")
        .set_environment(env.clone());

    // 指令数钩子防死循环
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(budget),
        move |_lua, _debug| {
            Err(mlua::Error::RuntimeError(format!(
                "instruction limit exceeded ({budget})"
            )))
        },
    );

    let result: mlua::Result<mlua::Value> = chunk.eval();
    lua.remove_hook();

    match result? {
        // 直接返回布尔值与置位 execute 等效
        mlua::Value::Boolean(returned) => Ok(returned),
        _ => match env.get::<mlua::Value>("execute")? {
            mlua::Value::Boolean(flag) => Ok(flag),
            // 脚本未给出布尔结论：失败关闭
            _ => Ok(false),
        },
    }
}

/// 构建白名单环境表
///
/// 只暴露无副作用的核心函数与 math/string/table 三个标准库；
/// os、io、require、load、debug 一概不可见。
fn build_sandbox_env(lua: &Lua) -> mlua::Result<Table> {
    let env = lua.create_table()?;
    let globals = lua.globals();

    for name in &[
        "tostring", "tonumber", "type", "pairs", "ipairs", "next", "select", "error", "pcall",
        "xpcall", "assert", "rawget", "rawlen", "rawequal",
    ] {
        if let Ok(value) = globals.get::<mlua::Value>(*name) {
            if !matches!(value, mlua::Value::Nil) {
                env.set(*name, value)?;
            }
        }
    }

    for lib in &["math", "string", "table"] {
        if let Ok(value) = globals.get::<mlua::Value>(*lib) {
            if !matches!(value, mlua::Value::Nil) {
                env.set(*lib, value)?;
            }
        }
    }

    Ok(env)
}

/// 沿点分路径取值（"a.b.c"）
fn lookup_path<'v>(data: &'v serde_json::Value, path: &str) -> Option<&'v serde_json::Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// 归一化为可比较的字符串形式，字符串不带引号
fn comparable(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
