//! 配置系统
//! 从环境变量加载所有配置

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SandboxConfig {
    /// 条件脚本墙钟超时时间（毫秒）
    pub timeout_ms: u64,
    /// 条件脚本指令数上限
    pub instruction_budget: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub sandbox: SandboxConfig,
}

impl EngineConfig {
    /// 从环境变量加载配置（前缀为 FORM_）
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("sandbox.timeout_ms", 500)?
            .set_default("sandbox.instruction_budget", 1_000_000)?;

        settings = settings.add_source(
            Environment::with_prefix("FORM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证沙箱超时范围（10ms 到 30s）
        if self.sandbox.timeout_ms < 10 || self.sandbox.timeout_ms > 30_000 {
            return Err(ConfigError::Message(
                "sandbox.timeout_ms must be between 10 and 30000".to_string(),
            ));
        }

        // 验证指令数上限
        if self.sandbox.instruction_budget < 1_000 {
            return Err(ConfigError::Message(
                "sandbox.instruction_budget must be at least 1000".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            sandbox: SandboxConfig {
                timeout_ms: 500,
                instruction_budget: 1_000_000,
            },
        }
    }
}
