//! # 配置管理模块 - 核心配置类型
//!
//! 所有配置项必须显式设置，构建器不提供隐式默认值

use crate::error::{AdapterError, AdapterResult};
use rat_logger::{info, LevelFilter, LoggerBuilder};
use rat_logger::handler::term::TermConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 适配器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// MongoDB 连接串
    pub uri: String,
    /// 数据库名
    pub database: String,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 查询诊断配置
    pub diagnostics: DiagnosticsConfig,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否输出到控制台
    pub console: bool,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 错误级别
    Error,
    /// 警告级别
    Warn,
    /// 信息级别
    Info,
    /// 调试级别
    Debug,
    /// 跟踪级别
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// 查询诊断配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// 不论查询是否请求诊断都输出
    pub always_emit: bool,
    /// 渲染查询时的最大嵌套深度
    pub max_depth: usize,
}

impl DiagnosticsConfig {
    /// 默认渲染深度
    pub const DEFAULT_MAX_DEPTH: usize = 5;

    pub fn new(always_emit: bool, max_depth: usize) -> Self {
        Self {
            always_emit,
            max_depth,
        }
    }
}

impl AdapterConfig {
    /// 创建适配器配置构建器
    pub fn builder() -> super::builders::AdapterConfigBuilder {
        super::builders::AdapterConfigBuilder::new()
    }

    /// 从配置文件加载配置，按扩展名区分 TOML / JSON
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> AdapterResult<Self> {
        let content = std::fs::read_to_string(config_path.as_ref()).map_err(AdapterError::IoError)?;

        let config: AdapterConfig = if is_toml(config_path.as_ref()) {
            toml::from_str(&content)
                .map_err(|e| crate::adapter_error!(config, format!("解析TOML配置文件失败: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| crate::adapter_error!(config, format!("解析JSON配置文件失败: {}", e)))?
        };

        config.validate()?;
        info!("从文件加载配置: {:?}", config_path.as_ref());
        Ok(config)
    }

    /// 校验连接串、数据库名和诊断深度
    pub fn validate(&self) -> AdapterResult<()> {
        if !self.uri.starts_with("mongodb://") && !self.uri.starts_with("mongodb+srv://") {
            return Err(crate::adapter_error!(
                config,
                format!("连接串必须以 mongodb:// 或 mongodb+srv:// 开头: {}", self.uri)
            ));
        }

        if self.database.is_empty() {
            return Err(crate::adapter_error!(config, "数据库名不能为空"));
        }

        if self.diagnostics.max_depth == 0 {
            return Err(crate::adapter_error!(config, "诊断渲染深度不能为零"));
        }

        Ok(())
    }

    /// 保存配置到文件
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn save_to_file<P: AsRef<Path>>(&self, config_path: P) -> AdapterResult<()> {
        let content = if is_toml(config_path.as_ref()) {
            toml::to_string_pretty(self)
                .map_err(|e| crate::adapter_error!(config, format!("序列化TOML配置失败: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| crate::adapter_error!(config, format!("序列化JSON配置失败: {}", e)))?
        };

        std::fs::write(config_path.as_ref(), content).map_err(AdapterError::IoError)?;

        info!("保存配置到文件: {:?}", config_path.as_ref());
        Ok(())
    }
}

impl LoggingConfig {
    /// 创建日志配置构建器
    pub fn builder() -> super::builders::LoggingConfigBuilder {
        super::builders::LoggingConfigBuilder::new()
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

/// 按配置初始化日志系统
///
/// 库本身不会初始化日志，由调用方决定是否使用这个辅助函数
pub fn init_logging(config: &LoggingConfig) -> AdapterResult<()> {
    if !config.console {
        return Ok(());
    }
    LoggerBuilder::new()
        .with_level(config.level.into())
        .add_terminal_with_config(TermConfig::default())
        .init()
        .map_err(|e| crate::adapter_error!(config, format!("日志系统初始化失败: {}", e)))?;
    Ok(())
}
