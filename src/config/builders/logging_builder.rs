//! # 日志配置构建器模块
//!
//! 提供日志配置的构建器实现，支持链式调用和严格验证

use crate::config::core::{LogLevel, LoggingConfig};
use crate::error::AdapterResult;
use rat_logger::debug;

/// 日志配置构建器
#[derive(Debug)]
pub struct LoggingConfigBuilder {
    level: Option<LogLevel>,
    console: Option<bool>,
}

impl LoggingConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            level: None,
            console: None,
        }
    }

    /// 设置日志级别
    ///
    /// # 参数
    ///
    /// * `level` - 日志级别
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// 设置是否输出到控制台
    ///
    /// # 参数
    ///
    /// * `console` - 是否输出到控制台
    pub fn console(mut self, console: bool) -> Self {
        self.console = Some(console);
        self
    }

    /// 构建日志配置
    ///
    /// # 错误
    ///
    /// 如果任何必需的配置项未设置，将返回错误
    pub fn build(self) -> AdapterResult<LoggingConfig> {
        let level = self
            .level
            .ok_or_else(|| crate::adapter_error!(config, "日志级别必须设置"))?;

        let console = self
            .console
            .ok_or_else(|| crate::adapter_error!(config, "控制台输出选项必须设置"))?;

        debug!("创建日志配置: 级别={:?}, 控制台={}", level, console);

        Ok(LoggingConfig { level, console })
    }
}

impl Default for LoggingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
