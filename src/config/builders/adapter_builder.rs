//! # 适配器配置构建器模块

use crate::config::core::{AdapterConfig, DiagnosticsConfig, LoggingConfig};
use crate::error::AdapterResult;
use rat_logger::info;

/// 适配器配置构建器
#[derive(Debug)]
pub struct AdapterConfigBuilder {
    uri: Option<String>,
    database: Option<String>,
    logging: Option<LoggingConfig>,
    diagnostics: Option<DiagnosticsConfig>,
}

impl AdapterConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            uri: None,
            database: None,
            logging: None,
            diagnostics: None,
        }
    }

    /// 设置连接串
    pub fn uri<S: Into<String>>(mut self, uri: S) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// 设置数据库名
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// 设置日志配置
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// 设置查询诊断配置
    pub fn diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// 构建适配器配置
    ///
    /// # 错误
    ///
    /// 任何配置项未设置，或连接串/数据库名/诊断深度无效时返回错误
    pub fn build(self) -> AdapterResult<AdapterConfig> {
        let uri = self
            .uri
            .ok_or_else(|| crate::adapter_error!(config, "连接串必须设置"))?;
        let database = self
            .database
            .ok_or_else(|| crate::adapter_error!(config, "数据库名必须设置"))?;
        let logging = self
            .logging
            .ok_or_else(|| crate::adapter_error!(config, "日志配置必须设置"))?;
        let diagnostics = self
            .diagnostics
            .ok_or_else(|| crate::adapter_error!(config, "查询诊断配置必须设置"))?;

        let config = AdapterConfig {
            uri,
            database,
            logging,
            diagnostics,
        };
        config.validate()?;

        info!("创建适配器配置: 数据库={}", config.database);
        Ok(config)
    }
}

impl Default for AdapterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
