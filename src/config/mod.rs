//! # 配置管理模块
//!
//! 提供构建器模式的配置管理，所有配置项必须显式设置

pub mod builders;
pub mod core;

pub use builders::{AdapterConfigBuilder, LoggingConfigBuilder};
pub use self::core::{init_logging, AdapterConfig, DiagnosticsConfig, LogLevel, LoggingConfig};
