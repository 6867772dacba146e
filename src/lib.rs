//! rat_mongo_adapter - 规范化查询的文档数据库适配器
//!
//! 接收上层解析好的新增记录查询，把可移植字段值具体化为 BSON，
//! 通过原生驱动写入（可选回读），再把结果与驱动错误归一化。

// 导出所有公共模块
pub mod adapter;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod i18n;
pub mod id_generator;
pub mod model;
pub mod types;

// 重新导出常用类型和函数
pub use adapter::{DatabaseAdapter, MongoAdapter, MongoAdapterBuilder};
pub use config::{
    init_logging, AdapterConfig, AdapterConfigBuilder, DiagnosticsConfig, LogLevel,
    LoggingConfig, LoggingConfigBuilder,
};
pub use diagnostics::{DiagnosticEvent, DiagnosticLevel, DiagnosticSink, LoggerSink, NoopSink};
pub use driver::{InsertAck, MemoryDriver, MongoDriver, NativeDriver, NativeError, NativeErrorKind};
pub use error::{AdapterError, AdapterResult, Footprint, FootprintIdentity};
pub use id_generator::{Clock, DefaultIdGenerator, FixedClock, IdGenerator, SystemClock};
pub use model::{
    array_field, binary_field, boolean_field, datetime_field, dict_field, float_field,
    integer_field, json_field, list_field, object_id_field, string_field, timestamp_field,
    uuid_field, DefaultPolicy, FieldDefinition, FieldType, IndexDefinition, ModelCatalog,
    ModelCatalogBuilder, ModelMeta, StorageHint,
};
pub use types::*;

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化库
///
/// 注册多语言错误消息并按环境变量选择语言。
/// 日志系统由调用者自行初始化，可使用 [`config::init_logging`]
pub fn init() {
    i18n::ErrorMessageI18n::init();
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
