//! MongoDB适配器模块
//!
//! 采用模块化设计：
//! - adapter.rs: 核心适配器结构与构建器
//! - operations.rs: 新增记录操作
//! - reify.rs: 可移植值 → BSON 文档
//! - process_record.rs: BSON 文档 → 可移植记录
//! - native_error.rs: 原生错误归一化
//! - utils.rs: 通用 BSON 转换工具函数

pub mod adapter;
pub mod native_error;
pub mod operations;
pub mod process_record;
pub mod reify;
pub(crate) mod utils;

// 重新导出核心类型
pub use adapter::{MongoAdapter, MongoAdapterBuilder};
pub use native_error::{normalize_native_error, NormalizedError, NormalizedErrorKind};
pub use process_record::process_native_record;
pub use reify::{reify_values_to_set, ReifyContext};
