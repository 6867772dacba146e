//! 模型定义模块
//!
//! 字段类型、默认值策略、存储提示，以及按集合名索引的模型目录

pub mod catalog;
pub mod convenience;
pub mod field_types;

// 重新导出核心类型
pub use catalog::{ModelCatalog, ModelCatalogBuilder};
pub use convenience::*;
pub use field_types::{
    DefaultPolicy, FieldDefinition, FieldType, IndexDefinition, ModelMeta, StorageHint,
};
