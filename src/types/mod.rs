//! 通用类型定义
//!
//! 定义可移植数据值、ID 策略和规范化查询

pub mod data_value;
pub mod id_types;
pub mod query;

// 重新导出所有公共类型
pub use data_value::{DataValue, json_value_to_data_value};
pub use id_types::{IdStrategy, IdType};
pub use query::{NormalizedQuery, PortableRecord, QueryOptions};
