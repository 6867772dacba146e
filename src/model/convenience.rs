//! 模型便捷函数模块
//!
//! 提供创建各种字段类型的便捷函数

use crate::model::field_types::{FieldDefinition, FieldType, StorageHint};
use std::collections::HashMap;

/// 便捷函数：创建数组字段
/// 在 MongoDB 中使用原生数组存储
pub fn array_field(
    item_type: FieldType,
    max_items: Option<usize>,
    min_items: Option<usize>,
) -> FieldDefinition {
    FieldDefinition::new(FieldType::Array {
        item_type: Box::new(item_type),
        max_items,
        min_items,
    })
}

/// 便捷函数：创建列表字段（array_field 的别名）
pub fn list_field(
    item_type: FieldType,
    max_items: Option<usize>,
    min_items: Option<usize>,
) -> FieldDefinition {
    array_field(item_type, max_items, min_items)
}

/// 便捷函数：创建字符串字段
pub fn string_field(
    max_length: Option<usize>,
    min_length: Option<usize>,
    regex: Option<String>,
) -> FieldDefinition {
    FieldDefinition::new(FieldType::String {
        max_length,
        min_length,
        regex,
    })
}

/// 便捷函数：创建整数字段
pub fn integer_field(min_value: Option<i64>, max_value: Option<i64>) -> FieldDefinition {
    FieldDefinition::new(FieldType::Integer {
        min_value,
        max_value,
    })
}

/// 便捷函数：创建浮点数字段
pub fn float_field(min_value: Option<f64>, max_value: Option<f64>) -> FieldDefinition {
    FieldDefinition::new(FieldType::Float {
        min_value,
        max_value,
    })
}

/// 便捷函数：创建布尔字段
pub fn boolean_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Boolean)
}

/// 便捷函数：创建日期时间字段（原生日期存储）
pub fn datetime_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::DateTime)
}

/// 便捷函数：创建以毫秒时间戳存储的日期时间字段
pub fn timestamp_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::DateTime).stored_as(StorageHint::EpochMillis)
}

/// 便捷函数：创建UUID字段
pub fn uuid_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Uuid)
}

/// 便捷函数：创建JSON字段
pub fn json_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Json)
}

/// 便捷函数：创建二进制字段
pub fn binary_field() -> FieldDefinition {
    FieldDefinition::new(FieldType::Binary)
}

/// 便捷函数：创建字典字段（嵌套对象）
pub fn dict_field(fields: HashMap<String, FieldDefinition>) -> FieldDefinition {
    FieldDefinition::new(FieldType::Object { fields })
}

/// 便捷函数：创建 ObjectId 主键字段
///
/// 对外是24位十六进制字符串，存储为原生 ObjectId，省略时自动生成
pub fn object_id_field() -> FieldDefinition {
    string_field(None, None, None)
        .primary_key()
        .stored_as(StorageHint::ObjectId)
        .generated_id()
}
