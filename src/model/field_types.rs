//! 字段类型定义模块
//!
//! 定义模型字段的类型、默认值策略、原生存储提示和约束校验

use crate::error::AdapterResult;
use crate::types::{DataValue, IdStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 字段类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// 字符串类型
    String {
        max_length: Option<usize>,
        min_length: Option<usize>,
        regex: Option<String>,
    },
    /// 整数类型
    Integer {
        min_value: Option<i64>,
        max_value: Option<i64>,
    },
    /// 浮点数类型
    Float {
        min_value: Option<f64>,
        max_value: Option<f64>,
    },
    /// 布尔类型
    Boolean,
    /// 日期时间类型
    DateTime,
    /// UUID类型
    Uuid,
    /// JSON类型（任意结构）
    Json,
    /// 二进制类型
    Binary,
    /// 数组类型
    Array {
        item_type: Box<FieldType>,
        max_items: Option<usize>,
        min_items: Option<usize>,
    },
    /// 对象类型（嵌套字段）
    Object {
        fields: HashMap<String, FieldDefinition>,
    },
}

impl FieldType {
    /// 类型名称，用于错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Integer { .. } => "integer",
            FieldType::Float { .. } => "float",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
            FieldType::Uuid => "uuid",
            FieldType::Json => "json",
            FieldType::Binary => "binary",
            FieldType::Array { .. } => "array",
            FieldType::Object { .. } => "object",
        }
    }
}

/// 默认值策略：调用方省略该字段时如何生成值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultPolicy {
    /// 不生成，字段缺省
    None,
    /// 固定值
    Value(DataValue),
    /// 按模型的 ID 策略生成标识符
    GeneratedId,
    /// 当前时间
    CurrentTime,
}

/// 原生存储提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageHint {
    /// 按字段类型的默认原生表示存储
    Auto,
    /// 字符串以原生 ObjectId 存储
    ObjectId,
    /// 日期时间以毫秒时间戳（Int64）存储
    EpochMillis,
}

/// 字段定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// 字段类型
    pub field_type: FieldType,
    /// 是否必填
    pub required: bool,
    /// 是否唯一
    pub unique: bool,
    /// 是否为主键（映射到 _id）
    pub primary_key: bool,
    /// 默认值策略
    pub default: DefaultPolicy,
    /// 原生存储提示
    pub storage: StorageHint,
    /// 字段描述
    pub description: Option<String>,
}

impl FieldDefinition {
    /// 创建新的字段定义
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            primary_key: false,
            default: DefaultPolicy::None,
            storage: StorageHint::Auto,
            description: None,
        }
    }

    /// 设置为必填字段
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// 设置为唯一字段
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// 设置为主键字段
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// 设置默认值
    pub fn default_value(mut self, value: DataValue) -> Self {
        self.default = DefaultPolicy::Value(value);
        self
    }

    /// 省略时按模型 ID 策略生成
    pub fn generated_id(mut self) -> Self {
        self.default = DefaultPolicy::GeneratedId;
        self
    }

    /// 省略时填充当前时间
    pub fn current_time(mut self) -> Self {
        self.default = DefaultPolicy::CurrentTime;
        self
    }

    /// 设置原生存储提示
    pub fn stored_as(mut self, storage: StorageHint) -> Self {
        self.storage = storage;
        self
    }

    /// 设置字段描述
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// 校验字段约束（长度、范围、正则、元素个数）
    ///
    /// 只检查约束，类型匹配由具体化阶段负责
    pub fn check_constraints(&self, value: &DataValue, field_name: &str) -> AdapterResult<()> {
        match (&self.field_type, value) {
            (FieldType::String { max_length, min_length, regex }, DataValue::String(s)) => {
                let len = s.chars().count();
                if let Some(max_len) = max_length {
                    if len > *max_len {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("字符串长度不能超过{}", max_len)
                        ));
                    }
                }
                if let Some(min_len) = min_length {
                    if len < *min_len {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("字符串长度不能少于{}", min_len)
                        ));
                    }
                }
                if let Some(pattern) = regex {
                    let regex = regex::Regex::new(pattern).map_err(|e| {
                        crate::adapter_error!(validation, field_name, format!("正则表达式无效: {}", e))
                    })?;
                    if !regex.is_match(s) {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            "字符串不匹配正则表达式"
                        ));
                    }
                }
            }
            (FieldType::Integer { min_value, max_value }, DataValue::Int(i)) => {
                if let Some(min_val) = min_value {
                    if i < min_val {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("整数值不能小于{}", min_val)
                        ));
                    }
                }
                if let Some(max_val) = max_value {
                    if i > max_val {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("整数值不能大于{}", max_val)
                        ));
                    }
                }
            }
            (FieldType::Float { min_value, max_value }, DataValue::Float(f)) => {
                if let Some(min_val) = min_value {
                    if f < min_val {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("浮点数值不能小于{}", min_val)
                        ));
                    }
                }
                if let Some(max_val) = max_value {
                    if f > max_val {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("浮点数值不能大于{}", max_val)
                        ));
                    }
                }
            }
            (FieldType::Array { max_items, min_items, .. }, DataValue::Array(arr)) => {
                if let Some(max_items) = max_items {
                    if arr.len() > *max_items {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("数组元素数量不能超过{}", max_items)
                        ));
                    }
                }
                if let Some(min_items) = min_items {
                    if arr.len() < *min_items {
                        return Err(crate::adapter_error!(
                            validation,
                            field_name,
                            format!("数组元素数量不能少于{}", min_items)
                        ));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// 模型元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    /// 集合名
    pub collection_name: String,
    /// 字段定义
    pub fields: HashMap<String, FieldDefinition>,
    /// 索引定义
    pub indexes: Vec<IndexDefinition>,
    /// 主键生成策略
    pub id_strategy: IdStrategy,
    /// 模型描述
    pub description: Option<String>,
}

impl ModelMeta {
    /// 创建空模型
    pub fn new(collection_name: &str) -> Self {
        Self {
            collection_name: collection_name.to_string(),
            fields: HashMap::new(),
            indexes: Vec::new(),
            id_strategy: IdStrategy::default(),
            description: None,
        }
    }

    /// 添加字段
    pub fn field(mut self, name: &str, definition: FieldDefinition) -> Self {
        self.fields.insert(name.to_string(), definition);
        self
    }

    /// 添加索引
    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// 设置主键生成策略
    pub fn id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// 设置模型描述
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// 获取主键字段（名称与定义）
    pub fn primary_key(&self) -> Option<(&str, &FieldDefinition)> {
        self.fields
            .iter()
            .find(|(_, def)| def.primary_key)
            .map(|(name, def)| (name.as_str(), def))
    }

    /// 所有唯一索引（包括字段级 unique 声明），以 (索引名, 字段列表) 返回
    pub fn unique_indexes(&self) -> Vec<(String, Vec<String>)> {
        let mut result: Vec<(String, Vec<String>)> = self
            .indexes
            .iter()
            .filter(|index| index.unique)
            .map(|index| (index.resolved_name(), index.fields.clone()))
            .collect();

        for (name, def) in &self.fields {
            if def.unique && !def.primary_key {
                let index_name = default_index_name(std::slice::from_ref(name));
                if !result.iter().any(|(existing, _)| existing == &index_name) {
                    result.push((index_name, vec![name.clone()]));
                }
            }
        }
        result
    }
}

/// 索引定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// 索引字段
    pub fields: Vec<String>,
    /// 是否唯一索引
    pub unique: bool,
    /// 索引名称
    pub name: Option<String>,
}

impl IndexDefinition {
    /// 创建唯一索引
    pub fn unique(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            unique: true,
            name: None,
        }
    }

    /// 设置索引名称
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// 实际索引名：显式名称，或 MongoDB 默认命名（field_1_other_1）
    pub fn resolved_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| default_index_name(&self.fields))
    }
}

/// MongoDB 默认索引命名
pub(crate) fn default_index_name(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("{}_1", f))
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_constraints() {
        let def = FieldDefinition::new(FieldType::String {
            max_length: Some(5),
            min_length: Some(2),
            regex: Some("^[a-z]+$".to_string()),
        });
        assert!(def.check_constraints(&DataValue::from("abc"), "name").is_ok());
        assert!(def.check_constraints(&DataValue::from("a"), "name").is_err());
        assert!(def.check_constraints(&DataValue::from("abcdef"), "name").is_err());
        assert!(def.check_constraints(&DataValue::from("ab1"), "name").is_err());
    }

    #[test]
    fn test_integer_range() {
        let def = FieldDefinition::new(FieldType::Integer { min_value: Some(0), max_value: Some(150) });
        assert!(def.check_constraints(&DataValue::Int(30), "age").is_ok());
        assert!(def.check_constraints(&DataValue::Int(-1), "age").is_err());
        assert!(def.check_constraints(&DataValue::Int(151), "age").is_err());
    }

    #[test]
    fn test_unique_indexes_include_field_level_unique() {
        let meta = ModelMeta::new("users")
            .field("id", FieldDefinition::new(FieldType::String { max_length: None, min_length: None, regex: None }).primary_key())
            .field("email", FieldDefinition::new(FieldType::String { max_length: None, min_length: None, regex: None }).unique())
            .index(IndexDefinition::unique(&["tenant", "slug"]));

        let indexes = meta.unique_indexes();
        assert!(indexes.contains(&("email_1".to_string(), vec!["email".to_string()])));
        assert!(indexes.contains(&(
            "tenant_1_slug_1".to_string(),
            vec!["tenant".to_string(), "slug".to_string()]
        )));
        assert_eq!(indexes.len(), 2);
        assert_eq!(meta.primary_key().map(|(name, _)| name), Some("id"));
    }
}
