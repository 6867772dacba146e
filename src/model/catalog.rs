//! 模型目录
//!
//! 按集合名索引的只读模型元数据表，构造时一次性建立。
//! 查不到集合说明调用方或适配器本身有缺陷，按内部一致性错误处理。

use crate::error::AdapterResult;
use crate::model::field_types::{DefaultPolicy, FieldDefinition, FieldType, ModelMeta, StorageHint};
use crate::types::IdStrategy;
use rat_logger::{debug, error};
use std::collections::HashMap;
use std::sync::Arc;

/// 模型目录
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, Arc<ModelMeta>>,
}

impl ModelCatalog {
    /// 创建目录构建器
    pub fn builder() -> ModelCatalogBuilder {
        ModelCatalogBuilder::new()
    }

    /// 从模型列表直接构建
    pub fn from_models<I>(models: I) -> AdapterResult<Self>
    where
        I: IntoIterator<Item = ModelMeta>,
    {
        let mut builder = ModelCatalogBuilder::new();
        for model in models {
            builder = builder.register(model)?;
        }
        Ok(builder.build())
    }

    /// 按集合名查找模型定义
    pub fn lookup(&self, collection_name: &str) -> AdapterResult<Arc<ModelMeta>> {
        match self.models.get(collection_name) {
            Some(model) => Ok(Arc::clone(model)),
            None => {
                error!(
                    "集合 '{}' 没有注册模型定义，规范化查询可能被意外修改或适配器状态已损坏",
                    collection_name
                );
                Err(crate::adapter_error!(
                    internal,
                    collection_name,
                    "没有使用该集合名注册的模型"
                ))
            }
        }
    }

    /// 检查集合是否已注册
    pub fn contains(&self, collection_name: &str) -> bool {
        self.models.contains_key(collection_name)
    }

    /// 已注册模型数量
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// 目录是否为空
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// 所有已注册的集合名（排序后）
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }
}

/// 模型目录构建器
#[derive(Debug, Default)]
pub struct ModelCatalogBuilder {
    models: HashMap<String, Arc<ModelMeta>>,
}

impl ModelCatalogBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// 注册模型
    ///
    /// 同名集合重复注册、主键缺失或重复都会直接失败
    pub fn register(mut self, model: ModelMeta) -> AdapterResult<Self> {
        let collection_name = model.collection_name.clone();

        if self.models.contains_key(&collection_name) {
            return Err(crate::adapter_error!(
                internal,
                collection_name,
                "同一集合名注册了多个模型定义"
            ));
        }

        let primary_keys: Vec<&String> = model
            .fields
            .iter()
            .filter(|(_, def)| def.primary_key)
            .map(|(name, _)| name)
            .collect();
        match primary_keys.len() {
            1 => {}
            0 => {
                return Err(crate::adapter_error!(
                    internal,
                    collection_name,
                    "模型没有声明主键字段"
                ));
            }
            _ => {
                return Err(crate::adapter_error!(
                    internal,
                    collection_name,
                    format!("模型声明了多个主键字段: {:?}", primary_keys)
                ));
            }
        }

        check_generated_ids(&collection_name, &model.fields, &model.id_strategy, "")?;

        debug!(
            "注册模型元数据: 集合={}, 字段数量={}, 索引数量={}",
            collection_name,
            model.fields.len(),
            model.indexes.len()
        );
        self.models.insert(collection_name, Arc::new(model));
        Ok(self)
    }

    /// 完成构建
    pub fn build(self) -> ModelCatalog {
        ModelCatalog {
            models: self.models,
        }
    }
}

/// 生成ID的字段必须能容纳模型ID策略产生的值
fn check_generated_ids(
    collection_name: &str,
    fields: &HashMap<String, FieldDefinition>,
    strategy: &IdStrategy,
    prefix: &str,
) -> AdapterResult<()> {
    for (name, definition) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        if let FieldType::Object { fields: nested } = &definition.field_type {
            check_generated_ids(collection_name, nested, strategy, &path)?;
        }

        if definition.default != DefaultPolicy::GeneratedId {
            continue;
        }
        let compatible = match (strategy, &definition.field_type) {
            (IdStrategy::ObjectId, FieldType::String { .. }) => true,
            (IdStrategy::Uuid, FieldType::Uuid) => true,
            (IdStrategy::Uuid, FieldType::String { .. }) => definition.storage != StorageHint::ObjectId,
            (IdStrategy::Snowflake { .. }, FieldType::Integer { .. } | FieldType::Float { .. }) => true,
            _ => false,
        };
        if !compatible {
            return Err(crate::adapter_error!(
                internal,
                collection_name,
                format!(
                    "字段 {} 为{}类型，无法存放按 {:?} 策略生成的ID",
                    path,
                    definition.field_type.type_name(),
                    strategy
                )
            ));
        }
    }
    Ok(())
}
