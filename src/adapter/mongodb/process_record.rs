//! 结果归一化模块
//!
//! 把后端返回的原生文档还原为只含可移植值的记录（具体化的逆过程）

use super::utils::{binary_to_uuid, bson_to_data_value, document_to_data_map, from_bson_datetime, millis_to_datetime};
use crate::error::{AdapterError, AdapterResult};
use crate::model::{FieldDefinition, FieldType, ModelMeta};
use crate::types::{DataValue, PortableRecord};
use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use rat_logger::{debug, warn};
use std::collections::HashMap;

/// 将原生文档归一化为可移植记录
///
/// `_id` 改回主键字段名；声明过的字段按声明类型还原，无法还原时报数据完整性错误；
/// 未声明的字段按通用规则转换后保留
pub fn process_native_record(document: Document, model: &ModelMeta) -> AdapterResult<PortableRecord> {
    let (primary_key, _) = model.primary_key().ok_or_else(|| {
        crate::adapter_error!(internal, &model.collection_name, "模型缺少主键字段")
    })?;

    let mut record = HashMap::with_capacity(document.len());
    for (key, value) in document {
        let name = if key == "_id" { primary_key.to_string() } else { key };
        let portable = match model.fields.get(&name) {
            Some(definition) => normalize_field(&name, definition, value).map_err(|e| {
                warn!("集合 {} 的字段 {} 无法还原: {}", model.collection_name, name, e);
                e
            })?,
            None => bson_to_data_value(&value),
        };
        record.insert(name, portable);
    }

    debug!("集合 {} 的记录已归一化，共 {} 个字段", model.collection_name, record.len());
    Ok(record)
}

fn integrity_error(path: &str, expected: &FieldType, actual: &Bson) -> AdapterError {
    crate::adapter_error!(
        integrity,
        path,
        format!(
            "存储值类型为{:?}，无法还原为{}类型",
            actual.element_type(),
            expected.type_name()
        )
    )
}

/// 按声明类型还原单个字段
fn normalize_field(path: &str, definition: &FieldDefinition, value: Bson) -> AdapterResult<DataValue> {
    let field_type = &definition.field_type;
    if matches!(value, Bson::Null | Bson::Undefined) {
        // JSON 字段的空值还原为 JSON null
        if matches!(field_type, FieldType::Json) {
            return Ok(DataValue::Json(serde_json::Value::Null));
        }
        return Ok(DataValue::Null);
    }

    match (field_type, value) {
        (FieldType::String { .. }, Bson::String(s)) | (FieldType::String { .. }, Bson::Symbol(s)) => {
            Ok(DataValue::String(s))
        }
        (FieldType::String { .. }, Bson::ObjectId(oid)) => Ok(DataValue::String(oid.to_hex())),

        (FieldType::Integer { .. }, Bson::Int32(i)) => Ok(DataValue::Int(i as i64)),
        (FieldType::Integer { .. }, Bson::Int64(i)) => Ok(DataValue::Int(i)),
        (FieldType::Integer { .. }, Bson::Double(f))
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 =>
        {
            Ok(DataValue::Int(f as i64))
        }

        (FieldType::Float { .. }, Bson::Double(f)) => Ok(DataValue::Float(f)),
        (FieldType::Float { .. }, Bson::Int32(i)) => Ok(DataValue::Float(i as f64)),
        (FieldType::Float { .. }, Bson::Int64(i)) => Ok(DataValue::Float(i as f64)),

        (FieldType::Boolean, Bson::Boolean(b)) => Ok(DataValue::Bool(b)),

        (FieldType::DateTime, value) => normalize_datetime(path, field_type, value).map(DataValue::DateTime),

        (FieldType::Uuid, Bson::String(s)) => uuid::Uuid::parse_str(&s)
            .map(DataValue::Uuid)
            .map_err(|e| crate::adapter_error!(integrity, path, format!("存储的UUID无效: {}", e))),
        (FieldType::Uuid, Bson::Binary(bin)) => match binary_to_uuid(&bin) {
            Some(uuid) => Ok(DataValue::Uuid(uuid)),
            None => Err(integrity_error(path, field_type, &Bson::Binary(bin))),
        },

        (FieldType::Json, value) => Ok(DataValue::Json(value.into_relaxed_extjson())),

        (FieldType::Binary, Bson::Binary(bin)) => Ok(DataValue::Bytes(bin.bytes)),

        (FieldType::Array { item_type, .. }, Bson::Array(items)) => {
            let item_definition = FieldDefinition::new((**item_type).clone());
            let mut array = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                array.push(normalize_field(&item_path, &item_definition, item)?);
            }
            Ok(DataValue::Array(array))
        }

        (FieldType::Object { fields }, Bson::Document(doc)) => {
            if fields.is_empty() {
                return Ok(DataValue::Object(document_to_data_map(&doc)));
            }
            let mut object = HashMap::with_capacity(doc.len());
            for (key, value) in doc {
                let nested_path = format!("{}.{}", path, key);
                let portable = match fields.get(&key) {
                    Some(nested) => normalize_field(&nested_path, nested, value)?,
                    None => bson_to_data_value(&value),
                };
                object.insert(key, portable);
            }
            Ok(DataValue::Object(object))
        }

        (_, other) => Err(integrity_error(path, field_type, &other)),
    }
}

/// 日期时间两种存储形式（BSON DateTime / 毫秒时间戳）都接受，另外兼容 RFC3339 字符串
fn normalize_datetime(path: &str, field_type: &FieldType, value: Bson) -> AdapterResult<DateTime<Utc>> {
    let converted = match &value {
        Bson::DateTime(dt) => from_bson_datetime(dt),
        Bson::Int64(millis) => millis_to_datetime(*millis),
        Bson::Int32(millis) => millis_to_datetime(*millis as i64),
        Bson::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    };
    converted.ok_or_else(|| integrity_error(path, field_type, &value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FootprintIdentity;
    use crate::model::{
        boolean_field, datetime_field, integer_field, json_field, object_id_field, string_field,
        timestamp_field, uuid_field,
    };
    use mongodb::bson::doc;
    use mongodb::bson::oid::ObjectId;

    fn model() -> ModelMeta {
        ModelMeta::new("users")
            .field("id", object_id_field())
            .field("name", string_field(None, None, None))
            .field("age", integer_field(None, None))
            .field("active", boolean_field())
            .field("born", datetime_field())
            .field("seen", timestamp_field())
            .field("token", uuid_field())
            .field("extra", json_field())
    }

    #[test]
    fn test_primary_key_and_declared_types_are_restored() {
        let oid = ObjectId::new();
        let token = uuid::Uuid::new_v4();
        let born = millis_to_datetime(946_684_800_000).unwrap();
        let stored = doc! {
            "_id": oid,
            "name": "alice",
            "age": 30i32,
            "active": true,
            "born": mongodb::bson::DateTime::from_millis(946_684_800_000),
            "seen": 946_684_800_000i64,
            "token": token.to_string(),
            "extra": { "tags": ["a", "b"] },
        };

        let record = process_native_record(stored, &model()).unwrap();
        assert_eq!(record["id"], DataValue::String(oid.to_hex()));
        assert!(!record.contains_key("_id"));
        assert_eq!(record["age"], DataValue::Int(30));
        assert_eq!(record["active"], DataValue::Bool(true));
        assert_eq!(record["born"], DataValue::DateTime(born));
        assert_eq!(record["seen"], DataValue::DateTime(born));
        assert_eq!(record["token"], DataValue::Uuid(token));
        assert_eq!(
            record["extra"],
            DataValue::Json(serde_json::json!({ "tags": ["a", "b"] }))
        );
    }

    #[test]
    fn test_undeclared_fields_are_kept() {
        let stored = doc! { "_id": ObjectId::new(), "status": "new", "count": 2i32 };
        let record = process_native_record(stored, &model()).unwrap();
        assert_eq!(record["status"], DataValue::String("new".to_string()));
        assert_eq!(record["count"], DataValue::Int(2));
    }

    #[test]
    fn test_schema_drift_is_a_data_integrity_error() {
        let stored = doc! { "_id": ObjectId::new(), "age": "thirty" };
        let err = process_native_record(stored, &model()).unwrap_err();
        let footprint = err.footprint();
        assert_eq!(footprint.identity, FootprintIdentity::DataIntegrity);
        assert_eq!(footprint.keys, vec!["age".to_string()]);
    }

    #[test]
    fn test_null_is_kept_as_null() {
        let stored = doc! { "_id": ObjectId::new(), "name": Bson::Null, "extra": Bson::Null };
        let record = process_native_record(stored, &model()).unwrap();
        assert_eq!(record["name"], DataValue::Null);
        assert_eq!(record["extra"], DataValue::Json(serde_json::Value::Null));
    }
}
