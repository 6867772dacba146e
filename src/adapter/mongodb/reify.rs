//! 值具体化模块
//!
//! 把调用方给出的可移植字段值转换为可直接写入的 BSON 文档：
//! 补齐默认值、按声明类型强制转换、校验约束，并把主键改名为 `_id`。
//!
//! 除 `GeneratedId` / `CurrentTime` 两种默认值外，输出只取决于模型和输入。

use super::utils::{millis_to_datetime, to_bson_datetime};
use crate::error::AdapterResult;
use crate::id_generator::{Clock, IdGenerator};
use crate::model::{DefaultPolicy, FieldDefinition, FieldType, ModelMeta, StorageHint};
use crate::types::{DataValue, IdStrategy};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, Bson, Document};
use rat_logger::debug;
use std::collections::HashMap;

/// 具体化上下文：非确定性默认值的来源
pub struct ReifyContext<'a> {
    pub id_generator: &'a dyn IdGenerator,
    pub clock: &'a dyn Clock,
    pub id_strategy: &'a IdStrategy,
}

/// 将新记录具体化为原生文档
pub fn reify_values_to_set(
    new_record: HashMap<String, DataValue>,
    model: &ModelMeta,
    ctx: &ReifyContext<'_>,
) -> AdapterResult<Document> {
    let document = reify_fields(new_record, &model.fields, "", true, ctx)?;
    debug!(
        "集合 {} 的记录已具体化，共 {} 个字段",
        model.collection_name,
        document.len()
    );
    Ok(document)
}

/// 按字段声明具体化一层字段
///
/// 顶层调用时 `top_level` 为 true，主键改名为 `_id`
fn reify_fields(
    mut values: HashMap<String, DataValue>,
    fields: &HashMap<String, FieldDefinition>,
    prefix: &str,
    top_level: bool,
    ctx: &ReifyContext<'_>,
) -> AdapterResult<Document> {
    if let Some(unknown) = values.keys().find(|name| !fields.contains_key(*name)) {
        return Err(crate::adapter_error!(
            validation,
            field_path(prefix, unknown),
            "模型中未声明该字段"
        ));
    }

    let mut names: Vec<&String> = fields.keys().collect();
    names.sort();

    let mut document = Document::new();
    for name in names {
        let definition = &fields[name];
        let path = field_path(prefix, name);
        let is_primary_key = top_level && definition.primary_key;

        let provided = values.remove(name).filter(|value| {
            // 主键给了空值等同于省略，交给默认值策略或由后端生成
            !(is_primary_key && is_blank(value))
        });
        let value = match provided {
            Some(value) => value,
            None => match default_value(definition, ctx)? {
                Some(value) => {
                    crate::debug_log!("字段 {} 使用默认值: {}", path, value);
                    value
                }
                None if definition.required && !is_primary_key => {
                    return Err(crate::adapter_error!(validation, path, "必填字段缺失"));
                }
                None => continue,
            },
        };

        let native = reify_field(&path, definition, value, ctx)?;
        let key = if is_primary_key { "_id" } else { name.as_str() };
        document.insert(key, native);
    }
    Ok(document)
}

fn field_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn is_blank(value: &DataValue) -> bool {
    match value {
        DataValue::Null => true,
        DataValue::String(s) => s.is_empty(),
        _ => false,
    }
}

/// 按默认值策略生成值
fn default_value(definition: &FieldDefinition, ctx: &ReifyContext<'_>) -> AdapterResult<Option<DataValue>> {
    Ok(match &definition.default {
        DefaultPolicy::None => None,
        DefaultPolicy::Value(value) => Some(value.clone()),
        DefaultPolicy::GeneratedId => Some(ctx.id_generator.generate(ctx.id_strategy)?.into()),
        DefaultPolicy::CurrentTime => Some(DataValue::DateTime(ctx.clock.now())),
    })
}

fn type_mismatch(path: &str, expected: &FieldType, actual: &DataValue) -> crate::error::AdapterError {
    crate::adapter_error!(
        validation,
        path,
        format!(
            "字段类型不匹配，期望{}类型，实际收到{}",
            expected.type_name(),
            actual.type_name()
        )
    )
}

/// 按声明类型具体化单个字段值
fn reify_field(
    path: &str,
    definition: &FieldDefinition,
    value: DataValue,
    ctx: &ReifyContext<'_>,
) -> AdapterResult<Bson> {
    let field_type = &definition.field_type;
    // JSON 字段里的 null 与空值同等对待
    let json_null = matches!(
        (field_type, &value),
        (FieldType::Json, DataValue::Json(serde_json::Value::Null))
    );
    if value.is_null() || json_null {
        if definition.required {
            return Err(crate::adapter_error!(validation, path, "必填字段不能为空值"));
        }
        return Ok(Bson::Null);
    }

    match field_type {
        FieldType::String { .. } => {
            let s = match value {
                DataValue::String(s) => s,
                other => return Err(type_mismatch(path, field_type, &other)),
            };
            definition.check_constraints(&DataValue::String(s.clone()), path)?;
            if definition.storage == StorageHint::ObjectId {
                let oid = ObjectId::parse_str(&s).map_err(|e| {
                    crate::adapter_error!(validation, path, format!("无效的ObjectId: {}", e))
                })?;
                Ok(Bson::ObjectId(oid))
            } else {
                Ok(Bson::String(s))
            }
        }
        FieldType::Integer { .. } => {
            let i = match value {
                DataValue::Int(i) => i,
                DataValue::UInt(u) => i64::try_from(u).map_err(|_| {
                    crate::adapter_error!(validation, path, format!("整数 {} 超出 i64 范围", u))
                })?,
                DataValue::Float(f) if is_integral(f) => f as i64,
                other => return Err(type_mismatch(path, field_type, &other)),
            };
            definition.check_constraints(&DataValue::Int(i), path)?;
            Ok(Bson::Int64(i))
        }
        FieldType::Float { .. } => {
            let f = match value {
                DataValue::Float(f) => f,
                DataValue::Int(i) => i as f64,
                DataValue::UInt(u) => u as f64,
                other => return Err(type_mismatch(path, field_type, &other)),
            };
            definition.check_constraints(&DataValue::Float(f), path)?;
            Ok(Bson::Double(f))
        }
        FieldType::Boolean => match value {
            DataValue::Bool(b) => Ok(Bson::Boolean(b)),
            other => Err(type_mismatch(path, field_type, &other)),
        },
        FieldType::DateTime => {
            let dt = coerce_datetime(path, field_type, value)?;
            if definition.storage == StorageHint::EpochMillis {
                Ok(Bson::Int64(dt.timestamp_millis()))
            } else {
                Ok(Bson::DateTime(to_bson_datetime(&dt)))
            }
        }
        FieldType::Uuid => match value {
            DataValue::Uuid(uuid) => Ok(Bson::String(uuid.to_string())),
            DataValue::String(s) => {
                let uuid = uuid::Uuid::parse_str(&s).map_err(|e| {
                    crate::adapter_error!(validation, path, format!("无效的UUID: {}", e))
                })?;
                Ok(Bson::String(uuid.to_string()))
            }
            other => Err(type_mismatch(path, field_type, &other)),
        },
        FieldType::Json => {
            let json = match value {
                DataValue::Json(json) => json,
                other => other.to_json_value(),
            };
            mongodb::bson::to_bson(&json).map_err(|e| {
                crate::adapter_error!(validation, path, format!("JSON值无法转换为BSON: {}", e))
            })
        }
        FieldType::Binary => match value {
            DataValue::Bytes(bytes) => Ok(Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            })),
            other => Err(type_mismatch(path, field_type, &other)),
        },
        FieldType::Array { item_type, .. } => {
            let items = match value {
                DataValue::Array(items) => items,
                other => return Err(type_mismatch(path, field_type, &other)),
            };
            definition.check_constraints(&DataValue::Array(items.clone()), path)?;
            let item_definition = FieldDefinition::new((**item_type).clone());
            let mut array = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                array.push(reify_field(&item_path, &item_definition, item, ctx)?);
            }
            Ok(Bson::Array(array))
        }
        FieldType::Object { fields } => {
            let map = match value {
                DataValue::Object(map) => map,
                other => return Err(type_mismatch(path, field_type, &other)),
            };
            if fields.is_empty() {
                return reify_untyped(path, DataValue::Object(map));
            }
            Ok(Bson::Document(reify_fields(map, fields, path, false, ctx)?))
        }
    }
}

/// 未声明子字段的对象中的值按自身类型存储
///
/// 存下的值必须能原样读回：超出 i64 的无符号整数直接拒绝，UUID 以 UUID 子类型二进制存储
fn reify_untyped(path: &str, value: DataValue) -> AdapterResult<Bson> {
    Ok(match value {
        DataValue::Null => Bson::Null,
        DataValue::Bool(b) => Bson::Boolean(b),
        DataValue::Int(i) => Bson::Int64(i),
        DataValue::UInt(u) => Bson::Int64(i64::try_from(u).map_err(|_| {
            crate::adapter_error!(validation, path, format!("整数 {} 超出 i64 范围", u))
        })?),
        DataValue::Float(f) => Bson::Double(f),
        DataValue::String(s) => Bson::String(s),
        DataValue::Bytes(bytes) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        }),
        DataValue::DateTime(dt) => Bson::DateTime(to_bson_datetime(&dt)),
        DataValue::Uuid(uuid) => Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: uuid.as_bytes().to_vec(),
        }),
        DataValue::Json(json) => mongodb::bson::to_bson(&json).map_err(|e| {
            crate::adapter_error!(validation, path, format!("JSON值无法转换为BSON: {}", e))
        })?,
        DataValue::Array(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                array.push(reify_untyped(&format!("{}[{}]", path, index), item)?);
            }
            Bson::Array(array)
        }
        DataValue::Object(map) => {
            let mut entries: Vec<(String, DataValue)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut document = Document::new();
            for (key, item) in entries {
                let bson = reify_untyped(&field_path(path, &key), item)?;
                document.insert(key, bson);
            }
            Bson::Document(document)
        }
    })
}

fn is_integral(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

fn coerce_datetime(path: &str, field_type: &FieldType, value: DataValue) -> AdapterResult<DateTime<Utc>> {
    match value {
        DataValue::DateTime(dt) => Ok(dt),
        DataValue::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                crate::adapter_error!(validation, path, format!("无法解析RFC3339时间 '{}': {}", s, e))
            }),
        DataValue::Int(millis) => millis_to_datetime(millis).ok_or_else(|| {
            crate::adapter_error!(validation, path, format!("毫秒时间戳超出范围: {}", millis))
        }),
        other => Err(type_mismatch(path, field_type, &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FootprintIdentity;
    use crate::id_generator::FixedClock;
    use crate::model::{
        datetime_field, dict_field, integer_field, json_field, object_id_field, string_field,
        timestamp_field,
    };
    use crate::types::IdType;
    use mongodb::bson::doc;

    struct SequenceIds;

    impl IdGenerator for SequenceIds {
        fn generate(&self, _strategy: &IdStrategy) -> AdapterResult<IdType> {
            Ok(IdType::String("65a000000000000000000001".to_string()))
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        millis_to_datetime(1_700_000_000_000).unwrap()
    }

    fn reify(model: &ModelMeta, record: HashMap<String, DataValue>) -> AdapterResult<Document> {
        let clock = FixedClock(fixed_now());
        let ctx = ReifyContext {
            id_generator: &SequenceIds,
            clock: &clock,
            id_strategy: &model.id_strategy,
        };
        reify_values_to_set(record, model, &ctx)
    }

    fn user_model() -> ModelMeta {
        ModelMeta::new("users")
            .field("id", object_id_field())
            .field("name", string_field(Some(20), Some(1), None).required())
            .field("age", integer_field(Some(0), Some(150)))
            .field("created_at", datetime_field().current_time())
            .field("seen_at", timestamp_field())
    }

    fn record(pairs: Vec<(&str, DataValue)>) -> HashMap<String, DataValue> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_defaults_and_primary_key_rename() {
        let doc = reify(&user_model(), record(vec![("name", "alice".into())])).unwrap();
        let oid = ObjectId::parse_str("65a000000000000000000001").unwrap();
        assert_eq!(doc.get("_id"), Some(&Bson::ObjectId(oid)));
        assert!(!doc.contains_key("id"));
        assert_eq!(
            doc.get("created_at"),
            Some(&Bson::DateTime(to_bson_datetime(&fixed_now())))
        );
        assert!(!doc.contains_key("age"));
    }

    #[test]
    fn test_coercions_follow_declared_types() {
        let doc = reify(
            &user_model(),
            record(vec![
                ("name", "bob".into()),
                ("age", DataValue::Float(42.0)),
                ("seen_at", DataValue::String("2024-01-02T03:04:05.678Z".to_string())),
            ]),
        )
        .unwrap();
        assert_eq!(doc.get("age"), Some(&Bson::Int64(42)));
        assert_eq!(doc.get("seen_at"), Some(&Bson::Int64(1_704_164_645_678)));
    }

    #[test]
    fn test_explicit_null_on_optional_field_is_stored() {
        let doc = reify(
            &user_model(),
            record(vec![("name", "c".into()), ("age", DataValue::Null)]),
        )
        .unwrap();
        assert_eq!(doc.get("age"), Some(&Bson::Null));
    }

    #[test]
    fn test_validation_failures() {
        let model = user_model();

        let err = reify(&model, record(vec![("age", DataValue::Int(3))])).unwrap_err();
        assert_eq!(err.footprint().identity, FootprintIdentity::Validation);
        assert_eq!(err.footprint().keys, vec!["name".to_string()]);

        let err = reify(&model, record(vec![("name", DataValue::Null)])).unwrap_err();
        assert_eq!(err.footprint().keys, vec!["name".to_string()]);

        let err = reify(&model, record(vec![("name", "d".into()), ("nickname", "x".into())]))
            .unwrap_err();
        assert_eq!(err.footprint().keys, vec!["nickname".to_string()]);

        let err = reify(&model, record(vec![("name", "d".into()), ("age", DataValue::Int(200))])).unwrap_err();
        assert_eq!(err.footprint().keys, vec!["age".to_string()]);

        let err = reify(&model, record(vec![("name", "d".into()), ("age", DataValue::Float(1.5))]))
            .unwrap_err();
        assert_eq!(err.footprint().keys, vec!["age".to_string()]);

        let err = reify(&model, record(vec![("name", "d".into()), ("id", "not-hex".into())]))
            .unwrap_err();
        assert_eq!(err.footprint().keys, vec!["id".to_string()]);
    }

    #[test]
    fn test_nested_objects_are_reified_recursively() {
        let mut address_fields = HashMap::new();
        address_fields.insert(
            "zip".to_string(),
            integer_field(None, None).required(),
        );
        let model = ModelMeta::new("places")
            .field("id", object_id_field())
            .field("address", FieldDefinition::new(FieldType::Object { fields: address_fields }));

        let mut address = HashMap::new();
        address.insert("zip".to_string(), DataValue::UInt(12345));
        let doc = reify(&model, record(vec![("address", DataValue::Object(address))])).unwrap();
        assert_eq!(doc.get_document("address").unwrap(), &doc! { "zip": 12345i64 });

        let err = reify(&model, record(vec![("address", DataValue::Object(HashMap::new()))]))
            .unwrap_err();
        assert_eq!(err.footprint().keys, vec!["address.zip".to_string()]);
    }

    #[test]
    fn test_untyped_object_keeps_value_kinds() {
        let model = ModelMeta::new("events")
            .field("id", object_id_field())
            .field("meta", dict_field(HashMap::new()));

        let token = uuid::Uuid::new_v4();
        let mut meta = HashMap::new();
        meta.insert("token".to_string(), DataValue::Uuid(token));
        meta.insert("count".to_string(), DataValue::UInt(7));
        let doc = reify(&model, record(vec![("meta", DataValue::Object(meta))])).unwrap();

        let stored = doc.get_document("meta").unwrap();
        assert_eq!(
            stored.get("token"),
            Some(&Bson::Binary(Binary {
                subtype: BinarySubtype::Uuid,
                bytes: token.as_bytes().to_vec(),
            }))
        );
        assert_eq!(stored.get("count"), Some(&Bson::Int64(7)));
    }

    #[test]
    fn test_untyped_object_rejects_unsigned_overflow() {
        let model = ModelMeta::new("events")
            .field("id", object_id_field())
            .field("meta", dict_field(HashMap::new()));

        let mut inner = HashMap::new();
        inner.insert("big".to_string(), DataValue::UInt(u64::MAX));
        let mut meta = HashMap::new();
        meta.insert("nested".to_string(), DataValue::Object(inner));

        let err = reify(&model, record(vec![("meta", DataValue::Object(meta))])).unwrap_err();
        assert_eq!(err.footprint().identity, FootprintIdentity::Validation);
        assert_eq!(err.footprint().keys, vec!["meta.nested.big".to_string()]);
    }

    #[test]
    fn test_json_null_counts_as_missing_value() {
        let model = ModelMeta::new("docs")
            .field("id", object_id_field())
            .field("body", json_field().required())
            .field("extra", json_field());

        let err = reify(
            &model,
            record(vec![("body", DataValue::Json(serde_json::Value::Null))]),
        )
        .unwrap_err();
        assert_eq!(err.footprint().keys, vec!["body".to_string()]);

        let doc = reify(
            &model,
            record(vec![
                ("body", DataValue::Json(serde_json::json!({ "a": 1 }))),
                ("extra", DataValue::Json(serde_json::Value::Null)),
            ]),
        )
        .unwrap();
        assert_eq!(doc.get("extra"), Some(&Bson::Null));
    }
}
