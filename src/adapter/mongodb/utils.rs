//! MongoDB工具函数模块
//!
//! 没有字段声明可依据时使用的通用 BSON → DataValue 转换，以及毫秒精度的时间换算

use crate::types::DataValue;
use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, Bson, Document};
use std::collections::HashMap;

/// 将BSON转换为DataValue
///
/// 后端包装类型一律展开：ObjectId → 十六进制字符串，BSON DateTime → 逻辑时间，
/// 其余少见类型（正则、时间戳、Decimal128 等）以扩展 JSON 保留
pub(crate) fn bson_to_data_value(bson: &Bson) -> DataValue {
    match bson {
        Bson::Null | Bson::Undefined => DataValue::Null,
        Bson::Boolean(b) => DataValue::Bool(*b),
        Bson::Int32(i) => DataValue::Int(*i as i64),
        Bson::Int64(i) => DataValue::Int(*i),
        Bson::Double(d) => DataValue::Float(*d),
        Bson::String(s) | Bson::Symbol(s) => DataValue::String(s.clone()),
        Bson::ObjectId(oid) => DataValue::String(oid.to_hex()),
        Bson::DateTime(dt) => match from_bson_datetime(dt) {
            Some(dt) => DataValue::DateTime(dt),
            None => DataValue::Int(dt.timestamp_millis()),
        },
        Bson::Binary(bin) => match binary_to_uuid(bin) {
            Some(uuid) => DataValue::Uuid(uuid),
            None => DataValue::Bytes(bin.bytes.clone()),
        },
        Bson::Array(arr) => DataValue::Array(arr.iter().map(bson_to_data_value).collect()),
        Bson::Document(doc) => DataValue::Object(document_to_data_map(doc)),
        other => DataValue::Json(other.clone().into_relaxed_extjson()),
    }
}

/// 将Document转换为HashMap<String, DataValue>
pub(crate) fn document_to_data_map(doc: &Document) -> HashMap<String, DataValue> {
    doc.iter()
        .map(|(key, value)| (key.clone(), bson_to_data_value(value)))
        .collect()
}

/// 逻辑时间 → BSON DateTime（毫秒精度）
pub(crate) fn to_bson_datetime(dt: &DateTime<Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(dt.timestamp_millis())
}

/// BSON DateTime → 逻辑时间，超出 chrono 可表示范围时返回 None
pub(crate) fn from_bson_datetime(dt: &mongodb::bson::DateTime) -> Option<DateTime<Utc>> {
    millis_to_datetime(dt.timestamp_millis())
}

/// 毫秒时间戳 → 逻辑时间
pub(crate) fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// UUID 子类型的二进制 → Uuid
pub(crate) fn binary_to_uuid(bin: &Binary) -> Option<uuid::Uuid> {
    match bin.subtype {
        BinarySubtype::Uuid | BinarySubtype::UuidOld => uuid::Uuid::from_slice(&bin.bytes).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_object_id_unwraps_to_hex_string() {
        let oid = ObjectId::new();
        assert_eq!(
            bson_to_data_value(&Bson::ObjectId(oid)),
            DataValue::String(oid.to_hex())
        );
    }

    #[test]
    fn test_datetime_conversion_keeps_milliseconds() {
        let dt = millis_to_datetime(1_700_000_000_123).unwrap();
        let bson = Bson::DateTime(to_bson_datetime(&dt));
        assert_eq!(bson_to_data_value(&bson), DataValue::DateTime(dt));
    }

    #[test]
    fn test_nested_document_becomes_object() {
        let doc = mongodb::bson::doc! { "a": { "b": 1i32 }, "c": [true, mongodb::bson::Bson::Null] };
        let map = document_to_data_map(&doc);
        let mut inner = HashMap::new();
        inner.insert("b".to_string(), DataValue::Int(1));
        assert_eq!(map["a"], DataValue::Object(inner));
        assert_eq!(
            map["c"],
            DataValue::Array(vec![DataValue::Bool(true), DataValue::Null])
        );
    }

    #[test]
    fn test_unusual_types_fall_back_to_extended_json() {
        let ts = Bson::Timestamp(mongodb::bson::Timestamp { time: 1, increment: 2 });
        assert!(matches!(bson_to_data_value(&ts), DataValue::Json(_)));
    }

    #[test]
    fn test_uuid_subtype_binary_becomes_uuid() {
        let token = uuid::Uuid::new_v4();
        let bin = Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: token.as_bytes().to_vec(),
        });
        assert_eq!(bson_to_data_value(&bin), DataValue::Uuid(token));

        let generic = Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: token.as_bytes().to_vec(),
        });
        assert_eq!(bson_to_data_value(&generic), DataValue::Bytes(token.as_bytes().to_vec()));
    }
}
