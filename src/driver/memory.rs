//! 进程内模拟文档库
//!
//! 按 MongoDB 的语义模拟插入与按 _id 读取：
//! - 缺少 _id 时由“服务端”生成 ObjectId
//! - `_id_` 与声明的唯一索引在同一把集合锁内检查，冲突时返回 11000 错误
//! - 支持服务端默认值、故障注入、回读延迟和调用计数

use super::{InsertAck, NativeDriver, NativeError, NativeResult};
use crate::model::ModelMeta;
use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use parking_lot::Mutex;
use rat_logger::debug;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 重复键错误码
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Clone)]
struct UniqueIndex {
    name: String,
    keys: Vec<String>,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Document>,
    unique_indexes: Vec<UniqueIndex>,
    server_defaults: Document,
}

impl MemoryCollection {
    /// 查找与新文档冲突的唯一索引（含 _id_）
    fn find_conflict(&self, document: &Document) -> Option<(UniqueIndex, Document)> {
        let id_index = UniqueIndex {
            name: "_id_".to_string(),
            keys: vec!["_id".to_string()],
        };
        std::iter::once(&id_index)
            .chain(self.unique_indexes.iter())
            .find_map(|index| {
                let key_value = index_key(index, document);
                let conflict = self
                    .documents
                    .iter()
                    .any(|existing| index_key(index, existing) == key_value);
                conflict.then(|| (index.clone(), key_value))
            })
    }
}

/// 取文档在索引上的键值，缺失字段按 null 计
fn index_key(index: &UniqueIndex, document: &Document) -> Document {
    let mut key = Document::new();
    for field in &index.keys {
        key.insert(field.clone(), document.get(field).cloned().unwrap_or(Bson::Null));
    }
    key
}

/// 内存驱动
pub struct MemoryDriver {
    database: String,
    collections: DashMap<String, Arc<Mutex<MemoryCollection>>>,
    insert_calls: AtomicUsize,
    find_calls: AtomicUsize,
    insert_failures: Mutex<VecDeque<NativeError>>,
    find_failures: Mutex<VecDeque<NativeError>>,
    find_delay: Mutex<Option<Duration>>,
}

impl MemoryDriver {
    /// 创建空的内存库
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            collections: DashMap::new(),
            insert_calls: AtomicUsize::new(0),
            find_calls: AtomicUsize::new(0),
            insert_failures: Mutex::new(VecDeque::new()),
            find_failures: Mutex::new(VecDeque::new()),
            find_delay: Mutex::new(None),
        }
    }

    fn collection(&self, name: &str) -> Arc<Mutex<MemoryCollection>> {
        Arc::clone(
            self.collections
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(MemoryCollection::default())))
                .value(),
        )
    }

    /// 创建唯一索引
    pub fn create_unique_index(&self, collection: &str, name: &str, keys: &[&str]) {
        let collection = self.collection(collection);
        let mut collection = collection.lock();
        collection.unique_indexes.retain(|index| index.name != name);
        collection.unique_indexes.push(UniqueIndex {
            name: name.to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        });
    }

    /// 按模型声明创建唯一索引
    pub fn ensure_model_indexes(&self, model: &ModelMeta) {
        for (name, fields) in model.unique_indexes() {
            let keys: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
            self.create_unique_index(&model.collection_name, &name, &keys);
        }
    }

    /// 设置服务端默认值（插入时文档缺少该字段则补上）
    pub fn set_server_default(&self, collection: &str, field: &str, value: Bson) {
        let collection = self.collection(collection);
        collection.lock().server_defaults.insert(field, value);
    }

    /// 让下一次插入失败
    pub fn fail_next_insert(&self, error: NativeError) {
        self.insert_failures.lock().push_back(error);
    }

    /// 让下一次回读失败
    pub fn fail_next_find(&self, error: NativeError) {
        self.find_failures.lock().push_back(error);
    }

    /// 设置回读延迟
    pub fn set_find_delay(&self, delay: Option<Duration>) {
        *self.find_delay.lock() = delay;
    }

    /// 删除文档（模拟并发删除）
    pub fn remove_by_id(&self, collection: &str, id: &Bson) -> bool {
        let collection = self.collection(collection);
        let mut collection = collection.lock();
        let before = collection.documents.len();
        collection.documents.retain(|doc| doc.get("_id") != Some(id));
        collection.documents.len() != before
    }

    /// 集合中的所有文档
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collection(collection).lock().documents.clone()
    }

    /// 插入调用次数
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// 回读调用次数
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// 原生调用总次数
    pub fn total_calls(&self) -> usize {
        self.insert_calls() + self.find_calls()
    }
}

#[async_trait]
impl NativeDriver for MemoryDriver {
    async fn insert_one(&self, collection_name: &str, mut document: Document) -> NativeResult<InsertAck> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.insert_failures.lock().pop_front() {
            return Err(error);
        }

        let collection = self.collection(collection_name);
        let mut collection = collection.lock();

        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        for (field, value) in collection.server_defaults.iter() {
            if !document.contains_key(field) {
                document.insert(field.clone(), value.clone());
            }
        }

        if let Some((index, key_value)) = collection.find_conflict(&document) {
            let mut key_pattern = Document::new();
            for key in &index.keys {
                key_pattern.insert(key.clone(), 1i32);
            }
            debug!("内存库唯一索引冲突: 集合={}, 索引={}", collection_name, index.name);
            return Err(NativeError::write(
                DUPLICATE_KEY_CODE,
                format!(
                    "E11000 duplicate key error collection: {}.{} index: {} dup key: {}",
                    self.database, collection_name, index.name, key_value
                ),
            )
            .with_code_name("DuplicateKey")
            .with_key_pattern(key_pattern)
            .with_key_value(key_value));
        }

        let inserted_id = document.get("_id").cloned().unwrap_or(Bson::Null);
        collection.documents.push(document);
        Ok(InsertAck { inserted_id })
    }

    async fn find_one_by_id(&self, collection_name: &str, id: &Bson) -> NativeResult<Option<Document>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.find_failures.lock().pop_front() {
            return Err(error);
        }

        let delay = *self.find_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let collection = self.collection(collection_name);
        let collection = collection.lock();
        Ok(collection
            .documents
            .iter()
            .find(|doc| doc.get("_id") == Some(id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_insert_assigns_object_id_when_missing() {
        let driver = MemoryDriver::new("test");
        let ack = driver.insert_one("users", doc! { "name": "a" }).await.unwrap();
        assert!(matches!(ack.inserted_id, Bson::ObjectId(_)));
        let stored = driver.find_one_by_id("users", &ack.inserted_id).await.unwrap();
        assert_eq!(stored.unwrap().get_str("name").unwrap(), "a");
        assert_eq!(driver.insert_calls(), 1);
        assert_eq!(driver.find_calls(), 1);
    }

    #[tokio::test]
    async fn test_unique_index_violation_reports_key_pattern() {
        let driver = MemoryDriver::new("test");
        driver.create_unique_index("users", "email_1", &["email"]);
        driver.insert_one("users", doc! { "email": "x@y.z" }).await.unwrap();

        let err = driver
            .insert_one("users", doc! { "email": "x@y.z" })
            .await
            .unwrap_err();
        assert_eq!(err.code, Some(DUPLICATE_KEY_CODE));
        assert_eq!(err.key_pattern, Some(doc! { "email": 1i32 }));
        assert!(err.message.contains("index: email_1"));
        assert_eq!(driver.documents("users").len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let driver = MemoryDriver::new("test");
        driver.insert_one("users", doc! { "_id": "k" }).await.unwrap();
        let err = driver.insert_one("users", doc! { "_id": "k" }).await.unwrap_err();
        assert_eq!(err.key_pattern, Some(doc! { "_id": 1i32 }));
    }

    #[test]
    fn test_find_on_unknown_collection_returns_none() {
        let driver = MemoryDriver::new("test");
        let found = tokio_test::block_on(driver.find_one_by_id("nothing", &Bson::Int32(1))).unwrap();
        assert!(found.is_none());
        assert_eq!(driver.insert_calls(), 0);
        assert_eq!(driver.find_calls(), 1);
    }

    #[tokio::test]
    async fn test_server_defaults_and_injected_failures() {
        let driver = MemoryDriver::new("test");
        driver.set_server_default("users", "status", Bson::String("new".to_string()));
        driver.fail_next_insert(NativeError::timeout("slow"));

        assert!(driver.insert_one("users", doc! {}).await.is_err());
        let ack = driver.insert_one("users", doc! {}).await.unwrap();
        let stored = driver.find_one_by_id("users", &ack.inserted_id).await.unwrap().unwrap();
        assert_eq!(stored.get_str("status").unwrap(), "new");
        assert!(driver.remove_by_id("users", &ack.inserted_id));
        assert!(driver.documents("users").is_empty());
    }
}
