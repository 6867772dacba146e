//! MongoDB 原生驱动
//!
//! 包装 `mongodb::Database`，并把驱动错误转换为带结构化信息的 `NativeError`

use super::{InsertAck, NativeDriver, NativeError, NativeErrorKind, NativeResult};
use crate::config::AdapterConfig;
use crate::error::AdapterResult;
use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Collection, Database};
use rat_logger::{debug, info};

/// MongoDB 驱动
#[derive(Clone, Debug)]
pub struct MongoDriver {
    db: Database,
}

impl MongoDriver {
    /// 使用已有的数据库句柄
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 按配置连接
    pub async fn connect(config: &AdapterConfig) -> AdapterResult<Self> {
        let client = Client::with_uri_str(&config.uri).await.map_err(|e| {
            crate::adapter_error!(config, format!("MongoDB连接失败: {}", e))
        })?;
        info!("MongoDB客户端已创建，数据库: {}", config.database);
        Ok(Self::new(client.database(&config.database)))
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

#[async_trait]
impl NativeDriver for MongoDriver {
    async fn insert_one(&self, collection: &str, document: Document) -> NativeResult<InsertAck> {
        debug!("执行MongoDB插入到集合 {}: {:?}", collection, document);
        let result = self
            .collection(collection)
            .insert_one(document, None)
            .await
            .map_err(NativeError::from)?;
        Ok(InsertAck {
            inserted_id: result.inserted_id,
        })
    }

    async fn find_one_by_id(&self, collection: &str, id: &Bson) -> NativeResult<Option<Document>> {
        debug!("执行MongoDB回读: 集合={}, _id={}", collection, id);
        self.collection(collection)
            .find_one(doc! { "_id": id.clone() }, None)
            .await
            .map_err(NativeError::from)
    }
}

impl From<mongodb::error::Error> for NativeError {
    fn from(e: mongodb::error::Error) -> Self {
        let message = e.to_string();
        match &*e.kind {
            ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
                let mut native = NativeError::write(write_error.code, write_error.message.clone());
                if let Some(code_name) = &write_error.code_name {
                    native = native.with_code_name(code_name.clone());
                }
                with_error_details(native, write_error.details.as_ref())
            }
            ErrorKind::Write(WriteFailure::WriteConcernError(concern_error)) => {
                NativeError::write(concern_error.code, concern_error.message.clone())
                    .with_code_name(concern_error.code_name.clone())
            }
            ErrorKind::BulkWrite(failure) => {
                match failure.write_errors.as_ref().and_then(|errors| errors.first()) {
                    Some(write_error) => {
                        let mut native =
                            NativeError::write(write_error.code, write_error.message.clone());
                        if let Some(code_name) = &write_error.code_name {
                            native = native.with_code_name(code_name.clone());
                        }
                        with_error_details(native, write_error.details.as_ref())
                    }
                    None => NativeError::new(NativeErrorKind::Write, message),
                }
            }
            ErrorKind::Command(command_error) => {
                NativeError::command(command_error.code, command_error.message.clone())
                    .with_code_name(command_error.code_name.clone())
            }
            ErrorKind::Io(io_error) if io_error.kind() == std::io::ErrorKind::TimedOut => {
                NativeError::timeout(message)
            }
            ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::DnsResolve { .. } => {
                NativeError::network(message)
            }
            ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
                NativeError::new(NativeErrorKind::Serialization, message)
            }
            _ => NativeError::new(NativeErrorKind::Other, message),
        }
    }
}

/// 从 errInfo 中提取键模式/键值（部分服务器版本会提供）
///
/// 驱动不保留写错误顶层的 keyPattern，取不到时由错误归一化按索引名解析
fn with_error_details(mut native: NativeError, details: Option<&Document>) -> NativeError {
    if let Some(details) = details {
        if let Ok(key_pattern) = details.get_document("keyPattern") {
            native = native.with_key_pattern(key_pattern.clone());
        }
        if let Ok(key_value) = details.get_document("keyValue") {
            native = native.with_key_value(key_value.clone());
        }
    }
    native
}
