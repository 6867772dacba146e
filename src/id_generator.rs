//! ID 生成器与时钟
//!
//! 具体化阶段中带随机性或时间相关的默认值都经过这里，
//! 测试时可以注入确定性的实现。

use crate::error::AdapterResult;
use crate::types::{IdStrategy, IdType};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use parking_lot::Mutex;
use rat_logger::debug;
use snowflake::SnowflakeIdGenerator;
use std::collections::HashMap;

/// ID 生成器
pub trait IdGenerator: Send + Sync {
    /// 按策略生成一个新 ID
    fn generate(&self, strategy: &IdStrategy) -> AdapterResult<IdType>;
}

/// 时钟
pub trait Clock: Send + Sync {
    /// 当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// 默认 ID 生成器
///
/// ObjectId 与 UUID 无状态；雪花算法按 (机器ID, 数据中心ID) 缓存生成器实例
pub struct DefaultIdGenerator {
    snowflakes: Mutex<HashMap<(u16, u8), SnowflakeIdGenerator>>,
}

impl DefaultIdGenerator {
    pub fn new() -> Self {
        Self {
            snowflakes: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for DefaultIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for DefaultIdGenerator {
    fn generate(&self, strategy: &IdStrategy) -> AdapterResult<IdType> {
        let id = match strategy {
            IdStrategy::ObjectId => IdType::String(ObjectId::new().to_hex()),
            IdStrategy::Uuid => IdType::String(uuid::Uuid::new_v4().to_string()),
            IdStrategy::Snowflake {
                machine_id,
                datacenter_id,
            } => {
                // snowflake crate 的机器ID和节点ID各占5位
                if *machine_id > 31 || *datacenter_id > 31 {
                    return Err(crate::adapter_error!(
                        config,
                        format!(
                            "雪花算法参数超出范围: machine_id={}, datacenter_id={}（均需在0-31之间）",
                            machine_id, datacenter_id
                        )
                    ));
                }
                let mut snowflakes = self.snowflakes.lock();
                let generator = snowflakes
                    .entry((*machine_id, *datacenter_id))
                    .or_insert_with(|| {
                        SnowflakeIdGenerator::new(*machine_id as i32, *datacenter_id as i32)
                    });
                IdType::Number(generator.real_time_generate())
            }
        };
        debug!("按策略 {:?} 生成ID: {}", strategy, id);
        Ok(id)
    }
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时钟，始终返回同一时间
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
