//! MongoDB适配器核心模块
//!
//! 适配器本身只持有只读的模型目录和几个注入的协作者，可以在任务间共享

use crate::config::AdapterConfig;
use crate::diagnostics::{DiagnosticSink, LoggerSink};
use crate::driver::NativeDriver;
use crate::id_generator::{Clock, DefaultIdGenerator, IdGenerator, SystemClock};
use crate::model::ModelCatalog;
use rat_logger::info;
use std::sync::Arc;

/// MongoDB适配器
pub struct MongoAdapter {
    pub(crate) driver: Arc<dyn NativeDriver>,
    pub(crate) catalog: Arc<ModelCatalog>,
    pub(crate) id_generator: Arc<dyn IdGenerator>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) diagnostics: Arc<dyn DiagnosticSink>,
}

impl MongoAdapter {
    /// 创建适配器构建器
    pub fn builder(driver: Arc<dyn NativeDriver>, catalog: ModelCatalog) -> MongoAdapterBuilder {
        MongoAdapterBuilder::new(driver, catalog)
    }

    /// 使用默认协作者创建适配器
    pub fn new(driver: Arc<dyn NativeDriver>, catalog: ModelCatalog) -> Self {
        Self::builder(driver, catalog).build()
    }

    /// 按配置创建适配器（诊断输出按配置决定）
    pub fn from_config(
        driver: Arc<dyn NativeDriver>,
        catalog: ModelCatalog,
        config: &AdapterConfig,
    ) -> Self {
        Self::builder(driver, catalog)
            .diagnostics(Arc::new(LoggerSink::from_config(&config.diagnostics)))
            .build()
    }

    /// 模型目录
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }
}

/// 适配器构建器
pub struct MongoAdapterBuilder {
    driver: Arc<dyn NativeDriver>,
    catalog: ModelCatalog,
    id_generator: Option<Arc<dyn IdGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl MongoAdapterBuilder {
    pub fn new(driver: Arc<dyn NativeDriver>, catalog: ModelCatalog) -> Self {
        Self {
            driver,
            catalog,
            id_generator: None,
            clock: None,
            diagnostics: None,
        }
    }

    /// 设置 ID 生成器
    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    /// 设置时钟
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 设置诊断接收端
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn build(self) -> MongoAdapter {
        info!("创建MongoDB适配器，已注册 {} 个模型", self.catalog.len());
        MongoAdapter {
            driver: self.driver,
            catalog: Arc::new(self.catalog),
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Arc::new(DefaultIdGenerator::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Arc::new(LoggerSink::default())),
        }
    }
}
