//! 查询诊断模块
//!
//! 执行前适配器总会把查询交给 `DiagnosticSink`，由接收端决定是否输出。
//! 接收端不能让操作失败，`emit` 没有返回值。

use crate::config::DiagnosticsConfig;
use crate::types::{DataValue, NormalizedQuery};
use rat_logger::{debug, info, warn};
use std::collections::BTreeMap;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
}

/// 一条诊断事件
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticEvent<'a> {
    pub level: DiagnosticLevel,
    /// 事件类别，如 "create_record"
    pub category: &'static str,
    pub query: &'a NormalizedQuery,
}

/// 诊断接收端
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: &DiagnosticEvent<'_>);
}

/// 默认接收端：通过 rat_logger 输出
///
/// 只有查询请求了诊断（或配置为总是输出）时才写日志
#[derive(Debug, Clone)]
pub struct LoggerSink {
    always_emit: bool,
    max_depth: usize,
}

impl LoggerSink {
    pub fn new(always_emit: bool, max_depth: usize) -> Self {
        Self {
            always_emit,
            max_depth,
        }
    }

    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self::new(config.always_emit, config.max_depth)
    }
}

impl Default for LoggerSink {
    fn default() -> Self {
        Self::new(false, DiagnosticsConfig::DEFAULT_MAX_DEPTH)
    }
}

impl DiagnosticSink for LoggerSink {
    fn emit(&self, event: &DiagnosticEvent<'_>) {
        if !self.always_emit && !event.query.options.diagnostics_enabled {
            return;
        }
        let rendered = render_query(event.query, self.max_depth);
        match event.level {
            DiagnosticLevel::Debug => debug!("[{}] {}", event.category, rendered),
            DiagnosticLevel::Info => info!("[{}] {}", event.category, rendered),
            DiagnosticLevel::Warn => warn!("[{}] {}", event.category, rendered),
        }
    }
}

/// 不输出任何诊断
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _event: &DiagnosticEvent<'_>) {}
}

/// 渲染查询，嵌套超过 `max_depth` 层的值以占位符代替
pub fn render_query(query: &NormalizedQuery, max_depth: usize) -> String {
    let payload = render_map(
        query.payload.iter().map(|(k, v)| (k.as_str(), v)),
        1,
        max_depth,
    );
    format!(
        "{{ target_collection: \"{}\", payload: {}, options: {{ fetch_after_write: {}, diagnostics_enabled: {} }} }}",
        query.target_collection,
        payload,
        query.options.fetch_after_write,
        query.options.diagnostics_enabled
    )
}

fn render_map<'a>(
    entries: impl Iterator<Item = (&'a str, &'a DataValue)>,
    depth: usize,
    max_depth: usize,
) -> String {
    if depth > max_depth {
        return "[Object]".to_string();
    }
    // 按键排序，保证输出稳定
    let sorted: BTreeMap<&str, &DataValue> = entries.collect();
    if sorted.is_empty() {
        return "{}".to_string();
    }
    let body = sorted
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, render_value(value, depth + 1, max_depth)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {} }}", body)
}

fn render_value(value: &DataValue, depth: usize, max_depth: usize) -> String {
    match value {
        DataValue::Object(map) => render_map(map.iter().map(|(k, v)| (k.as_str(), v)), depth, max_depth),
        DataValue::Array(items) => {
            if depth > max_depth {
                return "[Array]".to_string();
            }
            let body = items
                .iter()
                .map(|item| render_value(item, depth + 1, max_depth))
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{}]", body)
        }
        DataValue::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}
