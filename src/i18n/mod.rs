//! 多语言错误消息模块
//!
//! 使用rat_embed_lang框架提供统一的错误消息多语言支持

use std::collections::HashMap;
use rat_embed_lang::register_translations;

/// 错误消息翻译注册器
pub struct ErrorMessageI18n;

impl ErrorMessageI18n {
    /// 注册所有错误消息翻译
    pub fn register_all_translations() {
        let mut translations = HashMap::new();

        // 内部一致性错误
        let mut internal_errors = HashMap::new();
        internal_errors.insert("zh-CN".to_string(), "内部一致性错误: 集合 '{collection}' - {message}（通常是适配器或调用方的缺陷）".to_string());
        internal_errors.insert("en-US".to_string(), "Internal consistency error: collection '{collection}' - {message} (this is usually a bug in the adapter or its caller)".to_string());
        internal_errors.insert("ja-JP".to_string(), "内部整合性エラー: コレクション '{collection}' - {message}（通常はアダプターまたは呼び出し側の不具合です）".to_string());
        translations.insert("error.internal_consistency".to_string(), internal_errors);

        // 模型验证错误
        let mut validation_errors = HashMap::new();
        validation_errors.insert("zh-CN".to_string(), "模型验证失败: {field} - {message}".to_string());
        validation_errors.insert("en-US".to_string(), "Model validation failed: {field} - {message}".to_string());
        validation_errors.insert("ja-JP".to_string(), "モデル検証が失敗しました: {field} - {message}".to_string());
        translations.insert("error.validation".to_string(), validation_errors);

        // 唯一约束冲突
        let mut not_unique_errors = HashMap::new();
        not_unique_errors.insert("zh-CN".to_string(), "违反唯一约束，冲突字段: [{fields}]".to_string());
        not_unique_errors.insert("en-US".to_string(), "Uniqueness constraint violated on: [{fields}]".to_string());
        not_unique_errors.insert("ja-JP".to_string(), "一意制約違反、競合フィールド: [{fields}]".to_string());
        translations.insert("error.not_unique".to_string(), not_unique_errors);

        // 数据完整性错误
        let mut integrity_errors = HashMap::new();
        integrity_errors.insert("zh-CN".to_string(), "存储数据无法还原为声明类型: {field} - {message}".to_string());
        integrity_errors.insert("en-US".to_string(), "Stored value does not match its declared type: {field} - {message}".to_string());
        integrity_errors.insert("ja-JP".to_string(), "保存値を宣言型に復元できません: {field} - {message}".to_string());
        translations.insert("error.data_integrity".to_string(), integrity_errors);

        // 通用驱动错误
        let mut generic_errors = HashMap::new();
        generic_errors.insert("zh-CN".to_string(), "数据库操作失败: {message}".to_string());
        generic_errors.insert("en-US".to_string(), "Database operation failed: {message}".to_string());
        generic_errors.insert("ja-JP".to_string(), "データベース操作が失敗しました: {message}".to_string());
        translations.insert("error.generic".to_string(), generic_errors);

        let mut generic_cause_errors = HashMap::new();
        generic_cause_errors.insert("zh-CN".to_string(), "数据库操作失败: {message}（原因: {cause}）".to_string());
        generic_cause_errors.insert("en-US".to_string(), "Database operation failed: {message} (cause: {cause})".to_string());
        generic_cause_errors.insert("ja-JP".to_string(), "データベース操作が失敗しました: {message}（原因: {cause}）".to_string());
        translations.insert("error.generic_with_cause".to_string(), generic_cause_errors);

        // 配置错误
        let mut config_errors = HashMap::new();
        config_errors.insert("zh-CN".to_string(), "配置错误: {message}".to_string());
        config_errors.insert("en-US".to_string(), "Configuration error: {message}".to_string());
        config_errors.insert("ja-JP".to_string(), "設定エラー: {message}".to_string());
        translations.insert("error.config".to_string(), config_errors);

        // 序列化错误
        let mut serialization_errors = HashMap::new();
        serialization_errors.insert("zh-CN".to_string(), "数据序列化失败: {message}".to_string());
        serialization_errors.insert("en-US".to_string(), "Data serialization failed: {message}".to_string());
        serialization_errors.insert("ja-JP".to_string(), "データシリアライズが失敗しました: {message}".to_string());
        translations.insert("error.serialization".to_string(), serialization_errors);

        // IO错误
        let mut io_errors = HashMap::new();
        io_errors.insert("zh-CN".to_string(), "IO错误: {message}".to_string());
        io_errors.insert("en-US".to_string(), "IO error: {message}".to_string());
        io_errors.insert("ja-JP".to_string(), "IOエラー: {message}".to_string());
        translations.insert("error.io".to_string(), io_errors);

        // 注册所有翻译
        register_translations(translations);
    }

    /// 初始化错误消息多语言支持
    pub fn init() {
        Self::register_all_translations();

        // 从环境变量获取语言设置，默认为zh-CN
        let lang = std::env::var("RAT_LANG")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "zh-CN".to_string());

        use rat_embed_lang::normalize_language_code;
        let normalized_lang = normalize_language_code(&lang);
        set_language(&normalized_lang);
    }
}


/// 重新导出rat_embed_lang的核心函数
pub use rat_embed_lang::{t, tf, set_language, current_language};
