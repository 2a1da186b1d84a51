//! 配置管理模块
//!
//! 提供CLI参数解析和本地化引擎配置管理功能

// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use clap::Parser;

// 本地模块导入
use crate::api_constants::{api_config, is_valid_api_url, service_config};
use crate::error::Result;

/// 本地化引擎配置结构体
///
/// 所有字段在构造期确定，`validate()`在任何网络调用之前同步校验。
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use batch_localizer::config::LocalizerConfig;
///
/// let config = LocalizerConfig::new("api_key_xxx")
///     .with_api_url("http://localhost:8080")
///     .with_batch_size(50)
///     .with_ideal_batch_item_size(500);
/// ```
#[derive(Debug, Clone)]
pub struct LocalizerConfig {
    /// 提供方API密钥（必填）
    api_key: String,
    /// 提供方API服务地址
    api_url: String,
    /// 批处理大小（每分块最大条目数，1-250）
    batch_size: usize,
    /// 理想分块词数软上限（1-2500）
    ideal_batch_item_size: usize,
}

impl LocalizerConfig {
    /// 创建新的配置实例
    ///
    /// 返回具有默认值的配置实例：
    /// - API地址: 默认提供方端点
    /// - 批处理大小: 25
    /// - 理想分块词数: 250
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_url: api_config::DEFAULT_API_URL.to_string(),
            batch_size: service_config::DEFAULT_BATCH_SIZE,
            ideal_batch_item_size: service_config::DEFAULT_IDEAL_BATCH_ITEM_SIZE,
        }
    }

    /// 获取API密钥
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// 获取API地址
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 获取批处理大小
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 获取理想分块词数
    pub fn ideal_batch_item_size(&self) -> usize {
        self.ideal_batch_item_size
    }

    /// 设置API地址
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// 设置批处理大小
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// 设置理想分块词数软上限
    pub fn with_ideal_batch_item_size(mut self, size: usize) -> Self {
        self.ideal_batch_item_size = size;
        self
    }

    /// 校验配置
    ///
    /// 任何违反约束的字段都会产生配置错误，且发生在任何网络调用之前
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(crate::localizer_error!(config, "api_key", "API密钥不能为空"));
        }

        if !is_valid_api_url(&self.api_url) {
            return Err(crate::localizer_error!(
                config,
                "api_url",
                format!("无效的API地址: {}", self.api_url)
            ));
        }

        if self.batch_size < service_config::MIN_BATCH_SIZE
            || self.batch_size > service_config::MAX_BATCH_SIZE
        {
            return Err(crate::localizer_error!(
                config,
                "batch_size",
                format!(
                    "批处理大小必须在{}到{}之间，当前为{}",
                    service_config::MIN_BATCH_SIZE,
                    service_config::MAX_BATCH_SIZE,
                    self.batch_size
                )
            ));
        }

        if self.ideal_batch_item_size < service_config::MIN_IDEAL_BATCH_ITEM_SIZE
            || self.ideal_batch_item_size > service_config::MAX_IDEAL_BATCH_ITEM_SIZE
        {
            return Err(crate::localizer_error!(
                config,
                "ideal_batch_item_size",
                format!(
                    "理想分块词数必须在{}到{}之间，当前为{}",
                    service_config::MIN_IDEAL_BATCH_ITEM_SIZE,
                    service_config::MAX_IDEAL_BATCH_ITEM_SIZE,
                    self.ideal_batch_item_size
                )
            ));
        }

        Ok(())
    }
}

/// CLI参数结构
#[derive(Parser)]
#[command(author, version, about = "批量HTML本地化CLI工具 - 结构无损编解码与分块批处理", long_about = None)]
pub struct Cli {
    /// 输入HTML文件路径
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// 输出文件路径 (可选，默认为输入文件名+语言代码)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 源语言代码 (如: en；省略则自动检测)
    #[arg(short, long)]
    pub source: Option<String>,

    /// 目标语言代码 (如: zh, es, fr)
    #[arg(short, long, default_value = "zh")]
    pub target: String,

    /// 提供方API密钥
    #[arg(short = 'k', long)]
    pub api_key: String,

    /// 提供方API地址
    #[arg(short, long, default_value = crate::api_constants::api_config::DEFAULT_API_URL)]
    pub api: String,

    /// 批处理大小 (每分块最大条目数)
    #[arg(long, default_value = "25")]
    pub batch_size: usize,

    /// 理想分块词数软上限
    #[arg(long, default_value = "250")]
    pub ideal_batch_item_size: usize,

    /// 快速模式 (以质量换取延迟)
    #[arg(long)]
    pub fast: bool,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocalizerError;

    #[test]
    fn test_default_config_is_valid() {
        let config = LocalizerConfig::new("api_key_xxx");
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size(), 25);
        assert_eq!(config.ideal_batch_item_size(), 250);
        assert_eq!(config.api_url(), api_config::DEFAULT_API_URL);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = LocalizerConfig::new("  ");
        match config.validate() {
            Err(LocalizerError::Configuration { field, .. }) => {
                assert_eq!(field, "api_key");
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_size_bounds() {
        let config = LocalizerConfig::new("key").with_batch_size(0);
        assert!(config.validate().is_err());

        let config = LocalizerConfig::new("key").with_batch_size(251);
        assert!(config.validate().is_err());

        let config = LocalizerConfig::new("key").with_batch_size(250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ideal_batch_item_size_bounds() {
        let config = LocalizerConfig::new("key").with_ideal_batch_item_size(0);
        assert!(config.validate().is_err());

        let config = LocalizerConfig::new("key").with_ideal_batch_item_size(2501);
        assert!(config.validate().is_err());

        let config = LocalizerConfig::new("key").with_ideal_batch_item_size(2500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let config = LocalizerConfig::new("key").with_api_url("not-a-url");
        match config.validate() {
            Err(LocalizerError::Configuration { field, .. }) => {
                assert_eq!(field, "api_url");
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }
}
