/// 本地化API配置常量
///
/// 该文件定义了所有本地化服务相关的常量配置，方便统一管理和维护

/// 默认提供方API配置
pub mod api_config {
    /// 默认本地化提供方地址
    pub const DEFAULT_API_URL: &str = "https://prod.api.lingo.dev";

    /// 本地化端点路径（批量翻译）
    pub const LOCALIZE_ENDPOINT: &str = "/i18n";

    /// 语言识别端点路径
    pub const RECOGNIZE_ENDPOINT: &str = "/recognize";
}

/// 批处理服务配置
pub mod service_config {
    /// 默认批处理大小（每个分块的最大条目数）
    pub const DEFAULT_BATCH_SIZE: usize = 25;

    /// 批处理大小下限
    pub const MIN_BATCH_SIZE: usize = 1;

    /// 批处理大小上限
    pub const MAX_BATCH_SIZE: usize = 250;

    /// 默认理想分块词数（软上限）
    pub const DEFAULT_IDEAL_BATCH_ITEM_SIZE: usize = 250;

    /// 理想分块词数下限
    pub const MIN_IDEAL_BATCH_ITEM_SIZE: usize = 1;

    /// 理想分块词数上限
    pub const MAX_IDEAL_BATCH_ITEM_SIZE: usize = 2500;

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
}

/// 实用工具函数
/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.scheme() == "http" || parsed.scheme() == "https",
        Err(_) => false,
    }
}

/// 拼接提供方端点完整地址
pub fn endpoint_url(api_url: &str, endpoint: &str) -> String {
    format!("{}{}", api_url.trim_end_matches('/'), endpoint)
}
