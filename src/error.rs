//! 统一错误处理模块
//!
//! 提供批量本地化引擎的统一错误类型定义和处理机制

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

/// 协作式取消的规范错误消息
///
/// 无论底层传输以何种方式报告中止，对外都统一为这一条消息
pub const CANCELLED_MESSAGE: &str = "请求已中止";

/// 批量本地化引擎统一错误类型
///
/// 定义了引擎中可能出现的所有错误类型，提供统一的错误处理接口。
/// 错误不做内部重试或恢复，直接传播给顶层入口的调用方。
#[derive(Debug)]
pub enum LocalizerError {
    /// 协作式取消（规范化的单一消息）
    Cancelled,

    /// 配置相关错误（同步抛出，发生在任何网络调用之前）
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },

    /// 提供方判定请求无效（等价于HTTP 400）
    InvalidRequest {
        /// 提供方返回的消息
        message: String,
    },

    /// 提供方返回非成功状态或错误响应体
    Provider {
        /// HTTP状态码
        status_code: u16,
        /// 提供方消息或原始响应体
        message: String,
        /// API地址
        api_url: String,
    },

    /// 网络传输相关错误
    Network {
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>,
    },

    /// HTML或JSON结构解析错误
    Parse {
        /// 具体错误信息
        details: String,
    },

    /// 内部处理错误（包装anyhow::Error）
    Internal {
        /// 包装的错误
        source: AnyhowError,
    },
}

impl fmt::Display for LocalizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalizerError::Cancelled => {
                write!(f, "{}", CANCELLED_MESSAGE)
            }
            LocalizerError::Configuration { field, reason } => {
                write!(f, "配置错误 [{}]: {}", field, reason)
            }
            LocalizerError::InvalidRequest { message } => {
                write!(f, "无效请求: {}", message)
            }
            LocalizerError::Provider {
                status_code,
                message,
                api_url,
            } => {
                write!(f, "本地化API错误 [{}] {}: {}", status_code, api_url, message)
            }
            LocalizerError::Network {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "网络请求失败 [{}]: {}", code, message)
                } else {
                    write!(f, "网络请求失败: {}", message)
                }
            }
            LocalizerError::Parse { details } => {
                write!(f, "解析失败: {}", details)
            }
            LocalizerError::Internal { source } => {
                write!(f, "内部处理错误: {}", source)
            }
        }
    }
}

impl std::error::Error for LocalizerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocalizerError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// 批量本地化引擎结果类型别名
pub type Result<T> = std::result::Result<T, LocalizerError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! localizer_error {
    (cancelled) => {
        $crate::error::LocalizerError::Cancelled
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::LocalizerError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
    (invalid_request, $msg:expr) => {
        $crate::error::LocalizerError::InvalidRequest {
            message: $msg.to_string(),
        }
    };
    (provider, $code:expr, $msg:expr, $url:expr) => {
        $crate::error::LocalizerError::Provider {
            status_code: $code,
            message: $msg.to_string(),
            api_url: $url.to_string(),
        }
    };
    (parse, $details:expr) => {
        $crate::error::LocalizerError::Parse {
            details: $details.to_string(),
        }
    };
}

/// 从anyhow::Error转换为LocalizerError
impl From<AnyhowError> for LocalizerError {
    fn from(error: AnyhowError) -> Self {
        LocalizerError::Internal { source: error }
    }
}

/// 从reqwest::Error转换为LocalizerError
impl From<reqwest::Error> for LocalizerError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        LocalizerError::Network {
            message: error.to_string(),
            status_code,
        }
    }
}
