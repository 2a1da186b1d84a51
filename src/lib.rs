//! Batch Localizer - 批量结构化内容本地化引擎库
//!
//! 这个库提供了载荷分块、批处理编排、HTML结构编解码、提供方客户端
//! 和协作式取消等核心功能。

pub mod api_constants;
pub mod cancel;
pub mod chunker;
pub mod config;
pub mod dom_codec;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod utils;

pub use cancel::CancelToken;
pub use chunker::LocalizablePayload;
pub use config::LocalizerConfig;
pub use engine::{ChatMessage, LocalizeParams, Localizer};
pub use error::{LocalizerError, Result};
pub use orchestrator::LocalizeProgress;
