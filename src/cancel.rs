//! 协作式取消模块
//!
//! 提供基于信号的取消令牌。令牌在明确定义的检查点被检查：
//! 顶层调用入口、HTML解析之前、每个分块派发之前、每次提供方请求之前。

// 标准库导入
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{LocalizerError, Result};

/// 协作式取消令牌
///
/// 通过`cancel()`触发取消，通过`is_cancelled()`在检查点查询。
/// `child()`派生的子令牌会观察到父令牌的取消，反向则不会：
/// 取消子令牌不影响父令牌以及其他兄弟令牌。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancelToken>>,
}

impl CancelToken {
    /// 创建一个新的独立令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 触发取消
    ///
    /// 只设置本令牌自身的标志；已派生的子令牌通过父链观察到取消
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// 检查令牌（或其任一祖先）是否已被取消
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }

    /// 派生一个子令牌
    ///
    /// 子令牌观察父令牌的取消；取消子令牌不会传播回父令牌
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// 检查点断言：已取消则返回规范的取消错误
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(LocalizerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// 检查可选令牌的便捷函数
///
/// `None`表示调用方未提供取消信号，视为始终有效
pub fn ensure_active(token: Option<&CancelToken>) -> Result<()> {
    match token {
        Some(token) => token.ensure_active(),
        None => Ok(()),
    }
}
