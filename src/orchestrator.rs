//! 批处理编排模块
//!
//! 驱动分块序列严格按顺序经过远程提供方，聚合结果、报告进度、
//! 遵守协作式取消。顺序执行保证进度单调，并限制单次调用对提供方
//! 的并发压力。

// 标准库导入
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

// 第三方crate导入
use chrono::Utc;
use tracing::debug;

// 本地模块导入
use crate::cancel::{self, CancelToken};
use crate::chunker::{chunk_payload, LocalizablePayload};
use crate::error::Result;

/// 分块尺寸参数
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// 每分块最大条目数
    pub max_items: usize,
    /// 理想分块词数软上限
    pub ideal_word_size: usize,
}

/// 单个分块完成后的进度事件
#[derive(Debug, Clone)]
pub struct LocalizeProgress {
    /// 完成百分比：round(100 * 已完成分块数 / 总分块数)
    pub percent: u32,
    /// 该分块的源子载荷
    pub source: LocalizablePayload,
    /// 该分块的翻译结果子载荷
    pub translated: LocalizablePayload,
}

/// 进度回调类型
pub type ProgressCallback<'a> = &'a mut dyn FnMut(LocalizeProgress);

/// 铸造一个工作流ID
///
/// 每个顶层本地化调用铸造一次，随后原样传给该调用的每个分块请求，
/// 供提供方关联/限流一个多请求作业
pub fn mint_workflow_id() -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("wf_{:x}_{:x}", nanos, seq)
}

/// 将载荷分块后严格按顺序派发，聚合所有分块的结果
///
/// `dispatch`接收(分块, 工作流ID)并返回翻译后的映射；引擎把它接到
/// 提供方客户端上，测试可以接到计数器上。取消在调用开始和每个分块
/// 派发之前检查；一旦触发，不再派发后续分块，立即返回取消错误，
/// 丢弃尚未聚合的结果。
pub async fn localize_batches<F, Fut>(
    payload: &LocalizablePayload,
    options: &BatchOptions,
    cancel_token: Option<&CancelToken>,
    mut on_progress: Option<ProgressCallback<'_>>,
    mut dispatch: F,
) -> Result<LocalizablePayload>
where
    F: FnMut(LocalizablePayload, String) -> Fut,
    Fut: Future<Output = Result<LocalizablePayload>>,
{
    cancel::ensure_active(cancel_token)?;

    let chunks = chunk_payload(payload, options.max_items, options.ideal_word_size);
    let total = chunks.len();
    let workflow_id = mint_workflow_id();

    debug!("工作流 {}: {} 个条目分成 {} 个分块", workflow_id, payload.len(), total);

    let mut aggregate = LocalizablePayload::new();
    for (index, chunk) in chunks.into_iter().enumerate() {
        cancel::ensure_active(cancel_token)?;

        let translated = dispatch(chunk.clone(), workflow_id.clone()).await?;

        if let Some(callback) = on_progress.as_mut() {
            let percent = ((index + 1) as f64 * 100.0 / total as f64).round() as u32;
            callback(LocalizeProgress {
                percent,
                source: chunk,
                translated: translated.clone(),
            });
        }

        // 分块键集按构造两两不相交；若该不变量被破坏则后写覆盖先写
        for (key, value) in translated {
            aggregate.insert(key, value);
        }
    }

    Ok(aggregate)
}
