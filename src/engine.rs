//! 引擎门面模块
//!
//! 公共入口点：对象/单文本/多语言文本/聊天记录/HTML文档/语言识别。
//! 每种内容形态适配到统一的扁平映射契约后交给批处理编排器，结果再
//! 适配回原始形态。

// 标准库导入
use std::collections::HashMap;

// 第三方crate导入
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info};

// 本地模块导入
use crate::cancel::{self, CancelToken};
use crate::chunker::LocalizablePayload;
use crate::config::LocalizerConfig;
use crate::dom_codec::ExtractedDocument;
use crate::error::Result;
use crate::orchestrator::{localize_batches, BatchOptions, ProgressCallback};
use crate::provider::ProviderClient;

/// 单次本地化调用的参数
#[derive(Debug, Clone)]
pub struct LocalizeParams {
    /// 源语言代码；None表示自动检测
    pub source_locale: Option<String>,
    /// 目标语言代码
    pub target_locale: String,
    /// 快速模式：以质量换取延迟
    pub fast: bool,
    /// 参考译文：语言代码到已批准译文载荷的映射，作为提供方上下文
    pub reference: Option<HashMap<String, LocalizablePayload>>,
}

impl LocalizeParams {
    /// 创建指向目标语言的参数（源语言自动检测，非快速模式）
    pub fn new(target_locale: &str) -> Self {
        Self {
            source_locale: None,
            target_locale: target_locale.to_string(),
            fast: false,
            reference: None,
        }
    }

    /// 设置源语言
    pub fn with_source_locale(mut self, locale: &str) -> Self {
        self.source_locale = Some(locale.to_string());
        self
    }

    /// 设置快速模式
    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// 设置参考译文
    pub fn with_reference(mut self, reference: HashMap<String, LocalizablePayload>) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// 聊天记录中的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// 发言者名称（不会发送给提供方）
    pub name: String,
    /// 消息文本
    pub text: String,
}

/// 批量本地化引擎
///
/// 所有状态在构造期确定；每次调用的工作流ID、分块序列和聚合结果都
/// 是该调用的局部量，调用之间不共享可变状态。
#[derive(Debug)]
pub struct Localizer {
    config: LocalizerConfig,
    provider: ProviderClient,
}

impl Localizer {
    /// 创建引擎实例
    ///
    /// 配置校验在此同步完成，任何违反约束的字段都在网络调用之前报错
    pub fn new(config: LocalizerConfig) -> Result<Self> {
        config.validate()?;
        let provider = ProviderClient::new(&config)?;
        Ok(Self { config, provider })
    }

    /// 本地化一个扁平的字符串值映射
    pub async fn localize_object(
        &self,
        payload: &LocalizablePayload,
        params: &LocalizeParams,
        on_progress: Option<ProgressCallback<'_>>,
        cancel_token: Option<&CancelToken>,
    ) -> Result<LocalizablePayload> {
        let options = BatchOptions {
            max_items: self.config.batch_size(),
            ideal_word_size: self.config.ideal_batch_item_size(),
        };
        let provider = &self.provider;

        localize_batches(payload, &options, cancel_token, on_progress, |chunk, workflow_id| {
            async move {
                provider
                    .translate_chunk(
                        params.source_locale.as_deref(),
                        &params.target_locale,
                        &chunk,
                        params.reference.as_ref(),
                        &workflow_id,
                        params.fast,
                        cancel_token,
                    )
                    .await
            }
        })
        .await
    }

    /// 本地化单个文本字符串
    ///
    /// 包装为`{ text }`载荷，结果解包回字符串（缺失时为空字符串）
    pub async fn localize_text(
        &self,
        text: &str,
        params: &LocalizeParams,
        cancel_token: Option<&CancelToken>,
    ) -> Result<String> {
        let mut payload = LocalizablePayload::new();
        payload.insert("text".to_string(), Value::String(text.to_string()));

        let result = self
            .localize_object(&payload, params, None, cancel_token)
            .await?;

        Ok(result
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// 将同一文本并发本地化到多个目标语言
    ///
    /// 每个目标语言一次独立的本地化调用，全部并发发起；每个子调用
    /// 持有从父令牌派生的子令牌，取消父令牌会确定性地取消所有进行
    /// 中的子调用。结果按输入目标语言顺序收集；任何单个失败都使整批
    /// 失败。
    pub async fn batch_localize_text(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locales: &[String],
        fast: bool,
        cancel_token: Option<&CancelToken>,
    ) -> Result<Vec<String>> {
        let child_tokens: Vec<Option<CancelToken>> = target_locales
            .iter()
            .map(|_| cancel_token.map(CancelToken::child))
            .collect();

        info!("多语言文本本地化: {} 个目标语言", target_locales.len());

        let tasks = target_locales.iter().zip(child_tokens.iter()).map(
            |(target_locale, child_token)| {
                let mut params = LocalizeParams::new(target_locale).with_fast(fast);
                if let Some(source) = source_locale {
                    params = params.with_source_locale(source);
                }

                async move { self.localize_text(text, &params, child_token.as_ref()).await }
            },
        );

        join_all(tasks).await.into_iter().collect()
    }

    /// 本地化一段聊天记录
    ///
    /// 每条消息的文本以`chat_<index>`为键参与批处理；发言者名称从不
    /// 发送给提供方，翻译文本按相同索引与原始发言者重新组合
    pub async fn localize_chat(
        &self,
        messages: &[ChatMessage],
        params: &LocalizeParams,
        on_progress: Option<ProgressCallback<'_>>,
        cancel_token: Option<&CancelToken>,
    ) -> Result<Vec<ChatMessage>> {
        let payload = chat_to_payload(messages);
        let translated = self
            .localize_object(&payload, params, on_progress, cancel_token)
            .await?;
        Ok(recombine_chat(messages, &translated))
    }

    /// 本地化一个HTML文档
    ///
    /// 文档被压平为位置路径键控的扁平映射，经过批处理管线后把翻译
    /// 值写回完全相同的DOM位置。返回完整的序列化文档字符串，除翻译
    /// 值和根元素`lang`属性外与输入结构一致。
    pub async fn localize_html(
        &self,
        html: &str,
        params: &LocalizeParams,
        on_progress: Option<ProgressCallback<'_>>,
        cancel_token: Option<&CancelToken>,
    ) -> Result<String> {
        cancel::ensure_active(cancel_token)?;

        let document = ExtractedDocument::parse(html)?;
        let payload = document.extract();
        debug!("从文档提取到 {} 个可本地化条目", payload.len());

        let translated = self
            .localize_object(&payload, params, on_progress, cancel_token)
            .await?;

        document.apply(&translated, &params.target_locale);
        document.serialize()
    }

    /// 识别一段文本的语言代码
    pub async fn recognize_locale(
        &self,
        text: &str,
        cancel_token: Option<&CancelToken>,
    ) -> Result<String> {
        self.provider.recognize_locale(text, cancel_token).await
    }
}

/// 把聊天消息序列适配为扁平载荷（只包含文本，不含发言者）
fn chat_to_payload(messages: &[ChatMessage]) -> LocalizablePayload {
    let mut payload = LocalizablePayload::new();
    for (index, message) in messages.iter().enumerate() {
        payload.insert(
            format!("chat_{}", index),
            Value::String(message.text.clone()),
        );
    }
    payload
}

/// 按索引把翻译文本与原始发言者重新组合
///
/// 提供方结果中缺失的索引解包为空字符串，与单文本路径保持一致
fn recombine_chat(messages: &[ChatMessage], translated: &LocalizablePayload) -> Vec<ChatMessage> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| ChatMessage {
            name: message.name.clone(),
            text: translated
                .get(&format!("chat_{}", index))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}
