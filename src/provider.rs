//! 提供方客户端模块
//!
//! 负责两种远程调用（批量本地化、语言识别），并把提供方的各种错误
//! 形态归一化为统一错误类型。失败不做重试，直接传播给调用方。

// 标准库导入
use std::collections::HashMap;
use std::time::Duration;

// 第三方crate导入
use anyhow::Context;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

// 本地模块导入
use crate::api_constants::{api_config, endpoint_url, service_config};
use crate::cancel::{self, CancelToken};
use crate::chunker::LocalizablePayload;
use crate::config::LocalizerConfig;
use crate::error::Result;

/// 远程本地化提供方客户端
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl ProviderClient {
    /// 从配置创建客户端
    pub fn new(config: &LocalizerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(service_config::REQUEST_TIMEOUT_SECONDS))
            .build()
            .context("创建HTTP客户端失败")?;

        Ok(Self {
            client,
            api_key: config.api_key().to_string(),
            api_url: config.api_url().to_string(),
        })
    }

    /// 发送一个分块的本地化请求
    ///
    /// 每个分块一个同步请求；`workflow_id`在同一顶层调用的所有分块
    /// 请求中原样复用。`source_locale`为None表示自动检测。
    #[allow(clippy::too_many_arguments)]
    pub async fn translate_chunk(
        &self,
        source_locale: Option<&str>,
        target_locale: &str,
        data: &LocalizablePayload,
        reference: Option<&HashMap<String, LocalizablePayload>>,
        workflow_id: &str,
        fast: bool,
        cancel_token: Option<&CancelToken>,
    ) -> Result<LocalizablePayload> {
        cancel::ensure_active(cancel_token)?;

        let url = endpoint_url(&self.api_url, api_config::LOCALIZE_ENDPOINT);
        let body = json!({
            "params": { "workflowId": workflow_id, "fast": fast },
            "locale": { "source": source_locale, "target": target_locale },
            "data": data,
            "reference": reference,
        });

        debug!("派发分块: {} 个条目 -> {}", data.len(), target_locale);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let response_text = response.text().await?;

        // 请求期间触发的取消同样归一化为规范的取消错误
        cancel::ensure_active(cancel_token)?;

        parse_localize_response(status, &response_text, &self.api_url)
    }

    /// 识别一段文本的语言代码
    pub async fn recognize_locale(
        &self,
        text: &str,
        cancel_token: Option<&CancelToken>,
    ) -> Result<String> {
        cancel::ensure_active(cancel_token)?;

        let url = endpoint_url(&self.api_url, api_config::RECOGNIZE_ENDPOINT);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let response_text = response.text().await?;

        cancel::ensure_active(cancel_token)?;

        parse_recognize_response(status, &response_text, &self.api_url)
    }
}

/// 解析本地化端点的响应
///
/// HTTP 400视为无效请求；其他非成功状态把原始响应体作为错误消息；
/// 成功但缺少`data`字段且带有`error`字段时，以该错误消息失败；
/// 其余情况返回`data`（缺失时为空映射）。
pub fn parse_localize_response(
    status: u16,
    body: &str,
    api_url: &str,
) -> Result<LocalizablePayload> {
    if status == 400 {
        let message = error_field(body).unwrap_or_else(|| body.to_string());
        return Err(crate::localizer_error!(invalid_request, message));
    }

    if !(200..300).contains(&status) {
        return Err(crate::localizer_error!(provider, status, body, api_url));
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| crate::localizer_error!(parse, format!("提供方响应不是有效JSON: {}", e)))?;

    match parsed.get("data") {
        Some(Value::Object(data)) => Ok(data.clone()),
        _ => {
            if let Some(error) = parsed.get("error").and_then(Value::as_str) {
                Err(crate::localizer_error!(provider, status, error, api_url))
            } else {
                Ok(LocalizablePayload::new())
            }
        }
    }
}

/// 解析语言识别端点的响应
pub fn parse_recognize_response(status: u16, body: &str, api_url: &str) -> Result<String> {
    if !(200..300).contains(&status) {
        return Err(crate::localizer_error!(provider, status, body, api_url));
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| crate::localizer_error!(parse, format!("提供方响应不是有效JSON: {}", e)))?;

    parsed
        .get("locale")
        .and_then(Value::as_str)
        .map(|locale| locale.to_string())
        .ok_or_else(|| crate::localizer_error!(parse, "提供方响应缺少locale字段"))
}

/// 从响应体中提取error字段（如果响应体是JSON对象）
fn error_field(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")
        .and_then(Value::as_str)
        .map(|message| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocalizerError;

    const API_URL: &str = "https://prod.api.lingo.dev";

    #[test]
    fn test_success_with_data() {
        let result =
            parse_localize_response(200, r#"{"data":{"text":"hola"}}"#, API_URL).unwrap();
        assert_eq!(result["text"], "hola");
    }

    #[test]
    fn test_success_without_data_is_empty() {
        let result = parse_localize_response(200, r#"{}"#, API_URL).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_success_with_error_field_surfaces_provider_error() {
        let result = parse_localize_response(200, r#"{"error":"rate limited"}"#, API_URL);
        match result {
            Err(LocalizerError::Provider { message, .. }) => {
                assert_eq!(message, "rate limited");
            }
            other => panic!("Expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_http_400_is_invalid_request() {
        let result = parse_localize_response(400, r#"{"error":"bad locale"}"#, API_URL);
        match result {
            Err(LocalizerError::InvalidRequest { message }) => {
                assert_eq!(message, "bad locale");
            }
            other => panic!("Expected invalid request, got {:?}", other),
        }
    }

    #[test]
    fn test_non_success_surfaces_raw_body() {
        let result = parse_localize_response(502, "upstream exploded", API_URL);
        match result {
            Err(LocalizerError::Provider {
                status_code,
                message,
                ..
            }) => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("Expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_recognize_response_parsing() {
        assert_eq!(
            parse_recognize_response(200, r#"{"locale":"es"}"#, API_URL).unwrap(),
            "es"
        );
        assert!(parse_recognize_response(500, "boom", API_URL).is_err());
        assert!(parse_recognize_response(200, r#"{}"#, API_URL).is_err());
    }
}
