use crate::translation::backend::{TranslationOutput, Translator};
use crate::utils::{ApiConfig, Result, WordlistError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Google's public web translation endpoint (`client=gtx`), one text per request.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn call_api(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let sl = google_lang_code(source_lang);
        let tl = google_lang_code(target_lang);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", sl.as_str()),
                ("tl", tl.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WordlistError::ApiError(format!(
                "API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput> {
        let body = self.call_api(text, source_lang, target_lang).await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(parse_segments(&value).into())
    }
}

/// The response looks like `[[["猫","cat",null,null,10], ...], null, "en", ...]`;
/// long inputs come back split into several segments.
pub fn parse_segments(value: &Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Tags like `zh-cn` are accepted case-insensitively but the endpoint wants `zh-CN`.
pub fn google_lang_code(tag: &str) -> String {
    match tag.split_once(['-', '_']) {
        Some((lang, region)) => format!("{}-{}", lang.to_lowercase(), region.to_uppercase()),
        None => tag.to_lowercase(),
    }
}
