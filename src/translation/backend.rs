use crate::utils::{Result, WordlistError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// What a translation backend handed back, before it is reduced to text.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutput {
    /// A result object carrying its translated text.
    Text(String),
    /// Any other value: plain strings, `{"text": ..}` objects, numbers, null.
    Value(Value),
    Empty,
}

impl TranslationOutput {
    /// Null and empty results yield `None`; anything else is coerced to text.
    pub fn into_text(self) -> Option<String> {
        let text = match self {
            TranslationOutput::Text(text) => text,
            TranslationOutput::Empty | TranslationOutput::Value(Value::Null) => return None,
            TranslationOutput::Value(Value::String(text)) => text,
            TranslationOutput::Value(Value::Object(map)) => {
                let text = map.get("text").and_then(Value::as_str).map(str::to_string);
                match text {
                    Some(text) => text,
                    None => Value::Object(map).to_string(),
                }
            }
            TranslationOutput::Value(other) => other.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl From<String> for TranslationOutput {
    fn from(text: String) -> Self {
        TranslationOutput::Text(text)
    }
}

impl From<&str> for TranslationOutput {
    fn from(text: &str) -> Self {
        TranslationOutput::Text(text.to_string())
    }
}

impl From<Option<String>> for TranslationOutput {
    fn from(text: Option<String>) -> Self {
        text.map_or(TranslationOutput::Empty, TranslationOutput::Text)
    }
}

impl From<Value> for TranslationOutput {
    fn from(value: Value) -> Self {
        TranslationOutput::Value(value)
    }
}

/// Translate one string between two language tags. Implementations may block,
/// defer or suspend; callers only ever await a single outstanding call.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput>;
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for Arc<T> {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput> {
        (**self).translate(text, source_lang, target_lang).await
    }
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for Box<T> {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput> {
        (**self).translate(text, source_lang, target_lang).await
    }
}

/// A synchronous backend. Wrap it in [`BlockingTranslator`] to use it as a [`Translator`].
pub trait BlockingTranslate: Send + Sync + 'static {
    fn translate_blocking(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput>;
}

impl<F> BlockingTranslate for F
where
    F: Fn(&str, &str, &str) -> Result<TranslationOutput> + Send + Sync + 'static,
{
    fn translate_blocking(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput> {
        self(text, source_lang, target_lang)
    }
}

/// Runs a synchronous backend on tokio's blocking pool.
pub struct BlockingTranslator<T> {
    inner: Arc<T>,
}

impl<T: BlockingTranslate> BlockingTranslator<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<F> BlockingTranslator<F>
where
    F: Fn(&str, &str, &str) -> Result<TranslationOutput> + Send + Sync + 'static,
{
    pub fn from_fn(f: F) -> Self {
        Self::new(f)
    }
}

#[async_trait]
impl<T: BlockingTranslate> Translator for BlockingTranslator<T> {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput> {
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        let source_lang = source_lang.to_string();
        let target_lang = target_lang.to_string();

        tokio::task::spawn_blocking(move || {
            inner.translate_blocking(&text, &source_lang, &target_lang)
        })
        .await
        .map_err(|e| WordlistError::TaskFailed(e.to_string()))?
    }
}
