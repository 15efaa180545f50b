use crate::state::TranslationStats;
use crate::translation::backend::Translator;
use crate::utils::{TranslationDefaults, WordlistError};
use std::time::Duration;
use tracing::{debug, warn};

/// Prefix of the text left in a cell whose translation ran out of attempts.
pub const FAILURE_MARKER: &str = "[translation failed";

/// Backoff between attempts when no pacing delay is configured.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

pub fn failure_placeholder(error: &str) -> String {
    let error = error.replace(['\r', '\n'], " ");
    format!("{}: {}]", FAILURE_MARKER, error)
}

pub fn is_failure_placeholder(cell: &str) -> bool {
    cell.trim().starts_with(FAILURE_MARKER)
}

/// Called once per word, success or failure, after the stats were updated.
pub trait ProgressObserver: Send + Sync {
    fn on_word(
        &self,
        stats: Option<&TranslationStats>,
        word: &str,
        success: bool,
        attempts: usize,
    );
}

impl<F> ProgressObserver for F
where
    F: Fn(Option<&TranslationStats>, &str, bool, usize) + Send + Sync,
{
    fn on_word(
        &self,
        stats: Option<&TranslationStats>,
        word: &str,
        success: bool,
        attempts: usize,
    ) {
        self(stats, word, success, attempts)
    }
}

/// Logs `[processed/total] OK|FAIL word` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_word(
        &self,
        stats: Option<&TranslationStats>,
        word: &str,
        success: bool,
        attempts: usize,
    ) {
        let status = if success { "OK" } else { "FAIL" };
        match stats {
            Some(s) => tracing::info!(
                "[{}/{}] {} {} (attempts: {}, retries_total: {})",
                s.processed,
                s.total_words,
                status,
                word,
                attempts,
                s.retries
            ),
            None => tracing::info!("{} {} (attempts: {})", status, word, attempts),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkOptions {
    pub source_lang: String,
    pub target_lang: String,
    /// Words per pacing unit; 0 behaves as 1.
    pub chunk_size: usize,
    /// Sleep after every chunk, also the retry backoff when non-zero.
    pub pause: Duration,
    pub max_retries: usize,
    /// Spread `pause` across the words of a chunk as well.
    pub word_pacing: bool,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        ChunkOptions::from(&TranslationDefaults::default())
    }
}

impl From<&TranslationDefaults> for ChunkOptions {
    fn from(defaults: &TranslationDefaults) -> Self {
        Self {
            source_lang: defaults.source_lang.clone(),
            target_lang: defaults.target_lang.clone(),
            chunk_size: defaults.chunk_size,
            pause: defaults.pause(),
            max_retries: defaults.max_retries,
            word_pacing: defaults.word_pacing,
        }
    }
}

impl ChunkOptions {
    pub fn backoff(&self) -> Duration {
        if self.pause.is_zero() {
            DEFAULT_BACKOFF
        } else {
            self.pause
        }
    }

    fn word_pause(&self) -> Duration {
        if !self.word_pacing {
            return Duration::ZERO;
        }
        let chunk_size = u32::try_from(self.chunk_size.max(1)).unwrap_or(u32::MAX);
        self.pause / chunk_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOutcome {
    /// The translation, or a failure placeholder.
    pub text: String,
    pub success: bool,
    pub attempts: usize,
}

/// One-call-at-a-time translator with retry, backoff and pacing.
pub struct ChunkedTranslator<'a, T: Translator + ?Sized> {
    translator: &'a T,
    options: ChunkOptions,
}

impl<'a, T: Translator + ?Sized> ChunkedTranslator<'a, T> {
    pub fn new(translator: &'a T, options: ChunkOptions) -> Self {
        Self {
            translator,
            options,
        }
    }

    /// Translates `words` in order, one output per input. Never fails: words
    /// that exhaust their attempts come back as failure placeholders.
    pub async fn translate_words(
        &self,
        words: &[String],
        mut stats: Option<&mut TranslationStats>,
        observer: Option<&dyn ProgressObserver>,
    ) -> Vec<String> {
        let chunk_size = self.options.chunk_size.max(1);
        let word_pause = self.options.word_pause();
        let mut translated = Vec::with_capacity(words.len());

        for chunk in words.chunks(chunk_size) {
            for (i, word) in chunk.iter().enumerate() {
                if i > 0 && !word_pause.is_zero() {
                    tokio::time::sleep(word_pause).await;
                }

                let outcome = self.translate_word(word).await;

                if let Some(stats) = stats.as_deref_mut() {
                    if outcome.success {
                        stats.record_success(outcome.attempts);
                    } else {
                        stats.record_failure(outcome.attempts);
                    }
                }
                if let Some(observer) = observer {
                    observer.on_word(stats.as_deref(), word, outcome.success, outcome.attempts);
                }

                translated.push(outcome.text);
            }

            if !self.options.pause.is_zero() {
                tokio::time::sleep(self.options.pause).await;
            }
        }

        translated
    }

    /// Single text with the same retry policy but no pacing; blank text is returned as is.
    pub async fn translate_text(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        self.translate_word(text).await.text
    }

    pub async fn translate_word(&self, word: &str) -> WordOutcome {
        let max_attempts = self.options.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let result = self
                .translator
                .translate(word, &self.options.source_lang, &self.options.target_lang)
                .await
                .and_then(|output| output.into_text().ok_or(WordlistError::EmptyTranslation));

            match result {
                Ok(text) => {
                    return WordOutcome {
                        text,
                        success: true,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    debug!(word = word, attempt = attempt, error = %e, "Translation attempt failed");
                    last_error = Some(e);

                    if attempt < max_attempts {
                        tokio::time::sleep(self.options.backoff()).await;
                    }
                }
            }
        }

        let error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        warn!(word = word, attempts = max_attempts, error = %error, "Giving up on word");

        WordOutcome {
            text: failure_placeholder(&error),
            success: false,
            attempts: max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_recognized_and_single_line() {
        let placeholder = failure_placeholder("API returned 429:\nslow down");
        assert_eq!(placeholder, "[translation failed: API returned 429: slow down]");
        assert!(is_failure_placeholder(&placeholder));
        assert!(is_failure_placeholder("  [translation failed: boom]"));
        assert!(!is_failure_placeholder("猫"));
        assert!(!is_failure_placeholder(""));
    }

    #[test]
    fn backoff_falls_back_when_pacing_disabled() {
        let options = ChunkOptions {
            pause: Duration::ZERO,
            ..ChunkOptions::default()
        };
        assert_eq!(options.backoff(), DEFAULT_BACKOFF);

        let options = ChunkOptions {
            pause: Duration::from_millis(750),
            ..ChunkOptions::default()
        };
        assert_eq!(options.backoff(), Duration::from_millis(750));
    }

    #[test]
    fn word_pause_splits_the_chunk_pause() {
        let options = ChunkOptions {
            pause: Duration::from_millis(500),
            chunk_size: 10,
            word_pacing: true,
            ..ChunkOptions::default()
        };
        assert_eq!(options.word_pause(), Duration::from_millis(50));

        let options = ChunkOptions {
            word_pacing: false,
            ..options
        };
        assert_eq!(options.word_pause(), Duration::ZERO);
    }

    #[test]
    fn defaults_follow_translation_config() {
        let options = ChunkOptions::default();
        assert_eq!(options.source_lang, "en");
        assert_eq!(options.target_lang, "zh-cn");
        assert_eq!(options.chunk_size, 10);
        assert_eq!(options.pause, Duration::from_millis(500));
        assert_eq!(options.max_retries, 2);
    }
}
