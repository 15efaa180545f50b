pub mod checkpoint;

pub use checkpoint::{scan_output, ResumeCheckpoint};

/// Counters for one run or one recovery pass. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub total_words: usize,
    pub processed: usize,
    pub success: usize,
    pub fail: usize,
    /// Retries consumed, i.e. attempts beyond the first for every word.
    pub retries: usize,
}

impl TranslationStats {
    pub fn new(total_words: usize) -> Self {
        Self {
            total_words,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, attempts: usize) {
        self.processed += 1;
        self.success += 1;
        self.retries += attempts.saturating_sub(1);
    }

    pub fn record_failure(&mut self, attempts: usize) {
        self.processed += 1;
        self.fail += 1;
        self.retries += attempts.saturating_sub(1);
    }

    pub fn progress(&self) -> f32 {
        if self.total_words > 0 {
            self.processed as f32 / self.total_words as f32
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for TranslationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total words: {}, processed: {}, success: {}, fail: {}, retries: {}",
            self.total_words, self.processed, self.success, self.fail, self.retries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_attempts_beyond_the_first() {
        let mut stats = TranslationStats::new(3);
        stats.record_success(1);
        stats.record_success(2);
        stats.record_failure(3);

        assert_eq!(stats.processed, 3);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.fail, 1);
        assert_eq!(stats.retries, 3);
        assert!((stats.progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn progress_of_empty_run_is_zero() {
        assert_eq!(TranslationStats::default().progress(), 0.0);
    }
}
