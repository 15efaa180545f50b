pub mod backend;
pub mod chunked;
pub mod client;
pub mod recovery;

pub use backend::{BlockingTranslate, BlockingTranslator, TranslationOutput, Translator};
pub use chunked::{
    failure_placeholder, is_failure_placeholder, ChunkOptions, ChunkedTranslator, LogProgress,
    ProgressObserver, WordOutcome, DEFAULT_BACKOFF, FAILURE_MARKER,
};
pub use client::GoogleTranslator;
pub use recovery::{recover_failures, RecoveryOptions};

use crate::csv_processor::{BilingualWriter, RecordBatch, WordlistReader};
use crate::state::{scan_output, ResumeCheckpoint, TranslationStats};
use crate::utils::{AppConfig, OutputLayout, Result, WordlistError};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_path: String,
    pub output_path: String,
    /// Stop after this many data rows of the source.
    pub limit: Option<usize>,
    /// Continue a partial output instead of overwriting it.
    pub resume: bool,
    pub chunk: ChunkOptions,
    pub layout: OutputLayout,
}

impl RunOptions {
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            limit: None,
            resume: false,
            chunk: ChunkOptions::default(),
            layout: OutputLayout::default(),
        }
    }

    pub fn from_config(
        input_path: impl Into<String>,
        output_path: impl Into<String>,
        config: &AppConfig,
    ) -> Self {
        Self {
            chunk: ChunkOptions::from(&config.translation),
            layout: config.output.clone(),
            ..Self::new(input_path, output_path)
        }
    }
}

/// Word-column width and committed length to append with.
///
/// Once pairs are committed the existing header fixes the width: remaining
/// records are padded to it, and a record wider than it is rejected. A file
/// holding only a header is rewritten with the width of this batch.
fn resume_layout(
    checkpoint: &ResumeCheckpoint,
    batch: &RecordBatch,
    output_path: &str,
) -> Result<(usize, u64)> {
    if checkpoint.pairs == 0 {
        return Ok((batch.max_words, 0));
    }

    let existing = checkpoint.header_width.saturating_sub(2);
    let needed = batch
        .records
        .iter()
        .map(|r| r.words.len())
        .max()
        .unwrap_or_default();

    if needed > existing {
        return Err(WordlistError::InvalidHeader {
            path: output_path.to_string(),
            reason: format!(
                "{} word columns but the remaining records need {}, rerun without resume",
                existing, needed
            ),
        });
    }
    if existing != batch.max_words {
        tracing::warn!(
            existing = existing,
            source = batch.max_words,
            "Output header width differs from the source, padding to the existing header"
        );
    }

    Ok((existing, checkpoint.committed_len))
}

/// Translates every source record into a translated/original row pair.
///
/// The source is read in full before the output is touched. With `resume`,
/// records whose title already has a complete pair in the output are skipped
/// and new pairs are appended after the last complete one; an output whose
/// header has no title column is rejected untouched. Every pair is
/// flushed as soon as it is written, so the output is always a valid resume
/// point.
pub async fn process_file<T: Translator + ?Sized>(
    options: &RunOptions,
    translator: &T,
    observer: Option<&dyn ProgressObserver>,
) -> Result<TranslationStats> {
    let mut batch = WordlistReader::new(options.input_path.as_str())
        .with_limit(options.limit)
        .read_records()?;

    if batch.is_empty() {
        tracing::info!(input = %options.input_path, "No records to translate");
        return Ok(TranslationStats::default());
    }

    let checkpoint = if options.resume {
        scan_output(&options.output_path, &options.layout.title_label)?
    } else {
        ResumeCheckpoint::default()
    };

    if checkpoint.header_present && !checkpoint.header_recognized {
        return Err(WordlistError::InvalidHeader {
            path: options.output_path.clone(),
            reason: format!(
                "no '{}' column, refusing to resume over it",
                options.layout.title_label
            ),
        });
    }

    if !checkpoint.completed_titles.is_empty() {
        let skipped = batch.retain_unprocessed(&checkpoint.completed_titles);
        tracing::info!(
            completed = checkpoint.completed_titles.len(),
            skipped = skipped,
            "Resuming, already translated records will be skipped"
        );
    }

    if batch.is_empty() {
        tracing::info!(output = %options.output_path, "All records are already translated");
        return Ok(TranslationStats::default());
    }

    let mut stats = TranslationStats::new(batch.total_words());
    let total_records = batch.records.len();

    let mut writer = if options.resume {
        let (max_words, committed_len) = resume_layout(&checkpoint, &batch, &options.output_path)?;
        BilingualWriter::append(
            options.output_path.as_str(),
            &options.layout,
            max_words,
            committed_len,
        )?
    } else {
        BilingualWriter::create(options.output_path.as_str(), &options.layout, batch.max_words)?
    };

    let translator = ChunkedTranslator::new(translator, options.chunk.clone());

    for (index, record) in batch.records.iter().enumerate() {
        let title = translator.translate_text(&record.title).await;
        let words = translator
            .translate_words(&record.words, Some(&mut stats), observer)
            .await;

        writer.write_record(record, &title, &words)?;

        tracing::info!(
            record = index + 1,
            total = total_records,
            title = %record.title,
            words = record.words.len(),
            "Record written"
        );
    }

    let rows = writer.finish()?;
    tracing::info!(
        output = %options.output_path,
        rows_written = rows,
        "Translation completed"
    );

    Ok(stats)
}
