use crate::csv_processor::{file_exists, string_record_to_vec, CsvPairWriter};
use crate::state::checkpoint::find_column;
use crate::state::TranslationStats;
use crate::translation::backend::Translator;
use crate::translation::chunked::{
    is_failure_placeholder, ChunkOptions, ChunkedTranslator, ProgressObserver,
};
use crate::utils::{AppConfig, Result, WordlistError};
use csv::StringRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct RecoveryOptions {
    pub input_path: String,
    pub output_path: String,
    pub chunk: ChunkOptions,
    pub title_label: String,
}

impl RecoveryOptions {
    pub fn from_config(
        input_path: impl Into<String>,
        output_path: impl Into<String>,
        config: &AppConfig,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            chunk: ChunkOptions::from(&config.translation),
            title_label: config.output.title_label.clone(),
        }
    }
}

/// Either the final file, or a temporary sibling that replaces it at the end
/// when the pass rewrites its own input.
enum Sink {
    Direct(File),
    Staged(NamedTempFile),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Direct(file) => file.write(buf),
            Sink::Staged(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Direct(file) => file.flush(),
            Sink::Staged(file) => file.flush(),
        }
    }
}

impl Sink {
    fn open(input_path: &str, output_path: &str) -> Result<Self> {
        if same_file(input_path, output_path) {
            let dir = Path::new(output_path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            Ok(Sink::Staged(NamedTempFile::new_in(dir)?))
        } else {
            Ok(Sink::Direct(File::create(output_path)?))
        }
    }

    fn finish(self, output_path: &str) -> Result<()> {
        match self {
            Sink::Direct(file) => file.sync_all()?,
            Sink::Staged(file) => {
                file.as_file().sync_all()?;
                file.persist(output_path)?;
            }
        }
        Ok(())
    }
}

fn same_file(a: &str, b: &str) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Re-translates only the cells of a finished output that carry the failure
/// marker and writes a healed copy to `output_path`. The header and every pair
/// without failures are copied as their original bytes, so line endings and
/// quoting survive; a healed pair is re-encoded with the input's line
/// terminator. No row is dropped or reordered. The returned stats cover just
/// the re-submitted words.
pub async fn recover_failures<T: Translator + ?Sized>(
    options: &RecoveryOptions,
    translator: &T,
    observer: Option<&dyn ProgressObserver>,
) -> Result<TranslationStats> {
    if !file_exists(&options.input_path) {
        return Err(WordlistError::FileNotFound(options.input_path.clone()));
    }

    let source = std::fs::read(&options.input_path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source.as_slice());

    let mut header = StringRecord::new();
    if !reader.read_record(&mut header)? {
        return Err(WordlistError::InvalidHeader {
            path: options.input_path.clone(),
            reason: "file is empty".to_string(),
        });
    }
    let title_idx = find_column(&header, &options.title_label).ok_or_else(|| {
        WordlistError::InvalidHeader {
            path: options.input_path.clone(),
            reason: format!("no '{}' column", options.title_label),
        }
    })?;

    tracing::info!(input = %options.input_path, "Scanning for failed translations");

    let sink = Sink::open(&options.input_path, &options.output_path)?;
    let mut writer = CsvPairWriter::new(sink).with_terminator(detect_terminator(&source));
    let mut cursor = line_end(&source, &reader);
    writer.write_raw(&source[..cursor], 1)?;

    let translator = ChunkedTranslator::new(translator, options.chunk.clone());
    let mut stats = TranslationStats::default();
    let mut translated_row = StringRecord::new();
    let mut original_row = StringRecord::new();
    let mut pairs = 0usize;

    while reader.read_record(&mut translated_row)? {
        let start = cursor;

        if !reader.read_record(&mut original_row)? {
            tracing::warn!(
                pairs = pairs,
                "Trailing row without its original row, copying it unchanged"
            );
            writer.write_raw(&source[start..], 1)?;
            cursor = source.len();
            break;
        }
        cursor = line_end(&source, &reader);
        pairs += 1;

        let mut translated = string_record_to_vec(&translated_row);
        let original = string_record_to_vec(&original_row);
        let retry = failed_cells(&translated, &original);
        if retry.is_empty() {
            writer.write_raw(&source[start..cursor], 2)?;
            continue;
        }

        let title = original.get(title_idx).map(String::as_str).unwrap_or_default();
        tracing::info!(
            title = %title,
            failed = retry.len(),
            "Retrying failed words"
        );
        stats.total_words += retry.len();

        let words: Vec<String> = retry.iter().map(|(_, word)| word.clone()).collect();
        let healed = translator
            .translate_words(&words, Some(&mut stats), observer)
            .await;

        for ((index, _), text) in retry.iter().zip(healed) {
            translated[*index] = text;
        }
        writer.write_pair(&translated, &original)?;
    }

    // Blank lines after the last row.
    if cursor < source.len() {
        writer.write_raw(&source[cursor..], 0)?;
    }

    let sink = writer.into_inner();
    sink.finish(&options.output_path)?;

    tracing::info!(
        output = %options.output_path,
        pairs = pairs,
        retried = stats.total_words,
        "Recovery pass completed"
    );

    Ok(stats)
}

/// Byte offset just past the record the reader last returned, including a
/// `\r\n` terminator the reader may have left half consumed.
fn line_end(source: &[u8], reader: &csv::Reader<&[u8]>) -> usize {
    let pos = usize::try_from(reader.position().byte())
        .unwrap_or(source.len())
        .min(source.len());
    if pos > 0 && source[pos - 1] == b'\r' && source.get(pos) == Some(&b'\n') {
        pos + 1
    } else {
        pos
    }
}

fn detect_terminator(source: &[u8]) -> csv::Terminator {
    match source.iter().position(|&b| b == b'\n') {
        Some(i) if i > 0 && source[i - 1] == b'\r' => csv::Terminator::CRLF,
        _ => csv::Terminator::Any(b'\n'),
    }
}

/// Word columns (index 2 onward) of `translated` holding a failure placeholder,
/// paired with the original word at the same index.
pub fn failed_cells(translated: &[String], original: &[String]) -> Vec<(usize, String)> {
    translated
        .iter()
        .enumerate()
        .skip(2)
        .filter(|(_, cell)| is_failure_placeholder(cell))
        .filter_map(|(index, _)| {
            match original.get(index).map(|w| w.trim()).filter(|w| !w.is_empty()) {
                Some(word) => Some((index, word.to_string())),
                None => {
                    tracing::warn!(column = index, "Failed cell has no original word, leaving it");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn failed_cells_pairs_markers_with_original_words() {
        let translated = row(&["a", "[translation failed: x]", "猫", "[translation failed: y]", ""]);
        let original = row(&["a", "Farm", "cat", "dog", ""]);

        assert_eq!(
            failed_cells(&translated, &original),
            vec![(3, "dog".to_string())]
        );
    }

    #[test]
    fn terminator_follows_the_first_line() {
        assert!(matches!(detect_terminator(b"a,b\r\nc,d\r\n"), csv::Terminator::CRLF));
        assert!(matches!(
            detect_terminator(b"a,b\nc,d\r\n"),
            csv::Terminator::Any(b'\n')
        ));
        assert!(matches!(detect_terminator(b"a,b"), csv::Terminator::Any(b'\n')));
    }

    #[test]
    fn failed_cell_without_original_word_is_left_alone() {
        let translated = row(&["a", "标题", "[translation failed: x]", "[translation failed: y]"]);
        let original = row(&["a", "Title", "  "]);

        assert!(failed_cells(&translated, &original).is_empty());
    }
}
