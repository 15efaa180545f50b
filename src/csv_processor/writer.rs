use crate::csv_processor::reader::Record;
use crate::utils::{OutputLayout, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

/// Writes CSV rows in atomic groups: every call encodes its rows into one
/// buffer, hands it to the sink with a single write and flushes.
pub struct CsvPairWriter<W: Write> {
    inner: W,
    terminator: csv::Terminator,
    rows_written: usize,
}

impl<W: Write> CsvPairWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            terminator: csv::Terminator::Any(b'\n'),
            rows_written: 0,
        }
    }

    pub fn with_terminator(mut self, terminator: csv::Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.write_rows(&[row])
    }

    /// Translated row first, original row second.
    pub fn write_pair(&mut self, translated: &[String], original: &[String]) -> Result<()> {
        self.write_rows(&[translated, original])
    }

    /// Copies already encoded bytes holding `rows` rows.
    pub fn write_raw(&mut self, bytes: &[u8], rows: usize) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.inner.flush()?;
        self.rows_written += rows;
        Ok(())
    }

    fn write_rows(&mut self, rows: &[&[String]]) -> Result<()> {
        let bytes = encode_rows(rows, self.terminator)?;
        self.write_raw(&bytes, rows.len())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn encode_rows(rows: &[&[String]], terminator: csv::Terminator) -> Result<Vec<u8>> {
    let mut staging = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(terminator)
        .from_writer(Vec::new());
    for row in rows {
        staging.write_record(row.iter())?;
    }
    staging
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into())
}

/// Right-pads a word list with empty cells up to `max_words`.
pub fn pad_words(words: &[String], max_words: usize) -> Vec<String> {
    let mut padded = words.to_vec();
    if padded.len() < max_words {
        padded.resize(max_words, String::new());
    }
    padded
}

/// Output table writer: one header, then a translated/original row pair per record.
pub struct BilingualWriter {
    path: String,
    writer: CsvPairWriter<File>,
    max_words: usize,
    header_written: bool,
}

impl BilingualWriter {
    /// Starts a fresh file, replacing anything at `path`.
    pub fn create(path: impl Into<String>, layout: &OutputLayout, max_words: usize) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        let mut writer = CsvPairWriter::new(file);
        writer.write_row(&layout.header(max_words))?;
        Ok(Self {
            path,
            writer,
            max_words,
            header_written: true,
        })
    }

    /// Continues a partial file after its first `committed_len` bytes; anything
    /// past that point is discarded. The header is only written when nothing is kept.
    pub fn append(
        path: impl Into<String>,
        layout: &OutputLayout,
        max_words: usize,
        committed_len: u64,
    ) -> Result<Self> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let current_len = file.metadata()?.len();
        if current_len > committed_len {
            tracing::warn!(
                path = %path,
                dropped_bytes = current_len - committed_len,
                "Discarding incomplete trailing rows before resuming"
            );
        }
        file.set_len(committed_len)?;
        let needs_newline = committed_len > 0 && last_byte(&mut file)? != b'\n';
        file.seek(SeekFrom::End(0))?;
        if needs_newline {
            file.write_all(b"\n")?;
        }

        let mut writer = CsvPairWriter::new(file);
        let header_written = committed_len == 0;
        if header_written {
            writer.write_row(&layout.header(max_words))?;
        }
        Ok(Self {
            path,
            writer,
            max_words,
            header_written,
        })
    }

    pub fn write_record(
        &mut self,
        record: &Record,
        translated_title: &str,
        translated_words: &[String],
    ) -> Result<()> {
        let translated = self.build_row(&record.level, translated_title, translated_words);
        let original = self.build_row(&record.level, &record.title, &record.words);
        self.writer.write_pair(&translated, &original)
    }

    fn build_row(&self, level: &str, title: &str, words: &[String]) -> Vec<String> {
        let mut row = Vec::with_capacity(self.max_words + 2);
        row.push(level.to_string());
        row.push(title.to_string());
        row.extend(pad_words(words, self.max_words));
        row
    }

    /// Returns the number of data rows written, header excluded.
    pub fn finish(self) -> Result<usize> {
        let rows = self.writer.rows_written() - usize::from(self.header_written);
        let file = self.writer.into_inner();
        file.sync_all()?;
        tracing::debug!(path = %self.path, rows = rows, "Output synced");
        Ok(rows)
    }
}

fn last_byte(file: &mut File) -> Result<u8> {
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut byte)?;
    Ok(byte[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pad_words_fills_to_width() {
        assert_eq!(pad_words(&words(&["a"]), 3), words(&["a", "", ""]));
        assert_eq!(pad_words(&words(&["a", "b"]), 2), words(&["a", "b"]));
    }

    #[test]
    fn pair_is_encoded_with_unix_newlines_and_quoting() {
        let mut writer = CsvPairWriter::new(Vec::new());
        writer
            .write_pair(&words(&["a", "x,y", ""]), &words(&["a", "plain"]))
            .unwrap();

        assert_eq!(writer.rows_written(), 2);
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, "a,\"x,y\",\na,plain\n");
    }

    #[test]
    fn crlf_terminator_and_raw_rows() {
        let mut writer = CsvPairWriter::new(Vec::new()).with_terminator(csv::Terminator::CRLF);
        writer.write_raw(b"h1,h2\r\n", 1).unwrap();
        writer
            .write_pair(&words(&["a", "甲"]), &words(&["a", "A"]))
            .unwrap();

        assert_eq!(writer.rows_written(), 3);
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, "h1,h2\r\na,甲\r\na,A\r\n");
    }

    #[test]
    fn record_rows_share_header_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let path = path.to_str().unwrap();

        let mut writer = BilingualWriter::create(path, &OutputLayout::default(), 3).unwrap();
        let record = Record {
            level: "a".to_string(),
            title: "Farm".to_string(),
            words: words(&["cat"]),
        };
        writer
            .write_record(&record, "农场", &words(&["猫"]))
            .unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "level,title,word1,word2,word3\na,农场,猫,,\na,Farm,cat,,\n"
        );
    }

    #[test]
    fn append_truncates_to_committed_prefix_without_new_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let committed = "level,title,word1\na,甲,一\na,A,one\n";
        std::fs::write(&path, format!("{committed}b,乙,二\n")).unwrap();
        let path = path.to_str().unwrap();

        let mut writer =
            BilingualWriter::append(path, &OutputLayout::default(), 1, committed.len() as u64)
                .unwrap();
        let record = Record {
            level: "b".to_string(),
            title: "B".to_string(),
            words: words(&["two"]),
        };
        writer.write_record(&record, "乙", &words(&["二"])).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, format!("{committed}b,乙,二\nb,B,two\n"));
    }

    #[test]
    fn append_to_missing_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.csv");
        let path = path.to_str().unwrap();

        let writer = BilingualWriter::append(path, &OutputLayout::default(), 2, 0).unwrap();
        writer.finish().unwrap();

        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "level,title,word1,word2\n"
        );
    }

    #[test]
    fn append_terminates_an_unterminated_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let committed = "level,title,word1\na,甲,一\na,A,one";
        std::fs::write(&path, committed).unwrap();
        let path = path.to_str().unwrap();

        let mut writer =
            BilingualWriter::append(path, &OutputLayout::default(), 1, committed.len() as u64)
                .unwrap();
        let record = Record {
            level: "b".to_string(),
            title: "B".to_string(),
            words: words(&["two"]),
        };
        writer.write_record(&record, "乙", &words(&["二"])).unwrap();
        writer.finish().unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, format!("{committed}\nb,乙,二\nb,B,two\n"));
    }
}
