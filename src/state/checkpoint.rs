use crate::utils::Result;
use csv::StringRecord;
use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Read};

/// What a previous, possibly interrupted, run left behind in its output file.
#[derive(Debug, Clone, Default)]
pub struct ResumeCheckpoint {
    /// Original-row titles of every complete row pair.
    pub completed_titles: HashSet<String>,
    /// Byte length of the header plus all complete row pairs.
    pub committed_len: u64,
    pub pairs: usize,
    /// The file starts with a header row, recognized or not.
    pub header_present: bool,
    pub header_recognized: bool,
    /// Cell count of the recognized header.
    pub header_width: usize,
}

impl ResumeCheckpoint {
    pub fn is_completed(&self, title: &str) -> bool {
        self.completed_titles.contains(title)
    }
}

/// Scans the output file at `path`. A missing or empty file counts as nothing
/// processed yet; check `header_present` / `header_recognized` before
/// appending to anything else.
pub fn scan_output(path: &str, title_label: &str) -> Result<ResumeCheckpoint> {
    match File::open(path) {
        Ok(file) => scan_from(file, title_label),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(ResumeCheckpoint::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn scan_from<R: Read>(source: R, title_label: &str) -> Result<ResumeCheckpoint> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);
    let mut checkpoint = ResumeCheckpoint::default();

    let mut header = StringRecord::new();
    match reader.read_record(&mut header) {
        Ok(true) => checkpoint.header_present = true,
        Ok(false) => return Ok(checkpoint),
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable output header");
            checkpoint.header_present = true;
            return Ok(checkpoint);
        }
    }

    let Some(title_idx) = find_column(&header, title_label) else {
        tracing::warn!(title_label = title_label, "Output header has no title column");
        return Ok(checkpoint);
    };
    checkpoint.header_recognized = true;
    checkpoint.header_width = header.len();
    checkpoint.committed_len = reader.position().byte();

    let mut translated = StringRecord::new();
    let mut original = StringRecord::new();
    loop {
        if !read_next(&mut reader, &mut translated) {
            break;
        }
        if !read_next(&mut reader, &mut original) {
            tracing::debug!(
                pairs = checkpoint.pairs,
                "Trailing half pair found, it will be redone"
            );
            break;
        }
        if let Some(title) = original.get(title_idx) {
            checkpoint.completed_titles.insert(title.to_string());
        }
        checkpoint.pairs += 1;
        checkpoint.committed_len = reader.position().byte();
    }

    Ok(checkpoint)
}

/// A malformed record ends the committed prefix like end of input does.
fn read_next<R: Read>(reader: &mut csv::Reader<R>, row: &mut StringRecord) -> bool {
    match reader.read_record(row) {
        Ok(more) => more,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed trailing record, ignoring the rest of the file");
            false
        }
    }
}

/// Header lookup by label, tolerant of a UTF-8 byte order mark and padding.
pub fn find_column(header: &StringRecord, label: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == label)
}
