use crate::utils::{Result, WordlistError};
use csv::StringRecord;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// One book from the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: String,
    pub title: String,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    /// Longest word list seen across the whole source, before any resume filtering.
    pub max_words: usize,
    pub limit_reached: bool,
}

impl RecordBatch {
    pub fn total_words(&self) -> usize {
        self.records.iter().map(|r| r.words.len()).sum()
    }

    /// Drops records whose title is already committed. Returns how many were dropped.
    pub fn retain_unprocessed(&mut self, completed: &HashSet<String>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !completed.contains(&r.title));
        before - self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct WordlistReader {
    path: String,
    limit: Option<usize>,
}

impl WordlistReader {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn read_records(&self) -> Result<RecordBatch> {
        if !file_exists(&self.path) {
            return Err(WordlistError::FileNotFound(self.path.clone()));
        }
        let file = std::fs::File::open(&self.path)?;
        self.read_from(file)
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<RecordBatch> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source);

        let mut batch = RecordBatch::default();
        let mut rows = reader.records();

        match rows.next() {
            Some(header) => {
                header?;
            }
            None => return Ok(batch),
        }

        for (index, row) in rows.enumerate() {
            if self.limit.is_some_and(|limit| index >= limit) {
                tracing::info!(limit = index, "Row limit reached, stopping early");
                batch.limit_reached = true;
                break;
            }
            let row = row?;
            if let Some(record) = record_from_row(&row) {
                batch.max_words = batch.max_words.max(record.words.len());
                batch.records.push(record);
            }
        }

        Ok(batch)
    }
}

/// Word cells start at column 2; each is trimmed and empties are dropped.
pub fn parse_word_list(row: &StringRecord) -> Vec<String> {
    row.iter()
        .skip(2)
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn record_from_row(row: &StringRecord) -> Option<Record> {
    if row.len() < 3 {
        return None;
    }
    let words = parse_word_list(row);
    if words.is_empty() {
        return None;
    }
    Some(Record {
        level: row[0].trim().to_string(),
        title: row[1].trim().to_string(),
        words,
    })
}

pub fn file_exists(path: &str) -> bool {
    Path::new(path).exists()
}
