/*!
 * Shared fixtures for the integration tests: scripted translators and CSV helpers.
 */

#![allow(dead_code)]

use async_trait::async_trait;
use csv_wordlist_translator::{Result, TranslationOutput, Translator, WordlistError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Maps known words and appends `-zh` to anything else. Records every call.
#[derive(Debug, Default)]
pub struct MappingTranslator {
    mapping: HashMap<String, String>,
    /// Words that always fail.
    failing: HashSet<String>,
    /// Remaining scripted failures per word.
    flaky: Mutex<HashMap<String, usize>>,
    /// Words answered with a null value on their first call.
    null_once: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MappingTranslator {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            mapping: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, words: &[&str]) -> Self {
        self.failing = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn flaky_on(self, word: &str, failures: usize) -> Self {
        self.flaky.lock().unwrap().insert(word.to_string(), failures);
        self
    }

    pub fn null_once_on(self, word: &str) -> Self {
        self.null_once.lock().unwrap().insert(word.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(text, _, _)| text).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Translator for MappingTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationOutput> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            source_lang.to_string(),
            target_lang.to_string(),
        ));

        if self.failing.contains(text) {
            return Err(WordlistError::ApiError(format!("no translation for {text}")));
        }
        if let Some(remaining) = self.flaky.lock().unwrap().get_mut(text) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(WordlistError::ApiError("temporarily unavailable".to_string()));
            }
        }
        if self.null_once.lock().unwrap().remove(text) {
            return Ok(TranslationOutput::Value(Value::Null));
        }

        let translated = self
            .mapping
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("{text}-zh"));
        Ok(TranslationOutput::Text(translated))
    }
}

/// Fails every call with the same error.
#[derive(Debug, Default)]
pub struct FailingTranslator {
    calls: Mutex<usize>,
}

impl FailingTranslator {
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _: &str, _: &str, _: &str) -> Result<TranslationOutput> {
        *self.calls.lock().unwrap() += 1;
        Err(WordlistError::ApiError("boom".to_string()))
    }
}

pub fn farm_translator() -> MappingTranslator {
    MappingTranslator::new(&[
        ("Farm Animals", "农场动物"),
        ("Tree House", "树屋"),
        ("cat", "猫"),
        ("dog", "狗"),
        ("tree", "树"),
        ("house", "房子"),
    ])
}

pub fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn write_csv(dir: &Path, name: &str, rows: &[&[&str]]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&path)
        .unwrap();
    for row in rows {
        writer.write_record(*row).unwrap();
    }
    writer.flush().unwrap();
    path
}

pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
        .collect()
}

pub fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

/// Source table used by most pipeline tests.
pub fn farm_source(dir: &Path) -> PathBuf {
    write_csv(
        dir,
        "input.csv",
        &[
            &["RAZ Level", "Book Title", "Word List"],
            &["a", "Farm Animals", "cat", "dog"],
            &["b", "Tree House", "tree", "house", ""],
        ],
    )
}
