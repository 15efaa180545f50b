pub mod reader;
pub mod writer;

pub use reader::{file_exists, parse_word_list, record_from_row, Record, RecordBatch, WordlistReader};
pub use writer::{pad_words, BilingualWriter, CsvPairWriter};

use csv::StringRecord;

pub fn string_record_to_vec(record: &StringRecord) -> Vec<String> {
    record.iter().map(|s| s.to_string()).collect()
}
