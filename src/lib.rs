pub mod csv_processor;
pub mod state;
pub mod translation;
pub mod utils;

pub use csv_processor::{BilingualWriter, Record, RecordBatch, WordlistReader};
pub use state::{ResumeCheckpoint, TranslationStats};
pub use translation::{
    process_file, recover_failures, BlockingTranslator, ChunkOptions, ChunkedTranslator,
    GoogleTranslator, LogProgress, ProgressObserver, RecoveryOptions, RunOptions,
    TranslationOutput, Translator,
};
pub use utils::{AppConfig, OutputLayout, Result, WordlistError};
