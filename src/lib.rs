#![warn(clippy::all, rust_2018_idioms)]

pub mod lexicon;
pub mod pipeline;
pub mod plural;
mod raw_data;
pub mod reconcile;
pub mod rewrite;
pub mod sounds;
pub mod table;
pub mod transcription;

pub use pipeline::{Options, Output, Pipeline};
use std::num::ParseIntError;
use thiserror::Error;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum PlurGenError {
    /// A required input table is missing or lacks an expected column.
    #[error("Input format error: {0}")]
    InputFormat(String),
    /// A syllable does not contain exactly one vowel symbol.
    #[error("Transcription format error in {transcription:?}: syllable {syllable:?} has {vowels} vowels")]
    TranscriptionFormat {
        transcription: String,
        syllable: String,
        vowels: usize,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PlurGenResult<T> = Result<T, PlurGenError>;

impl From<ParseIntError> for PlurGenError {
    fn from(value: ParseIntError) -> Self {
        Self::Configuration(value.to_string())
    }
}
