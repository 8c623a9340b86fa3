//! Source selection, CSV decoding/encoding and merge of vacancy exports.

pub mod select;
pub mod csv_codec;
pub mod merge;

pub use select::{select_source_keys, DEFAULT_MAX_SOURCE_FILES, MIN_KEY_LEN};
pub use csv_codec::{decode_csv, encode_csv, DecodedSource};
pub use merge::{merge_sources, MergeOutcome};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV error in {source_key}: {error}")]
    Csv {
        source_key: String,
        #[source]
        error: csv::Error,
    },

    #[error("CSV encoding error: {0}")]
    Encode(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
