use thiserror;

use std::fmt;

use crate::fastq::Origin;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading or writing \"{file}\": {source}")]
    FileIo {
        file: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Error reading or writing bytes: {0}")]
    BytesIo(Box<dyn std::error::Error + Send + Sync>),

    #[error("Mate files contain different numbers of reads: {file1} has {count1}, {file2} has {count2}")]
    UnpairedRead {
        file1: Origin,
        count1: usize,
        file2: Origin,
        count2: usize,
    },

    #[error("Error parsing record {idx} in {origin}: {source}")]
    ParseRecord {
        origin: Origin,
        idx: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid DNA sequence \"{string}\" for {context}. Sequences must only contain IUPAC nucleotide codes.")]
    InvalidSequence { string: String, context: String },

    #[error("Must specify a primer file, or a barcode file together with a constant sequence")]
    MissingBarcodeSource,

    #[error("No sequences found in {kind} file \"{file}\"")]
    EmptyInput { kind: &'static str, file: String },

    #[error("Too many wildcards in library sequence \"{name}\": {seq}")]
    TooManyWildcards { name: String, seq: String },

    #[error("Cannot align to wildcard sequences when another candidate is available: {0}")]
    CandidateConflict(CandidateMode),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Which kind of candidate was already present when a conflicting one was added.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CandidateMode {
    Ordinary,
    ExtraJunk,
}

impl fmt::Display for CandidateMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use CandidateMode::*;
        match self {
            Ordinary => write!(f, "set already holds ordinary library candidates"),
            ExtraJunk => write!(f, "set already holds extra-junk candidates"),
        }
    }
}

pub fn utf8(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}
