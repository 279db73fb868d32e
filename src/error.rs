use thiserror::Error;

/// Errors produced while decoding a replay file or a match folder.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input is not a match replay (bad magic, or not zstd where zstd
    /// was expected).
    #[error("not a match replay file")]
    InvalidFile,

    /// The directory holds no `.rec` files.
    #[error("not a match folder")]
    InvalidFolder,

    /// A header string was not delimited by the seven-byte zero separator.
    #[error("invalid header string separator")]
    InvalidStringSeparator,

    /// The cursor ran past the end of the decompressed payload.
    /// The outer read loop treats this as end-of-stream; everywhere else it
    /// means the record under the cursor is truncated.
    #[error("unexpected end of payload")]
    UnexpectedEnd,

    /// A header property failed to parse as its expected type.
    #[error("could not decode header field `{field}`: {value:?}")]
    DecodeField { field: &'static str, value: String },
}

impl Error {
    pub(crate) fn decode_field(field: &'static str, value: &str) -> Self {
        Error::DecodeField {
            field,
            value: value.to_owned(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
