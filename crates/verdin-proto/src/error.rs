//! DNS protocol error types.

use thiserror::Error;

/// Result type alias for DNS protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// DNS wire format and protocol errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer is too short to contain the expected data.
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum size.
        expected: usize,
        /// Actual buffer size.
        actual: usize,
    },

    /// Unexpected end of data while parsing.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where EOF was encountered.
        offset: usize,
    },

    /// Invalid data encountered during parsing.
    #[error("invalid data at offset {offset}: {message}")]
    InvalidData {
        /// Byte offset of the invalid data.
        offset: usize,
        /// Description of the error.
        message: String,
    },

    /// Label exceeds maximum length of 63 bytes.
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong {
        /// Actual label length.
        length: usize,
    },

    /// Domain name exceeds maximum length of 255 bytes.
    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong {
        /// Actual name length in wire format.
        length: usize,
    },

    /// Reserved label type encoding (top bits `01` or `10`).
    #[error("reserved label type 0x{value:02X} at offset {offset}")]
    ReservedLabelType {
        /// Offset of the length byte.
        offset: usize,
        /// The offending length byte.
        value: u8,
    },

    /// Compression pointer does not point strictly backward.
    #[error("forward compression pointer at offset {offset}: points to {target}")]
    ForwardPointer {
        /// Offset of the pointer.
        offset: usize,
        /// Target offset the pointer references.
        target: usize,
    },

    /// Too many compression pointer jumps (loop guard).
    #[error("compression pointer chase exceeded {max_jumps} jumps")]
    PointerChaseExceeded {
        /// Maximum allowed jumps.
        max_jumps: usize,
    },

    /// Message has the TC flag set; truncated responses are discarded.
    #[error("message is truncated")]
    Truncated,

    /// Invalid opcode value.
    #[error("invalid opcode: {value}")]
    InvalidOpCode {
        /// The invalid opcode value.
        value: u8,
    },

    /// Invalid response code value.
    #[error("invalid response code: {value}")]
    InvalidResponseCode {
        /// The invalid rcode value.
        value: u8,
    },

    /// RDATA shorter or longer than its declared RDLENGTH.
    #[error("RDATA length mismatch for {rtype}: declared {declared}, consumed {consumed}")]
    RDataLengthMismatch {
        /// Record type.
        rtype: String,
        /// Declared RDLENGTH.
        declared: usize,
        /// Bytes actually consumed by the typed parser.
        consumed: usize,
    },

    /// Invalid RDATA content.
    #[error("invalid RDATA for {rtype}: {message}")]
    InvalidRData {
        /// Record type.
        rtype: String,
        /// Error description.
        message: String,
    },
}

impl Error {
    /// Creates a new `BufferTooShort` error.
    #[inline]
    pub fn buffer_too_short(expected: usize, actual: usize) -> Self {
        Self::BufferTooShort { expected, actual }
    }

    /// Creates a new `UnexpectedEof` error.
    #[inline]
    pub fn unexpected_eof(offset: usize) -> Self {
        Self::UnexpectedEof { offset }
    }

    /// Creates a new `InvalidData` error.
    #[inline]
    pub fn invalid_data(offset: usize, message: impl Into<String>) -> Self {
        Self::InvalidData {
            offset,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRData` error.
    #[inline]
    pub fn invalid_rdata(rtype: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRData {
            rtype: rtype.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a malformed datagram that the
    /// caller should drop.
    #[inline]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::BufferTooShort { .. }
                | Self::UnexpectedEof { .. }
                | Self::InvalidData { .. }
                | Self::ReservedLabelType { .. }
                | Self::ForwardPointer { .. }
                | Self::PointerChaseExceeded { .. }
                | Self::RDataLengthMismatch { .. }
                | Self::InvalidRData { .. }
        )
    }
}
