use thiserror::Error;

/// Errors raised by the bit buffers, the bit streams and the universal codes.
///
/// All of them are local failures: nothing is retried and, for writes, the
/// cursor is left where it was before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A bit index outside `[0, capacity)` was addressed.
    #[error("bit index {index} is out of bounds (capacity {capacity} bits)")]
    IndexOutOfBounds { index: u64, capacity: u64 },

    /// The write would go past the end of the buffer.
    #[error("cannot write {requested} bits at position {position}: only {available} bits left")]
    BufferOverflow {
        position: u64,
        requested: u64,
        available: u64,
    },

    /// The read would consume more bits than the stream holds.
    #[error("end of stream at bit {position}: {requested} bits requested, {available} available")]
    EndOfStream {
        position: u64,
        requested: u64,
        available: u64,
    },

    /// A value does not fit the requested width, or a code parameter is illegal.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A unary run (or a decoded magnitude) exceeded the configured limit.
    #[error("code starting at bit {position} is too long (limit {limit})")]
    CodeTooLong { position: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while loading or walking a coded graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("malformed graph at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("malformed properties: {0}")]
    Properties(String),

    #[error("node {node} is not in the range [0, {num_nodes})")]
    NodeOutOfRange { node: usize, num_nodes: usize },

    #[error("offsets error: {0}")]
    Offsets(String),
}
