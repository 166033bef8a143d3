pub mod buffer;
pub mod decoder;
pub mod error;
pub mod runner;

pub use buffer::StreamBuffer;
pub use decoder::Utf8StreamDecoder;
pub use error::StreamError;
pub use runner::{RunOutcome, ScriptRunner, StreamMode, DEFAULT_SCRIPT_ENDPOINT};
