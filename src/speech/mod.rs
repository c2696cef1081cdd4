//! Voice output for assistant replies

pub mod voice;

pub use voice::{CommandBackend, SilentBackend, SpeechBackend, SpeechConfig, Voice};
