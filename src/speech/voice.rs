//! Best-effort voice output
//!
//! A [`Voice`] owns the speech-enabled flag and a [`SpeechBackend`]. Each new
//! utterance interrupts the one currently playing: the backend holds a single
//! utterance slot. Missing speech capability and synthesis failures are
//! swallowed; speech never affects the rest of the loop.

use crate::{CoachError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for voice output
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak replies at startup
    pub enabled: bool,

    /// Speech command taking the text as its only argument; detected when unset
    pub command: Option<String>,
}

impl SpeechConfig {
    /// Enable speech at startup
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Use a specific speech command
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// Platform speech capability
pub trait SpeechBackend: Send + Sync {
    /// Whether the platform can speak at all
    fn is_available(&self) -> bool;

    /// Stop the current utterance, if any
    fn cancel(&self);

    /// Start speaking without waiting for completion, replacing the current utterance
    fn speak(&self, text: &str) -> Result<()>;
}

/// Backend for platforms without speech
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentBackend;

impl SpeechBackend for SilentBackend {
    fn is_available(&self) -> bool {
        false
    }

    fn cancel(&self) {}

    fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Speaks through a system command such as `say` or `espeak`
pub struct CommandBackend {
    program: String,
    available: bool,
    current: Mutex<Option<Child>>,
}

impl CommandBackend {
    /// Availability is resolved once, here
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let available = Path::new(&program).is_file() || find_on_path(&program);
        Self {
            program,
            available,
            current: Mutex::new(None),
        }
    }

    /// First known speech command found on `PATH`
    pub fn detect() -> Option<Self> {
        ["say", "espeak-ng", "espeak", "spd-say"]
            .into_iter()
            .find(|program| find_on_path(program))
            .map(Self::new)
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SpeechBackend for CommandBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn cancel(&self) {
        if let Some(mut child) = self.current.lock().take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn speak(&self, text: &str) -> Result<()> {
        self.cancel();

        let child = Command::new(&self.program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CoachError::Speech(format!("Failed to start {}: {}", self.program, e)))?;

        *self.current.lock() = Some(child);
        Ok(())
    }
}

impl Drop for CommandBackend {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn find_on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Voice output with an explicitly owned enable flag
#[derive(Clone)]
pub struct Voice {
    backend: Arc<dyn SpeechBackend>,
    enabled: bool,
}

impl Voice {
    pub fn new(backend: Arc<dyn SpeechBackend>, enabled: bool) -> Self {
        Self { backend, enabled }
    }

    /// Voice that never speaks
    pub fn silent() -> Self {
        Self::new(Arc::new(SilentBackend), false)
    }

    /// Build from configuration, falling back to silence when no command exists
    pub fn from_config(config: &SpeechConfig) -> Self {
        let backend: Arc<dyn SpeechBackend> = match &config.command {
            Some(command) => Arc::new(CommandBackend::new(command.clone())),
            None => match CommandBackend::detect() {
                Some(backend) => {
                    info!("Using speech command: {}", backend.program());
                    Arc::new(backend)
                }
                None => {
                    info!("No speech command found, voice output disabled");
                    Arc::new(SilentBackend)
                }
            },
        };
        Self::new(backend, config.enabled)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.backend.cancel();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Speak text; the backend interrupts any current utterance. Returns whether speech started.
    pub fn speak(&self, text: &str) -> bool {
        if !self.enabled || text.trim().is_empty() || !self.backend.is_available() {
            return false;
        }

        match self.backend.speak(text) {
            Ok(()) => true,
            Err(e) => {
                debug!("Speech failed: {}", e);
                false
            }
        }
    }

    /// Stop the current utterance
    pub fn cancel(&self) {
        self.backend.cancel();
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("enabled", &self.enabled)
            .field("available", &self.backend.is_available())
            .finish()
    }
}
