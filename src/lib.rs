pub mod audio;
pub mod config;
pub mod engine;
pub mod hotkey;
pub mod soundboard;
pub mod synth;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum VoxError {
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Audio asset not found: {0}")]
    AssetMissing(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Hotkey error: {0}")]
    Hotkey(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for VoxError {
    fn from(e: std::io::Error) -> Self {
        VoxError::IOError(e.to_string())
    }
}

impl VoxError {
    /// Check if this error is recoverable with a fresh user action
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Network/provider failures clear on the next attempt
            VoxError::Synthesis(_) => true,
            // A missing or corrupt asset can be re-synthesized
            VoxError::AssetMissing(_) => true,
            VoxError::Decode(_) => true,
            // Device problems usually require user intervention
            VoxError::Device(_) => false,
            VoxError::Hotkey(_) => false,
            // In-memory state stays authoritative when a save fails
            VoxError::Persistence(_) => true,
            VoxError::Config(_) => false,
            VoxError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            VoxError::Synthesis(_) => {
                "Speech synthesis failed. Please check your network connection and try again."
                    .to_string()
            }
            VoxError::AssetMissing(_) => {
                "Cached audio file is missing. Play the text again to regenerate it.".to_string()
            }
            VoxError::Decode(_) => {
                "Audio file could not be decoded. It may be corrupt.".to_string()
            }
            VoxError::Device(_) => {
                "Audio device error. Please check your output device selection.".to_string()
            }
            VoxError::Hotkey(_) => {
                "Keyboard hook error. Hotkeys may be unavailable.".to_string()
            }
            VoxError::Persistence(_) => {
                "Settings could not be saved. Changes apply for this session only.".to_string()
            }
            VoxError::Config(_) => "Configuration error. Please check settings.".to_string(),
            VoxError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VoxError>;
