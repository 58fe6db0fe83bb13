pub mod cache;
pub mod provider;
pub mod voices;

pub use cache::SpeechCache;
pub use provider::{NeuralTtsClient, NeuralTtsConfig, SpeechProvider};
pub use voices::{voice_by_index, voice_short_name, VoiceProfile, VOICES};
