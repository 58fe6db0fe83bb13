//! Fixed catalog of cloud neural-TTS voices
//!
//! Identity is the provider voice id; the display name is what the external
//! UI shows in its dropdown.

/// A selectable neural voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceProfile {
    /// Human-readable name shown in the UI
    pub display_name: &'static str,

    /// Provider voice identifier, e.g. "en-US-JennyNeural"
    pub voice_id: &'static str,
}

/// The voices offered by the application, in UI order.
pub const VOICES: &[VoiceProfile] = &[
    VoiceProfile { display_name: "Jenny (Female, US)", voice_id: "en-US-JennyNeural" },
    VoiceProfile { display_name: "Guy (Male, US)", voice_id: "en-US-GuyNeural" },
    VoiceProfile { display_name: "Aria (Female, US)", voice_id: "en-US-AriaNeural" },
    VoiceProfile { display_name: "Eric (Male, US)", voice_id: "en-US-EricNeural" },
    VoiceProfile { display_name: "Michelle (Female, US)", voice_id: "en-US-MichelleNeural" },
    VoiceProfile { display_name: "Roger (Male, US)", voice_id: "en-US-RogerNeural" },
    VoiceProfile { display_name: "Sonia (Female, UK)", voice_id: "en-GB-SoniaNeural" },
    VoiceProfile { display_name: "Ryan (Male, UK)", voice_id: "en-GB-RyanNeural" },
    VoiceProfile { display_name: "Libby (Female, UK)", voice_id: "en-GB-LibbyNeural" },
    VoiceProfile { display_name: "Natasha (Female, AU)", voice_id: "en-AU-NatashaNeural" },
    VoiceProfile { display_name: "William (Male, AU)", voice_id: "en-AU-WilliamNeural" },
    VoiceProfile { display_name: "Clara (Female, CA)", voice_id: "en-CA-ClaraNeural" },
    VoiceProfile { display_name: "Liam (Male, CA)", voice_id: "en-CA-LiamNeural" },
    VoiceProfile { display_name: "Neerja (Female, IN)", voice_id: "en-IN-NeerjaNeural" },
    VoiceProfile { display_name: "Prabhat (Male, IN)", voice_id: "en-IN-PrabhatNeural" },
];

/// Look up a voice by its catalog index.
pub fn voice_by_index(index: usize) -> Option<&'static VoiceProfile> {
    VOICES.get(index)
}

/// Compact readable tag for a voice id, used in cache filenames.
///
/// "en-US-JennyNeural" becomes "JennyFemaleUS". Unknown ids fall back to
/// "Voice" so key derivation always yields a non-empty identifier.
pub fn voice_short_name(voice_id: &str) -> String {
    let parts: Vec<&str> = voice_id.split('-').collect();
    if parts.len() >= 3 {
        let country = parts[1];
        let name = parts[2].strip_suffix("Neural").unwrap_or(parts[2]);

        let gender = VOICES
            .iter()
            .find(|v| v.voice_id == voice_id)
            .map(|v| {
                if v.display_name.contains("Female") {
                    "Female"
                } else if v.display_name.contains("Male") {
                    "Male"
                } else {
                    ""
                }
            })
            .unwrap_or("");

        return format!("{}{}{}", name, gender, country);
    }

    "Voice".to_string()
}
