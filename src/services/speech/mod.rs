pub mod openai;

use async_trait::async_trait;
use serde::Serialize;

pub const DEFAULT_VOICE: &str = "alloy";

#[derive(Debug, Clone, Serialize)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const VOICES: &[Voice] = &[
    Voice { id: "alloy", name: "Alloy", description: "Neutral, balanced voice" },
    Voice { id: "echo", name: "Echo", description: "Clear, confident voice" },
    Voice { id: "fable", name: "Fable", description: "Warm, storytelling voice" },
    Voice { id: "onyx", name: "Onyx", description: "Deep, authoritative voice" },
    Voice { id: "nova", name: "Nova", description: "Bright, energetic voice" },
    Voice { id: "shimmer", name: "Shimmer", description: "Soft, gentle voice" },
];

pub fn is_known_voice(id: &str) -> bool {
    VOICES.iter().any(|v| v.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechQuality {
    Standard,
    High,
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub quality: SpeechQuality,
    pub speed: f32,
}

/// Speech-to-text and text-to-speech conversion.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str, mime: &str) -> anyhow::Result<String>;

    /// Returns MP3 audio.
    async fn speak(&self, request: &SpeechRequest) -> anyhow::Result<Vec<u8>>;
}
