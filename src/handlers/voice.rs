use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::speech::{self, SpeechQuality, SpeechRequest, Voice, DEFAULT_VOICE, VOICES};
use crate::state::AppState;

use super::{fail, ok};

/// Largest accepted audio upload.
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

const AUDIO_FIELD: &str = "audio";

#[derive(Serialize)]
struct Transcription {
    transcription: String,
}

struct Upload {
    bytes: Vec<u8>,
    file_name: String,
    mime: String,
}

async fn read_audio(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let mime = field.content_type().unwrap_or_default().to_string();
        if !mime.starts_with("audio/") {
            return Err(AppError::Validation("Only audio files are allowed".to_string()));
        }
        let file_name = field.file_name().unwrap_or("audio.webm").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        if bytes.len() > MAX_AUDIO_BYTES {
            return Err(AppError::Validation("Audio file is too large".to_string()));
        }

        return Ok(Upload {
            bytes: bytes.to_vec(),
            file_name,
            mime,
        });
    }

    Err(AppError::Validation("No audio file provided".to_string()))
}

// POST /api/voice/transcribe
pub async fn transcribe(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let upload = match read_audio(multipart).await {
        Ok(upload) => upload,
        Err(e) => return fail(&state, e),
    };

    tracing::info!(bytes = upload.bytes.len(), mime = %upload.mime, "transcribing audio");
    match state
        .speech
        .transcribe(upload.bytes, &upload.file_name, &upload.mime)
        .await
    {
        Ok(transcription) => ok(Transcription { transcription }),
        Err(e) => fail(&state, AppError::Upstream(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
}

impl SpeakRequest {
    fn into_speech(self, quality: SpeechQuality) -> Result<SpeechRequest, AppError> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Text is required".to_string()))?;

        let (voice, speed) = match quality {
            SpeechQuality::Standard => (DEFAULT_VOICE.to_string(), 1.0),
            SpeechQuality::High => {
                let voice = self.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string());
                if !speech::is_known_voice(&voice) {
                    return Err(AppError::Validation(format!("Unknown voice: {voice}")));
                }
                (voice, self.speed.unwrap_or(1.0).clamp(0.25, 4.0))
            }
        };

        Ok(SpeechRequest {
            text,
            voice,
            quality,
            speed,
        })
    }
}

async fn speak_with(state: &AppState, body: SpeakRequest, quality: SpeechQuality) -> Response {
    let request = match body.into_speech(quality) {
        Ok(request) => request,
        Err(e) => return fail(state, e),
    };

    match state.speech.speak(&request).await {
        Ok(audio) => (
            [
                (header::CONTENT_TYPE, "audio/mpeg"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            audio,
        )
            .into_response(),
        Err(e) => fail(state, AppError::Upstream(e)),
    }
}

// POST /api/voice/speak
pub async fn speak(State(state): State<Arc<AppState>>, Json(body): Json<SpeakRequest>) -> Response {
    speak_with(&state, body, SpeechQuality::Standard).await
}

// POST /api/voice/speak-enhanced
pub async fn speak_enhanced(State(state): State<Arc<AppState>>, Json(body): Json<SpeakRequest>) -> Response {
    speak_with(&state, body, SpeechQuality::High).await
}

#[derive(Serialize)]
struct Voices {
    voices: &'static [Voice],
}

// GET /api/voice/voices
pub async fn voices() -> Response {
    ok(Voices { voices: VOICES })
}
