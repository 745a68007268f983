use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use super::{SpeechProvider, SpeechQuality, SpeechRequest};

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

pub struct OpenAiSpeechProvider {
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiSpeechProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str, mime: &str) -> anyhow::Result<String> {
        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .context("invalid audio content type")?;

        let form = Form::new()
            .part("file", part)
            .text("model", "whisper-1")
            .text("language", "en")
            .text("response_format", "text");

        let text = self
            .client
            .post(TRANSCRIPTION_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("failed to call transcription API")?
            .error_for_status()
            .context("transcription API returned error")?
            .text()
            .await
            .context("failed to read transcription")?;

        Ok(text.trim().to_string())
    }

    async fn speak(&self, request: &SpeechRequest) -> anyhow::Result<Vec<u8>> {
        let model = match request.quality {
            SpeechQuality::Standard => "tts-1",
            SpeechQuality::High => "tts-1-hd",
        };

        let bytes = self
            .client
            .post(SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": model,
                "voice": request.voice,
                "input": request.text,
                "speed": request.speed,
                "response_format": "mp3",
            }))
            .send()
            .await
            .context("failed to call speech API")?
            .error_for_status()
            .context("speech API returned error")?
            .bytes()
            .await
            .context("failed to read speech audio")?;

        Ok(bytes.to_vec())
    }
}
