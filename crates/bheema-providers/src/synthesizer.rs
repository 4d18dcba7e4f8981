//! HTTP text-to-speech against the agent backend.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;

use bheema_speech::{AudioClip, SpeechError, Synthesizer};

/// Synthesizer calling `POST /api/tts/speak`.
///
/// The backend answers with raw `audio/mpeg` bytes, or an empty 200 body
/// when its speech engine failed; the empty body is reported as
/// [`SpeechError::EmptyAudio`] so the queue falls back.
pub struct HttpSynthesizer {
    client: Client,
    base_url: String,
}

impl HttpSynthesizer {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, language_tag: &str) -> Result<AudioClip, SpeechError> {
        // The backend keys voices on the bare language code, not the tag.
        let code = language_tag.split('-').next().unwrap_or(language_tag);
        let form = Form::new()
            .text("text", text.to_string())
            .text("language", code.to_string());

        let response = self
            .client
            .post(format!("{}/api/tts/speak", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Synthesis(format!(
                "backend returned {}",
                status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let data = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?
            .to_vec();

        if data.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        tracing::debug!(bytes = data.len(), language = code, "Synthesized speech clip");
        Ok(AudioClip::new(data, content_type))
    }
}
