//! Text-to-speech tool definition.
//!
//! Talks to a hosted Orpheus inference server exposing the OpenAI-compatible
//! `/audio/speech` endpoint.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::common::{endpoint, media_type_for, require_setting};
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

const VOICES: &[&str] = &["tara", "leah", "jess", "leo", "dan", "mia", "zac", "zoe"];

const NOT_CONFIGURED: &str = "Speech server not configured: set ORPHEUS_TTS_URL";

const RESPONSE_FORMAT: &str = "wav";

/// Orpheus voice preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Tara,
    Leah,
    Jess,
    Leo,
    Dan,
    Mia,
    Zac,
    Zoe,
}

/// Parameters for the speech tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateSpeechParams {
    /// Text to speak.
    pub text: String,

    /// Voice preset.
    #[serde(default)]
    pub voice: Voice,

    /// Playback speed multiplier (0.5-1.5).
    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_speed() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechAudio {
    pub voice: Voice,
    pub content_type: String,
    pub size_bytes: usize,
    pub data: String,
}

/// Speech generation tool.
pub struct SpeechTool {
    config: Arc<Config>,
}

impl SpeechTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for SpeechTool {
    type Params = GenerateSpeechParams;
    type Context = Voice;
    type Output = SpeechAudio;

    const NAME: &'static str = "generate_speech";
    const DESCRIPTION: &'static str = "Convert text to spoken audio with one of the Orpheus \
        voices. Returns WAV audio as base64.";
    const FAILURE_CONTEXT: &'static str = "Speech generation";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("text", ParamKind::String),
        ParameterSpec::optional("voice", ParamKind::Enum(VOICES))
            .with_default(DefaultValue::Str("tara")),
        ParameterSpec::optional("speed", ParamKind::Float)
            .with_default(DefaultValue::Float(1.0))
            .range(0.5, 1.5),
    ];

    fn prepare(&self, params: GenerateSpeechParams) -> Result<(UpstreamRequest, Voice), ToolError> {
        let base = require_setting(self.config.tools.orpheus_tts_url.as_deref(), NOT_CONFIGURED)?;

        let request = UpstreamRequest::post(endpoint(base, "/audio/speech")).json(json!({
            "model": "orpheus",
            "input": params.text,
            "voice": params.voice,
            "response_format": RESPONSE_FORMAT,
            "speed": params.speed,
        }));

        Ok((request, params.voice))
    }

    fn normalize(&self, voice: Voice, response: UpstreamResponse) -> Result<SpeechAudio, ToolError> {
        if response.is_json() {
            let detail = response.text().unwrap_or("<binary>");
            return Err(ToolError::normalization(format!(
                "expected audio, got JSON: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }
        if response.body.is_empty() {
            return Err(ToolError::normalization("No audio data in response"));
        }

        let content_type = response
            .media_type()
            .filter(|mt| mt.starts_with("audio/"))
            .unwrap_or_else(|| media_type_for(RESPONSE_FORMAT).to_string());

        Ok(SpeechAudio {
            voice,
            content_type,
            size_bytes: response.body.len(),
            data: BASE64.encode(&response.body),
        })
    }
}
