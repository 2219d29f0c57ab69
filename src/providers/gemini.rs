use serde::{Deserialize, Serialize};
use log::{debug, trace, error};
use async_trait::async_trait;
use base64::Engine as _;

use crate::providers::{
  GenerationBackend, MediaPayload, VideoJob, VideoJobStatus
};

const GEMINI_API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";

// ===== Model Catalog =====

/// Text completion model behind every text tool
pub const TEXT_MODEL: &str = "gemini-3-flash-preview";
/// Image model selected by the "Banana" engine
pub const IMAGE_MODEL_FLASH: &str = "gemini-2.5-flash-image";
/// Default image model
pub const IMAGE_MODEL_PRO: &str = "gemini-3-pro-image-preview";
/// Default (fast) video model
pub const VIDEO_MODEL_FAST: &str
  = "veo-3.1-fast-generate-preview";
/// Video model selected by the "Veo 3" engine
pub const VIDEO_MODEL_FULL: &str = "veo-3.1-generate-preview";
/// Speech synthesis model
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
/// Preset voice for speech synthesis
pub const TTS_VOICE: &str = "Kore";

/// Engines selectable through the Gemini backend
pub fn engine_catalog() -> Vec<crate::EngineInfo>
{   vec![
      crate::EngineInfo
      {   name: "Flash".to_string()
        , model_id: TEXT_MODEL.to_string()
        , kind: crate::ToolKind::ScriptGen
        , is_default: true
      }
    , crate::EngineInfo
      {   name: "Banana".to_string()
        , model_id: IMAGE_MODEL_FLASH.to_string()
        , kind: crate::ToolKind::TextToImg
        , is_default: false
      }
    , crate::EngineInfo
      {   name: "Pro".to_string()
        , model_id: IMAGE_MODEL_PRO.to_string()
        , kind: crate::ToolKind::TextToImg
        , is_default: true
      }
    , crate::EngineInfo
      {   name: "Veo 2".to_string()
        , model_id: VIDEO_MODEL_FAST.to_string()
        , kind: crate::ToolKind::TextToVideo
        , is_default: true
      }
    , crate::EngineInfo
      {   name: "Veo 3".to_string()
        , model_id: VIDEO_MODEL_FULL.to_string()
        , kind: crate::ToolKind::TextToVideo
        , is_default: false
      }
    , crate::EngineInfo
      {   name: "Kore".to_string()
        , model_id: TTS_MODEL.to_string()
        , kind: crate::ToolKind::TextToSpeech
        , is_default: true
      }
    ]
}

// ===== Wire Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>
  , pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
  , #[serde(
      rename = "inlineData"
    , skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData
{   #[serde(rename = "mimeType")]
    pub mime_type: String
  , pub data: String
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , #[serde(
      rename = "systemInstruction"
    , skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<Content>
  , #[serde(
      rename = "generationConfig"
    , skip_serializing_if = "Option::is_none"
    )]
    pub generation_config: Option<GenerationConfig>
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig
{   #[serde(
      rename = "responseModalities"
    , skip_serializing_if = "Option::is_none"
    )]
    pub response_modalities: Option<Vec<String>>
  , #[serde(
      rename = "candidateCount"
    , skip_serializing_if = "Option::is_none"
    )]
    pub candidate_count: Option<u32>
  , #[serde(
      rename = "imageConfig"
    , skip_serializing_if = "Option::is_none"
    )]
    pub image_config: Option<ImageConfig>
  , #[serde(
      rename = "speechConfig"
    , skip_serializing_if = "Option::is_none"
    )]
    pub speech_config: Option<SpeechConfig>
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageConfig
{   #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechConfig
{   #[serde(rename = "voiceConfig")]
    pub voice_config: VoiceConfig
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceConfig
{   #[serde(rename = "prebuiltVoiceConfig")]
    pub prebuilt_voice_config: PrebuiltVoiceConfig
}

#[derive(Debug, Clone, Serialize)]
pub struct PrebuiltVoiceConfig
{   #[serde(rename = "voiceName")]
    pub voice_name: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate
{   pub content: Content
  , #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoGenerationRequest
{   pub instances: Vec<VideoInstance>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<VideoParameters>
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoInstance
{   pub prompt: String
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoParameters
{   #[serde(
      rename = "aspectRatio"
    , skip_serializing_if = "Option::is_none"
    )]
    pub aspect_ratio: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Operation
{   pub name: String
  , #[serde(default)]
    pub done: bool
  , #[serde(default)]
    pub error: Option<OperationError>
  , #[serde(default)]
    pub response: Option<OperationResponse>
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError
{   #[serde(default)]
    pub code: Option<i64>
  , #[serde(default)]
    pub message: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationResponse
{   #[serde(rename = "generateVideoResponse", default)]
    pub generate_video_response
      : Option<GenerateVideoResponse>
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateVideoResponse
{   #[serde(rename = "generatedSamples", default)]
    pub generated_samples: Vec<GeneratedSample>
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSample
{   pub video: VideoRef
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoRef
{   pub uri: String
}

// ===== Gemini Backend =====

/// Configured Gemini API client
/// Immutable after construction; safe to share across dispatches
pub struct GeminiBackend
{   http_client: reqwest::Client
  , api_key: String
  , api_base: String
}

impl GeminiBackend
{   /// Build a backend from configuration
    /// Fails before any network call when no key is available
    pub fn from_config(
      config: &crate::config::RouterConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Building GeminiBackend from config");

        let api_key = crate::config::resolve_api_key(config)
          .ok_or_else(|| {
            error!("No API key in config or environment");
            crate::error::Error::MissingCredential
          })?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs
        {   builder = builder.timeout(
              std::time::Duration::from_secs(secs)
            );
        }
        let http_client = builder.build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            crate::error::Error::InvalidConfiguration(
              e.to_string()
            )
          })?;

        Ok(GeminiBackend
        {   http_client
          , api_key
          , api_base: config.api_base.clone()
              .unwrap_or_else(|| GEMINI_API_BASE.to_string())
        })
    }

    fn model_url(&self, model: &str, verb: &str) -> String
    {   format!(
          "{}/models/{}:{}?key={}",
          self.api_base, model, verb, self.api_key
        )
    }

    fn operation_url(&self, operation: &str) -> String
    {   format!(
          "{}/{}?key={}",
          self.api_base, operation, self.api_key
        )
    }

    async fn post_generate_content(
      &self
    , model: &str
    , request: &GenerateContentRequest
    ) -> Result<GenerateContentResponse, crate::error::Error>
    {   trace!("generateContent request to: {}", model);

        let response = self.http_client
          .post(self.model_url(model, "generateContent"))
          .header("Content-Type", "application/json")
          .json(request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("generateContent response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Gemini API error: {}", error_text);
            return Err(crate::error::Error::ApiError(
              error_text
            ));
        }

        response.json().await.map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::ParseError(e.to_string())
        })
    }

    fn first_candidate(
      response: GenerateContentResponse
    ) -> Result<Candidate, crate::error::Error>
    {   response.candidates.into_iter().next()
          .ok_or_else(|| {
            error!("No candidates in response");
            crate::error::Error::NoCandidatesInResponse
          })
    }

    fn decode_inline_data(
      inline: &InlineData
    ) -> Result<MediaPayload, crate::error::Error>
    {   let data = base64::engine::general_purpose::STANDARD
          .decode(&inline.data)
          .map_err(|e| {
            error!("Base64 decode failed: {}", e);
            crate::error::Error::MediaDecode(e.to_string())
          })?;
        Ok(MediaPayload
        {   mime_type: inline.mime_type.clone()
          , data
        })
    }

    fn user_content(text: &str) -> Content
    {   Content
        {   role: Some("user".to_string())
          , parts: vec![
              Part
              {   text: Some(text.to_string())
                , inline_data: None
              }
            ]
        }
    }

    fn instruction_content(text: &str) -> Content
    {   Content
        {   role: None
          , parts: vec![
              Part
              {   text: Some(text.to_string())
                , inline_data: None
              }
            ]
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend
{   async fn complete_text(
      &self
    , model: &str
    , system_instruction: &str
    , prompt: &str
    ) -> Result<String, crate::error::Error>
    {   debug!("complete_text with model: {}", model);

        let request = GenerateContentRequest
        {   contents: vec![Self::user_content(prompt)]
          , system_instruction: Some(
              Self::instruction_content(system_instruction)
            )
          , generation_config: None
        };

        let response = self
          .post_generate_content(model, &request)
          .await?;

        let candidate = Self::first_candidate(response)?;
        candidate.content.parts.into_iter()
          .find_map(|p| p.text)
          .ok_or_else(|| {
            error!("No text part in response");
            crate::error::Error::ParseError(
              "Response contained no text part".to_string()
            )
          })
    }

    async fn synthesize_image(
      &self
    , model: &str
    , prompt: &str
    , aspect_ratio: &str
    , count: u32
    ) -> Result<Vec<MediaPayload>, crate::error::Error>
    {   debug!(
          "synthesize_image with model: {} (count {})",
          model, count
        );

        let request = GenerateContentRequest
        {   contents: vec![Self::user_content(prompt)]
          , system_instruction: None
          , generation_config: Some(GenerationConfig
            {   response_modalities: Some(vec![
                  "IMAGE".to_string()
                ])
              , candidate_count: if count > 1
                {   Some(count)
                } else
                {   None
                }
              , image_config: Some(ImageConfig
                {   aspect_ratio: aspect_ratio.to_string()
                })
              , speech_config: None
            })
        };

        let response = self
          .post_generate_content(model, &request)
          .await?;

        if response.candidates.is_empty()
        {   error!("No candidates in image response");
            return Err(
              crate::error::Error::NoCandidatesInResponse
            );
        }

        let mut payloads = vec![];
        for candidate in response.candidates
        {   for part in candidate.content.parts
            {   if let Some(inline) = &part.inline_data
                {   payloads.push(
                      Self::decode_inline_data(inline)?
                    );
                }
            }
        }

        if payloads.is_empty()
        {   error!("No image data in response");
            return Err(crate::error::Error::ParseError(
              "Response contained no image data".to_string()
            ));
        }

        debug!("Decoded {} image payload(s)", payloads.len());
        Ok(payloads)
    }

    async fn start_video_job(
      &self
    , model: &str
    , prompt: &str
    , aspect_ratio: Option<&str>
    ) -> Result<VideoJob, crate::error::Error>
    {   debug!("start_video_job with model: {}", model);

        let request = VideoGenerationRequest
        {   instances: vec![
              VideoInstance
              {   prompt: prompt.to_string()
              }
            ]
          , parameters: aspect_ratio.map(|ratio| {
              VideoParameters
              {   aspect_ratio: Some(ratio.to_string())
              }
            })
        };

        let response = self.http_client
          .post(self.model_url(model, "predictLongRunning"))
          .header("Content-Type", "application/json")
          .json(&request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("predictLongRunning status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Video submit error: {}", error_text);
            return Err(crate::error::Error::ApiError(
              error_text
            ));
        }

        let operation: Operation
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        debug!("Video job accepted: {}", operation.name);
        Ok(VideoJob
        {   operation: operation.name
        })
    }

    async fn poll_video_job(
      &self
    , job: &VideoJob
    ) -> Result<VideoJobStatus, crate::error::Error>
    {   trace!("poll_video_job: {}", job.operation);

        let response = self.http_client
          .get(self.operation_url(&job.operation))
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Operation poll error: {}", error_text);
            return Err(crate::error::Error::ApiError(
              error_text
            ));
        }

        let operation: Operation
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        if let Some(op_error) = operation.error
        {   return Ok(VideoJobStatus::Failed(
              op_error.message.unwrap_or_else(||
                "Video generation failed".to_string()
              )
            ));
        }

        if !operation.done
        {   return Ok(VideoJobStatus::Pending);
        }

        let uri = operation.response
          .and_then(|r| r.generate_video_response)
          .and_then(|r| {
            r.generated_samples.into_iter().next()
          })
          .map(|s| s.video.uri);

        match uri
        {   Some(uri) => Ok(VideoJobStatus::Complete(uri))
          , None => Ok(VideoJobStatus::Failed(
              "Operation finished without video output"
                .to_string()
            ))
        }
    }

    async fn synthesize_speech(
      &self
    , model: &str
    , voice: &str
    , utterance: &str
    ) -> Result<MediaPayload, crate::error::Error>
    {   debug!(
          "synthesize_speech with model: {} voice: {}",
          model, voice
        );

        let request = GenerateContentRequest
        {   contents: vec![Self::user_content(utterance)]
          , system_instruction: None
          , generation_config: Some(GenerationConfig
            {   response_modalities: Some(vec![
                  "AUDIO".to_string()
                ])
              , candidate_count: None
              , image_config: None
              , speech_config: Some(SpeechConfig
                {   voice_config: VoiceConfig
                    {   prebuilt_voice_config:
                          PrebuiltVoiceConfig
                          {   voice_name: voice.to_string()
                          }
                    }
                })
            })
        };

        let response = self
          .post_generate_content(model, &request)
          .await?;

        let candidate = Self::first_candidate(response)?;
        let inline = candidate.content.parts.iter()
          .find_map(|p| p.inline_data.as_ref())
          .ok_or_else(|| {
            error!("No audio data in response");
            crate::error::Error::ParseError(
              "Response contained no audio data".to_string()
            )
          })?;

        Self::decode_inline_data(inline)
    }
}
