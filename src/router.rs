//! Tool-kind dispatch: the total mapping from a generation
//! request to the provider call shape that serves it

use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::ToolKind;
use crate::error::Error;
use crate::media::MediaStore;
use crate::poll::PollSchedule;
use crate::providers::gemini;
use crate::providers::{GenerationBackend, MediaPayload};
use crate::request::{
  GenerationOptions, GenerationRequest, GenerationResult
};

/// System instruction for the creative text tools
pub const CREATIVE_SYSTEM_INSTRUCTION: &str
  = "You are an expert creative assistant for content \
     production.";

/// System instruction for the video script helper
pub const SCRIPT_WRITER_SYSTEM_INSTRUCTION: &str
  = "You are a professional video script writer.";

/// Aspect ratio used when the caller picks none
const DEFAULT_ASPECT_RATIO: &str = "1:1";

/// Select the image model for an engine choice
pub fn image_model_for(
  engine: Option<&str>
) -> &'static str
{   match engine
    {   Some("Banana") => gemini::IMAGE_MODEL_FLASH
      , _ => gemini::IMAGE_MODEL_PRO
    }
}

/// Select the video model for an engine choice
pub fn video_model_for(
  engine: Option<&str>
) -> &'static str
{   match engine
    {   Some("Veo 3") => gemini::VIDEO_MODEL_FULL
      , _ => gemini::VIDEO_MODEL_FAST
    }
}

/// Routes each generation request to exactly one backend call
/// and normalizes the response into a GenerationResult.
/// Holds no state between dispatches.
pub struct Router<B: GenerationBackend>
{   backend: B
  , media: MediaStore
  , schedule: PollSchedule
}

/// Build the Gemini-backed router from configuration
pub fn gemini_router(
  config: &crate::config::RouterConfig
) -> Result<Router<gemini::GeminiBackend>, Error>
{   let backend = gemini::GeminiBackend::from_config(config)?;
    let media = match &config.media_dir
    {   Some(dir) => MediaStore::new(dir.clone())
      , None => MediaStore::default_dir()
    };
    Ok(Router::new(
      backend,
      media,
      PollSchedule::from_config(&config.poll)
    ))
}

impl<B: GenerationBackend> Router<B>
{   /// Build a router around a backend
    pub fn new(
      backend: B
    , media: MediaStore
    , schedule: PollSchedule
    ) -> Self
    {   Router
        {   backend
          , media
          , schedule
        }
    }

    /// Dispatch a slug-keyed request
    /// Unknown slugs produce the unsupported-tool result
    /// without touching the backend
    pub async fn dispatch(
      &self
    , tool_kind: &str
    , prompt: &str
    , options: &GenerationOptions
    ) -> Result<GenerationResult, Error>
    {   self.dispatch_slug(tool_kind, prompt, options, None)
          .await
    }

    /// Dispatch with a cancellation token; only the video
    /// polling wait observes it
    pub async fn dispatch_with_cancel(
      &self
    , tool_kind: &str
    , prompt: &str
    , options: &GenerationOptions
    , cancel: &CancellationToken
    ) -> Result<GenerationResult, Error>
    {   self.dispatch_slug(
          tool_kind,
          prompt,
          options,
          Some(cancel)
        ).await
    }

    async fn dispatch_slug(
      &self
    , tool_kind: &str
    , prompt: &str
    , options: &GenerationOptions
    , cancel: Option<&CancellationToken>
    ) -> Result<GenerationResult, Error>
    {   match ToolKind::from_slug(tool_kind)
        {   Some(kind) => {
              let request = GenerationRequest
              {   tool_kind: kind
                , prompt: prompt.to_string()
                , options: options.clone()
              };
              self.dispatch_request(&request, cancel).await
            }
          , None => {
              info!("Unknown tool kind: {}", tool_kind);
              Ok(GenerationResult::unsupported())
            }
        }
    }

    /// Dispatch a typed request
    pub async fn dispatch_request(
      &self
    , request: &GenerationRequest
    , cancel: Option<&CancellationToken>
    ) -> Result<GenerationResult, Error>
    {   if request.prompt.trim().is_empty()
        {   error!("Blank prompt rejected");
            return Err(Error::InvalidRequest(
              "Prompt must not be empty".to_string()
            ));
        }

        debug!(
          "Dispatching {} request",
          request.tool_kind.slug()
        );

        match request.tool_kind
        {   ToolKind::ScriptGen
          | ToolKind::UgcTool
          | ToolKind::AutoContent
          | ToolKind::ImgToPrompt => {
              let text = self.backend
                .complete_text(
                  gemini::TEXT_MODEL,
                  CREATIVE_SYSTEM_INSTRUCTION,
                  &request.prompt
                )
                .await?;
              Ok(GenerationResult::text(text))
            }
          , ToolKind::TextToImg => {
              self.run_image(request).await
            }
          , ToolKind::TextToVideo => {
              self.run_video(request, cancel).await
            }
          , ToolKind::TextToSpeech => {
              self.run_speech(request).await
            }
          , ToolKind::ImgToImg
          | ToolKind::VideoToImg => {
              info!(
                "Tool {} has no provider call",
                request.tool_kind.slug()
              );
              Ok(GenerationResult::unsupported())
            }
        }
    }

    async fn run_image(
      &self
    , request: &GenerationRequest
    ) -> Result<GenerationResult, Error>
    {   let model = image_model_for(
          request.options.engine.as_deref()
        );
        let ratio = request.options.aspect_ratio.as_deref()
          .unwrap_or(DEFAULT_ASPECT_RATIO);
        let count = request.options.image_count.unwrap_or(1);
        debug!(
          "Image synthesis with {} ({} requested)",
          model, count
        );

        let payloads = self.backend
          .synthesize_image(
            model,
            &request.prompt,
            ratio,
            count
          )
          .await?;

        let mut urls = vec![];
        for payload in &payloads
        {   urls.push(self.media.persist(payload).await?);
        }
        let first = urls.into_iter().next()
          .ok_or_else(|| Error::ParseError(
            "Response contained no image data".to_string()
          ))?;

        Ok(GenerationResult::media(
          first,
          format!(
            "Generated {} image(s) with {}",
            payloads.len(),
            model
          )
        ))
    }

    async fn run_video(
      &self
    , request: &GenerationRequest
    , cancel: Option<&CancellationToken>
    ) -> Result<GenerationResult, Error>
    {   let model = video_model_for(
          request.options.engine.as_deref()
        );
        debug!("Video synthesis with {}", model);

        let job = self.backend
          .start_video_job(
            model,
            &request.prompt,
            request.options.aspect_ratio.as_deref()
          )
          .await?;

        let uri = crate::poll::await_video(
          &self.backend,
          &job,
          &self.schedule,
          cancel
        ).await?;

        Ok(GenerationResult::media(
          uri,
          format!("Video rendered with engine {}", model)
        ))
    }

    async fn run_speech(
      &self
    , request: &GenerationRequest
    ) -> Result<GenerationResult, Error>
    {   debug!(
          "Speech synthesis with {}",
          gemini::TTS_MODEL
        );

        let payload = self.backend
          .synthesize_speech(
            gemini::TTS_MODEL,
            gemini::TTS_VOICE,
            &request.prompt
          )
          .await?;

        // Gemini TTS emits headerless PCM
        let payload
          = if crate::media::is_raw_pcm(&payload.mime_type)
        {   MediaPayload
            {   mime_type: "audio/wav".to_string()
              , data: crate::media::pcm_to_wav(
                  &payload.data,
                  crate::media::TTS_SAMPLE_RATE,
                  1
                )
            }
        } else
        {   payload
        };

        let url = self.media.persist(&payload).await?;
        Ok(GenerationResult::media(
          url,
          "Audio generated."
        ))
    }

    /// Generate a video script for a topic and tone
    pub async fn generate_video_script(
      &self
    , topic: &str
    , tone: &str
    ) -> Result<String, Error>
    {   if topic.trim().is_empty()
        {   error!("Blank topic rejected");
            return Err(Error::InvalidRequest(
              "Topic must not be empty".to_string()
            ));
        }

        debug!("Generating video script about: {}", topic);
        let prompt = format!(
          "Write a video script about \"{}\". \
           The tone should be {}.",
          topic, tone
        );

        self.backend
          .complete_text(
            gemini::TEXT_MODEL,
            SCRIPT_WRITER_SYSTEM_INSTRUCTION,
            &prompt
          )
          .await
    }
}
