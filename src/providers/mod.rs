//! Generation provider implementations

pub mod gemini;

// Re-export for convenience
pub use gemini::GeminiBackend;

use async_trait::async_trait;

/// A decoded binary payload returned inline by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPayload
{   /// MIME type as reported by the provider
    pub mime_type: String
  , /// Decoded bytes
    pub data: Vec<u8>
}

/// Opaque handle to a long-running video operation
#[derive(Debug, Clone, PartialEq)]
pub struct VideoJob
{   /// Operation name used to poll the provider
    pub operation: String
}

/// Observed state of a long-running video operation
#[derive(Debug, Clone, PartialEq)]
pub enum VideoJobStatus
{   /// Still rendering
    Pending
  , /// Finished; provider URL of the rendered video
    Complete(String)
  , /// Provider reported failure
    Failed(String)
}

/// The call shapes the router dispatches to.
/// One method per downstream API shape; backends stay immutable
/// after construction so dispatches can share one instance.
#[async_trait]
pub trait GenerationBackend: Send + Sync
{   /// Single-turn text completion under a system instruction
    async fn complete_text(
      &self
    , model: &str
    , system_instruction: &str
    , prompt: &str
    ) -> Result<String, crate::error::Error>;

    /// Synthesize one or more images for a prompt
    async fn synthesize_image(
      &self
    , model: &str
    , prompt: &str
    , aspect_ratio: &str
    , count: u32
    ) -> Result<Vec<MediaPayload>, crate::error::Error>;

    /// Submit a video generation job
    async fn start_video_job(
      &self
    , model: &str
    , prompt: &str
    , aspect_ratio: Option<&str>
    ) -> Result<VideoJob, crate::error::Error>;

    /// Poll a submitted video job once
    async fn poll_video_job(
      &self
    , job: &VideoJob
    ) -> Result<VideoJobStatus, crate::error::Error>;

    /// Synthesize speech for an utterance with a preset voice
    async fn synthesize_speech(
      &self
    , model: &str
    , voice: &str
    , utterance: &str
    ) -> Result<MediaPayload, crate::error::Error>;
}
