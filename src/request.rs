//! Unified request and result types for AGEN

use serde::{Deserialize, Serialize};

/// Optional knobs accepted by every generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions
{   /// Aspect ratio, e.g. "16:9"
    pub aspect_ratio: Option<String>
  , /// Output quality tier, e.g. "1080p"
    pub quality: Option<String>
  , /// Engine choice, e.g. "Banana" or "Veo 3"
    pub engine: Option<String>
  , /// Number of images to generate
    pub image_count: Option<u32>
}

/// Unified generation request
/// Built once per submission and consumed by a single dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest
{   /// Tool kind the request targets
    pub tool_kind: crate::ToolKind
  , /// The prompt text
    pub prompt: String
  , /// Optional knobs
    pub options: GenerationOptions
}

impl GenerationRequest
{   /// Create a request with default options
    pub fn new(
      tool_kind: crate::ToolKind
    , prompt: impl Into<String>
    ) -> Self
    {   GenerationRequest
        {   tool_kind
          , prompt: prompt.into()
          , options: GenerationOptions::default()
        }
    }
}

/// Unified generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult
{   /// Generated text, if any
    pub text: Option<String>
  , /// URL of the generated media, if any
    pub media_url: Option<String>
}

impl GenerationResult
{   /// Text-only result
    pub fn text(text: impl Into<String>) -> Self
    {   GenerationResult
        {   text: Some(text.into())
          , media_url: None
        }
    }

    /// Media result with a status note
    pub fn media(
      url: impl Into<String>
    , note: impl Into<String>
    ) -> Self
    {   GenerationResult
        {   text: Some(note.into())
          , media_url: Some(url.into())
        }
    }

    /// Degenerate response for tools with no provider call
    pub fn unsupported() -> Self
    {   GenerationResult::text(
          "This tool is not connected to the generation \
           service yet."
        )
    }
}
