pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod media;
pub mod poll;
pub mod router;
pub mod client;
use serde::{Deserialize, Serialize};

/*

agen (All GENerators): an async-only rust library exposing one
dispatch syntax for every generation modality of the Gemini API
family -- script and text generation, text-to-image,
text-to-video and text-to-speech -- and normalizing the mixed
provider responses (plain text, inline image bytes, long-running
video operations, inline audio payloads) into a single result
shape.

agen/
├── Cargo.toml          # Main manifest
├── src/
│   ├── lib.rs          # Re-exports and backend interface
│   ├── error.rs        # Custom error types and handling
│   ├── config.rs       # Router and polling configuration
│   ├── request.rs      # Unified request/result types
│   ├── router.rs       # Tool-kind dispatch (the core mapping)
│   ├── poll.rs         # Long-running video job polling
│   ├── media.rs        # Decoded payload persistence
│   ├── client.rs       # Backend actor interface
│   └── providers/      # Provider-specific implementations
│       ├── mod.rs      # Backend trait and boundary types
│       └── gemini.rs   # Gemini API backend
└── tests/              # Integration and property tests

*/

/// AGEN API INTERFACE:

// ===== Dispatch =====

pub type DispatchReply
  = Result<crate::request::GenerationResult, crate::error::Error>;
pub type DispatchReplySender
  = tokio::sync::mpsc::UnboundedSender<DispatchReply>;

pub struct DispatchArgs
{   pub tool_kind: String
  , pub prompt: String
  , pub options: crate::request::GenerationOptions
  , pub reply: DispatchReplySender
}

// ===== GenerateVideoScript =====

pub type GenerateVideoScriptReply
  = Result<String, crate::error::Error>;
pub type GenerateVideoScriptReplySender
  = tokio::sync::mpsc::UnboundedSender<GenerateVideoScriptReply>;

pub struct GenerateVideoScriptArgs
{   pub topic: String
  , pub tone: String
  , pub reply: GenerateVideoScriptReplySender
}

// ===== SetApiKey =====

pub type SetApiKeyReply = Result<(), crate::error::Error>;
pub type SetApiKeyReplySender
  = tokio::sync::mpsc::UnboundedSender<SetApiKeyReply>;

pub struct SetApiKeyArgs
{   pub key: String
  , pub reply: SetApiKeyReplySender
}

// ===== GetEngines =====

pub type GetEnginesReply
  = Result<Vec<EngineInfo>, crate::error::Error>;
pub type GetEnginesReplySender
  = tokio::sync::mpsc::UnboundedSender<GetEnginesReply>;

pub struct GetEnginesArgs
{   pub reply: GetEnginesReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== AgenHand (sender side) =====

pub struct AgenHand
{   pub dispatch_tx
      : tokio::sync::mpsc::UnboundedSender<DispatchArgs>
  , pub generate_video_script_tx
      : tokio::sync::mpsc::UnboundedSender
        <GenerateVideoScriptArgs>
  , pub set_api_key_tx
      : tokio::sync::mpsc::UnboundedSender<SetApiKeyArgs>
  , pub get_engines_tx
      : tokio::sync::mpsc::UnboundedSender<GetEnginesArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== AgenFoot (receiver side) =====

pub struct AgenFoot
{   pub dispatch_rx
      : tokio::sync::mpsc::UnboundedReceiver<DispatchArgs>
  , pub generate_video_script_rx
      : tokio::sync::mpsc::UnboundedReceiver
        <GenerateVideoScriptArgs>
  , pub set_api_key_rx
      : tokio::sync::mpsc::UnboundedReceiver<SetApiKeyArgs>
  , pub get_engines_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetEnginesArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}

/// AGEN STRUCTURES:

/// Enum representing every tool kind the dashboard dispatches.
/// Each variant corresponds to one generation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub enum ToolKind
{
  // ===== TEXT TOOLS =====
  /// Long-form script generation
  ScriptGen
  ,
  /// UGC-style ad copy
  UgcTool
  ,
  /// Automatic content ideas
  AutoContent
  ,
  /// Describe an image as a reusable prompt
  ImgToPrompt
  ,
  // ===== MEDIA TOOLS =====
  /// Image synthesis from a text prompt
  TextToImg
  ,
  /// Video synthesis from a text prompt
  TextToVideo
  ,
  /// Speech synthesis from a text prompt
  TextToSpeech
  ,
  // ===== NOT YET WIRED =====
  /// Image-to-image restyling
  ImgToImg
  ,
  /// Still extraction from video
  VideoToImg
}

impl ToolKind
{   /// Parse the front-end slug for a tool kind
    pub fn from_slug(slug: &str) -> Option<Self>
    {   match slug
        {   "script-gen" => Some(ToolKind::ScriptGen)
          , "ugc-tool" => Some(ToolKind::UgcTool)
          , "auto-content" => Some(ToolKind::AutoContent)
          , "img-to-prompt" => Some(ToolKind::ImgToPrompt)
          , "text-to-img" => Some(ToolKind::TextToImg)
          , "text-to-video" => Some(ToolKind::TextToVideo)
          , "text-to-speech" => Some(ToolKind::TextToSpeech)
          , "img-to-img" => Some(ToolKind::ImgToImg)
          , "video-to-img" => Some(ToolKind::VideoToImg)
          , _ => None
        }
    }

    /// The front-end slug for this tool kind
    pub fn slug(&self) -> &'static str
    {   match self
        {   ToolKind::ScriptGen => "script-gen"
          , ToolKind::UgcTool => "ugc-tool"
          , ToolKind::AutoContent => "auto-content"
          , ToolKind::ImgToPrompt => "img-to-prompt"
          , ToolKind::TextToImg => "text-to-img"
          , ToolKind::TextToVideo => "text-to-video"
          , ToolKind::TextToSpeech => "text-to-speech"
          , ToolKind::ImgToImg => "img-to-img"
          , ToolKind::VideoToImg => "video-to-img"
        }
    }
}

/// Information about a selectable generation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInfo
{   /// Display name shown to users (e.g., "Banana", "Veo 3")
    pub name: String
  , /// Provider model id behind the engine
    pub model_id: String
  , /// Tool kind the engine serves
    pub kind: ToolKind
  , /// Whether this engine is picked when the caller names none
    pub is_default: bool
}
