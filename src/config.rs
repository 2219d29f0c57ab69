//! Configuration for the AGEN router and video polling behavior

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables consulted for the API key, in order
const KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig
{   /// API key (falls back to the environment when absent)
    pub api_key: Option<String>
  , /// API base URL (if custom)
    pub api_base: Option<String>
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
  , /// Directory persisted media files are written to
    pub media_dir: Option<PathBuf>
  , /// Video polling configuration
    pub poll: PollConfig
}

impl Default for RouterConfig
{   fn default() -> Self
    {   RouterConfig
        {   api_key: None
          , api_base: None
          , timeout_secs: None
          , media_dir: None
          , poll: PollConfig::default()
        }
    }
}

/// Polling policy for long-running video jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig
{   /// Delay before the first poll in milliseconds
    pub initial_interval_ms: u64
  , /// Backoff multiplier applied between polls
    pub backoff_multiplier: f32
  , /// Upper bound on the poll interval in milliseconds
    pub max_interval_ms: u64
  , /// Give up on the job after this many seconds in total
    pub max_wait_secs: u64
}

impl Default for PollConfig
{   fn default() -> Self
    {   PollConfig
        {   initial_interval_ms: 2000
          , backoff_multiplier: 2.0
          , max_interval_ms: 20_000
          , max_wait_secs: 300
        }
    }
}

/// Resolve the API key from config or environment
pub fn resolve_api_key(config: &RouterConfig)
  -> Option<String>
{   if let Some(key) = &config.api_key
    {   if !key.is_empty()
        {   return Some(key.clone());
        }
    }

    for var in KEY_ENV_VARS
    {   if let Ok(key) = std::env::var(var)
        {   if !key.is_empty()
            {   return Some(key);
            }
        }
    }

    None
}
