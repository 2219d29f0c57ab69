//! Persistence of decoded media payloads
//!
//! Inline image and audio payloads arrive as bytes; callers
//! expect a retrievable URL, so they are written to disk and
//! handed back as file:// URLs.

use log::{debug, error};
use std::path::PathBuf;

use crate::providers::MediaPayload;

/// Sample rate Gemini TTS emits raw PCM at
pub const TTS_SAMPLE_RATE: u32 = 24_000;

/// Writes decoded payloads to disk and hands back file:// URLs
#[derive(Debug, Clone)]
pub struct MediaStore
{   dir: PathBuf
}

impl MediaStore
{   /// Create a store rooted at the given directory
    pub fn new(dir: PathBuf) -> Self
    {   debug!("Creating MediaStore at: {}", dir.display());
        MediaStore
        {   dir
        }
    }

    /// Store rooted at the default directory under the OS
    /// temp dir
    pub fn default_dir() -> Self
    {   MediaStore::new(
          std::env::temp_dir().join("agen-media")
        )
    }

    /// Persist a payload and return a retrievable URL
    pub async fn persist(
      &self
    , payload: &MediaPayload
    ) -> Result<String, crate::error::Error>
    {   tokio::fs::create_dir_all(&self.dir).await
          .map_err(|e| {
            error!("Failed to create media dir: {}", e);
            crate::error::Error::Other(format!(
              "Failed to create media dir: {}", e
            ))
          })?;

        let name = format!(
          "{}.{}",
          uuid::Uuid::new_v4(),
          extension_for(&payload.mime_type)
        );
        let path = self.dir.join(name);

        tokio::fs::write(&path, &payload.data).await
          .map_err(|e| {
            error!("Failed to write media file: {}", e);
            crate::error::Error::Other(format!(
              "Failed to write media file: {}", e
            ))
          })?;

        debug!(
          "Persisted {} byte(s) to: {}",
          payload.data.len(),
          path.display()
        );
        Ok(format!("file://{}", path.display()))
    }
}

/// Map a MIME type to a file extension
fn extension_for(mime: &str) -> &'static str
{   let essence = mime.split(';').next().unwrap_or("");
    match essence
    {   "image/png" => "png"
      , "image/jpeg" => "jpg"
      , "image/webp" => "webp"
      , "audio/wav" | "audio/x-wav" => "wav"
      , "audio/mpeg" | "audio/mp3" => "mp3"
      , "video/mp4" => "mp4"
      , _ => "bin"
    }
}

// ===== PCM to WAV =====

/// Whether a payload is raw PCM that needs a WAV wrapper
pub fn is_raw_pcm(mime: &str) -> bool
{   mime.starts_with("audio/L16")
      || mime.starts_with("audio/pcm")
}

/// Wrap raw 16-bit little-endian PCM in a minimal WAV container
pub fn pcm_to_wav(
  pcm: &[u8]
, sample_rate: u32
, channels: u16
) -> Vec<u8>
{   let byte_rate = sample_rate * channels as u32 * 2;
    let block_align = channels * 2;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
