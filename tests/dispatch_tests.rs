use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use agen::error::Error;
use agen::media::MediaStore;
use agen::poll::PollSchedule;
use agen::providers::gemini::{
  IMAGE_MODEL_FLASH, IMAGE_MODEL_PRO,
  VIDEO_MODEL_FAST, VIDEO_MODEL_FULL,
  TEXT_MODEL, TTS_MODEL, TTS_VOICE
};
use agen::providers::{
  GenerationBackend, MediaPayload, VideoJob, VideoJobStatus
};
use agen::request::GenerationOptions;
use agen::router::{
  Router,
  CREATIVE_SYSTEM_INSTRUCTION,
  SCRIPT_WRITER_SYSTEM_INSTRUCTION
};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
enum Call
{   Text
    {   model: String
      , system: String
      , prompt: String
    }
  , Image
    {   model: String
      , aspect_ratio: String
      , count: u32
    }
  , StartVideo
    {   model: String
    }
  , PollVideo
  , Speech
    {   model: String
      , voice: String
    }
}

/// Stub backend recording every call it receives
#[derive(Clone)]
struct StubBackend
{   calls: Arc<Mutex<Vec<Call>>>
  , text_result: Result<String, Error>
  , image_result: Result<Vec<MediaPayload>, Error>
  , speech_result: Result<MediaPayload, Error>
  , // Drained front-to-back; empty means still pending
    video_statuses: Arc<Mutex<Vec<VideoJobStatus>>>
}

impl StubBackend
{   fn ok() -> Self
    {   StubBackend
        {   calls: Arc::new(Mutex::new(vec![]))
          , text_result: Ok("generated text".to_string())
          , image_result: Ok(vec![
              MediaPayload
              {   mime_type: "image/png".to_string()
                , data: vec![0x89, 0x50, 0x4e, 0x47]
              }
            ])
          , speech_result: Ok(MediaPayload
            {   mime_type:
                  "audio/L16;codec=pcm;rate=24000"
                    .to_string()
              , data: vec![0, 1, 2, 3]
            })
          , video_statuses: Arc::new(Mutex::new(vec![
              VideoJobStatus::Complete(
                "https://example.com/out.mp4".to_string()
              )
            ]))
        }
    }

    fn recorded(&self) -> Vec<Call>
    {   self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for StubBackend
{   async fn complete_text(
      &self
    , model: &str
    , system_instruction: &str
    , prompt: &str
    ) -> Result<String, Error>
    {   self.calls.lock().unwrap().push(Call::Text
        {   model: model.to_string()
          , system: system_instruction.to_string()
          , prompt: prompt.to_string()
        });
        self.text_result.clone()
    }

    async fn synthesize_image(
      &self
    , model: &str
    , _prompt: &str
    , aspect_ratio: &str
    , count: u32
    ) -> Result<Vec<MediaPayload>, Error>
    {   self.calls.lock().unwrap().push(Call::Image
        {   model: model.to_string()
          , aspect_ratio: aspect_ratio.to_string()
          , count
        });
        self.image_result.clone()
    }

    async fn start_video_job(
      &self
    , model: &str
    , _prompt: &str
    , _aspect_ratio: Option<&str>
    ) -> Result<VideoJob, Error>
    {   self.calls.lock().unwrap().push(Call::StartVideo
        {   model: model.to_string()
        });
        Ok(VideoJob
        {   operation: "operations/stub-job".to_string()
        })
    }

    async fn poll_video_job(
      &self
    , _job: &VideoJob
    ) -> Result<VideoJobStatus, Error>
    {   self.calls.lock().unwrap().push(Call::PollVideo);
        let mut statuses
          = self.video_statuses.lock().unwrap();
        if statuses.is_empty()
        {   Ok(VideoJobStatus::Pending)
        } else
        {   Ok(statuses.remove(0))
        }
    }

    async fn synthesize_speech(
      &self
    , model: &str
    , voice: &str
    , _utterance: &str
    ) -> Result<MediaPayload, Error>
    {   self.calls.lock().unwrap().push(Call::Speech
        {   model: model.to_string()
          , voice: voice.to_string()
        });
        self.speech_result.clone()
    }
}

fn fast_schedule() -> PollSchedule
{   PollSchedule::from_config(&agen::config::PollConfig
    {   initial_interval_ms: 1
      , backoff_multiplier: 1.0
      , max_interval_ms: 2
      , max_wait_secs: 5
    })
}

fn router_in(
  dir: &std::path::Path
, stub: StubBackend
) -> Router<StubBackend>
{   Router::new(
      stub,
      MediaStore::new(dir.to_path_buf()),
      fast_schedule()
    )
}

#[tokio::test]
async fn text_tools_route_to_text_completion()
{   for slug in [
      "script-gen", "ugc-tool",
      "auto-content", "img-to-prompt"
    ]
    {   let dir = tempfile::tempdir().unwrap();
        let stub = StubBackend::ok();
        let router = router_in(dir.path(), stub.clone());

        let result = router
          .dispatch(
            slug,
            "a prompt",
            &GenerationOptions::default()
          )
          .await
          .unwrap();

        assert_eq!(
          result.text.as_deref(),
          Some("generated text")
        );
        assert!(result.media_url.is_none());

        let calls = stub.recorded();
        assert_eq!(calls.len(), 1, "one call for {}", slug);
        match &calls[0]
        {   Call::Text { model, system, prompt } => {
              assert_eq!(model, TEXT_MODEL);
              assert_eq!(
                system, CREATIVE_SYSTEM_INSTRUCTION
              );
              assert_eq!(prompt, "a prompt");
            }
          , other => panic!(
              "expected text call, got {:?}", other
            )
        }
    }
}

#[tokio::test]
async fn unknown_tool_kind_skips_the_backend()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .dispatch(
        "face-swap",
        "a prompt",
        &GenerationOptions::default()
      )
      .await
      .unwrap();

    assert!(result.text.is_some());
    assert!(result.media_url.is_none());
    assert!(stub.recorded().is_empty());
}

#[tokio::test]
async fn unwired_tool_kinds_skip_the_backend()
{   for slug in ["img-to-img", "video-to-img"]
    {   let dir = tempfile::tempdir().unwrap();
        let stub = StubBackend::ok();
        let router = router_in(dir.path(), stub.clone());

        let result = router
          .dispatch(
            slug,
            "a prompt",
            &GenerationOptions::default()
          )
          .await
          .unwrap();

        assert!(result.text.is_some());
        assert!(result.media_url.is_none());
        assert!(stub.recorded().is_empty());
    }
}

#[tokio::test]
async fn blank_prompt_is_rejected_before_any_call()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .dispatch(
        "text-to-img",
        "   ",
        &GenerationOptions::default()
      )
      .await;

    match result
    {   Err(Error::InvalidRequest(_)) => {}
      , other => panic!(
          "expected InvalidRequest, got {:?}", other
        )
    }
    assert!(stub.recorded().is_empty());
}

#[tokio::test]
async fn banana_engine_selects_the_flash_image_model()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let options = GenerationOptions
    {   engine: Some("Banana".to_string())
      , ..Default::default()
    };
    router
      .dispatch("text-to-img", "a cat", &options)
      .await
      .unwrap();

    match &stub.recorded()[0]
    {   Call::Image { model, .. } => {
          assert_eq!(model, IMAGE_MODEL_FLASH);
        }
      , other => panic!(
          "expected image call, got {:?}", other
        )
    }
}

#[tokio::test]
async fn other_engines_select_the_pro_image_model()
{   for engine in [None, Some("Photon".to_string())]
    {   let dir = tempfile::tempdir().unwrap();
        let stub = StubBackend::ok();
        let router = router_in(dir.path(), stub.clone());

        let options = GenerationOptions
        {   engine
          , ..Default::default()
        };
        router
          .dispatch("text-to-img", "a cat", &options)
          .await
          .unwrap();

        match &stub.recorded()[0]
        {   Call::Image { model, .. } => {
              assert_eq!(model, IMAGE_MODEL_PRO);
            }
          , other => panic!(
              "expected image call, got {:?}", other
            )
        }
    }
}

#[tokio::test]
async fn image_options_are_forwarded()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let options = GenerationOptions
    {   aspect_ratio: Some("16:9".to_string())
      , image_count: Some(3)
      , ..Default::default()
    };
    router
      .dispatch("text-to-img", "a cat", &options)
      .await
      .unwrap();

    assert_eq!(
      stub.recorded()[0],
      Call::Image
      {   model: IMAGE_MODEL_PRO.to_string()
        , aspect_ratio: "16:9".to_string()
        , count: 3
      }
    );
}

#[tokio::test]
async fn veo_3_engine_selects_the_full_video_model()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let options = GenerationOptions
    {   engine: Some("Veo 3".to_string())
      , ..Default::default()
    };
    router
      .dispatch("text-to-video", "a storm", &options)
      .await
      .unwrap();

    match &stub.recorded()[0]
    {   Call::StartVideo { model } => {
          assert_eq!(model, VIDEO_MODEL_FULL);
        }
      , other => panic!(
          "expected video submit, got {:?}", other
        )
    }
}

#[tokio::test]
async fn other_engines_select_the_fast_video_model()
{   for engine in [None, Some("Veo 2".to_string())]
    {   let dir = tempfile::tempdir().unwrap();
        let stub = StubBackend::ok();
        let router = router_in(dir.path(), stub.clone());

        let options = GenerationOptions
        {   engine
          , ..Default::default()
        };
        router
          .dispatch("text-to-video", "a storm", &options)
          .await
          .unwrap();

        match &stub.recorded()[0]
        {   Call::StartVideo { model } => {
              assert_eq!(model, VIDEO_MODEL_FAST);
            }
          , other => panic!(
              "expected video submit, got {:?}", other
            )
        }
    }
}

#[tokio::test]
async fn provider_errors_surface_verbatim()
{   let dir = tempfile::tempdir().unwrap();
    let mut stub = StubBackend::ok();
    stub.text_result = Err(Error::ApiError(
      "quota exceeded for model".to_string()
    ));
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .dispatch(
        "script-gen",
        "a prompt",
        &GenerationOptions::default()
      )
      .await;

    assert_eq!(
      result,
      Err(Error::ApiError(
        "quota exceeded for model".to_string()
      ))
    );
}

#[tokio::test]
async fn video_wait_survives_pending_polls()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    *stub.video_statuses.lock().unwrap() = vec![
      VideoJobStatus::Pending,
      VideoJobStatus::Pending,
      VideoJobStatus::Complete(
        "https://example.com/done.mp4".to_string()
      ),
    ];
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .dispatch(
        "text-to-video",
        "a storm",
        &GenerationOptions::default()
      )
      .await
      .unwrap();

    assert_eq!(
      result.media_url.as_deref(),
      Some("https://example.com/done.mp4")
    );
    assert!(result.text.is_some());

    let polls = stub.recorded().iter()
      .filter(|c| **c == Call::PollVideo)
      .count();
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn failed_video_job_surfaces_the_provider_message()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    *stub.video_statuses.lock().unwrap() = vec![
      VideoJobStatus::Failed(
        "render exploded".to_string()
      ),
    ];
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .dispatch(
        "text-to-video",
        "a storm",
        &GenerationOptions::default()
      )
      .await;

    assert_eq!(
      result,
      Err(Error::JobFailed("render exploded".to_string()))
    );
}

#[tokio::test]
async fn video_wait_gives_up_at_the_deadline()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    // Never completes
    *stub.video_statuses.lock().unwrap() = vec![];
    let schedule = PollSchedule::from_config(
      &agen::config::PollConfig
      {   initial_interval_ms: 1
        , backoff_multiplier: 1.0
        , max_interval_ms: 2
        , max_wait_secs: 0
      }
    );
    let router = Router::new(
      stub.clone(),
      MediaStore::new(dir.path().to_path_buf()),
      schedule
    );

    let result = router
      .dispatch(
        "text-to-video",
        "a storm",
        &GenerationOptions::default()
      )
      .await;

    assert_eq!(result, Err(Error::JobTimedOut));
}

#[tokio::test]
async fn cancelled_token_aborts_the_video_wait()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    *stub.video_statuses.lock().unwrap() = vec![];
    let router = router_in(dir.path(), stub.clone());

    let token = CancellationToken::new();
    token.cancel();

    let result = router
      .dispatch_with_cancel(
        "text-to-video",
        "a storm",
        &GenerationOptions::default(),
        &token
      )
      .await;

    assert_eq!(result, Err(Error::Cancelled));
    let polls = stub.recorded().iter()
      .filter(|c| **c == Call::PollVideo)
      .count();
    assert_eq!(polls, 0);
}

#[tokio::test]
async fn speech_payload_is_wrapped_and_persisted()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .dispatch(
        "text-to-speech",
        "hello there",
        &GenerationOptions::default()
      )
      .await
      .unwrap();

    match &stub.recorded()[0]
    {   Call::Speech { model, voice } => {
          assert_eq!(model, TTS_MODEL);
          assert_eq!(voice, TTS_VOICE);
        }
      , other => panic!(
          "expected speech call, got {:?}", other
        )
    }

    let url = result.media_url.unwrap();
    let path = url.strip_prefix("file://").unwrap();
    assert!(path.ends_with(".wav"));

    let bytes = std::fs::read(path).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
    // 44-byte header plus the 4 stub PCM bytes
    assert_eq!(bytes.len(), 48);
}

#[tokio::test]
async fn image_payload_is_persisted_to_a_file_url()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .dispatch(
        "text-to-img",
        "a cat",
        &GenerationOptions::default()
      )
      .await
      .unwrap();

    let url = result.media_url.unwrap();
    let path = url.strip_prefix("file://").unwrap();
    assert!(path.ends_with(".png"));

    let bytes = std::fs::read(path).unwrap();
    assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
}

#[tokio::test]
async fn video_script_uses_the_script_writer_instruction()
{   let dir = tempfile::tempdir().unwrap();
    let mut stub = StubBackend::ok();
    stub.text_result = Ok("INT. OFFICE - DAY".to_string());
    let router = router_in(dir.path(), stub.clone());

    let script = router
      .generate_video_script("Rust ownership", "Playful")
      .await
      .unwrap();

    assert_eq!(script, "INT. OFFICE - DAY");
    match &stub.recorded()[0]
    {   Call::Text { system, prompt, .. } => {
          assert_eq!(
            system, SCRIPT_WRITER_SYSTEM_INSTRUCTION
          );
          assert!(prompt.contains("Rust ownership"));
          assert!(prompt.contains("Playful"));
        }
      , other => panic!(
          "expected text call, got {:?}", other
        )
    }
}

#[tokio::test]
async fn video_script_errors_are_not_swallowed()
{   let dir = tempfile::tempdir().unwrap();
    let mut stub = StubBackend::ok();
    stub.text_result = Err(Error::HttpError(
      "connection refused".to_string()
    ));
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .generate_video_script("Rust ownership", "Playful")
      .await;

    assert_eq!(
      result,
      Err(Error::HttpError("connection refused".to_string()))
    );
}

#[tokio::test]
async fn blank_topic_is_rejected_before_any_call()
{   let dir = tempfile::tempdir().unwrap();
    let stub = StubBackend::ok();
    let router = router_in(dir.path(), stub.clone());

    let result = router
      .generate_video_script("  ", "Playful")
      .await;

    match result
    {   Err(Error::InvalidRequest(_)) => {}
      , other => panic!(
          "expected InvalidRequest, got {:?}", other
        )
    }
    assert!(stub.recorded().is_empty());
}

#[test]
fn poll_intervals_back_off_and_cap()
{   let schedule = PollSchedule::from_config(
      &agen::config::PollConfig
      {   initial_interval_ms: 100
        , backoff_multiplier: 2.0
        , max_interval_ms: 300
        , max_wait_secs: 60
      }
    );

    assert_eq!(
      schedule.interval_for_attempt(0).as_millis(), 100
    );
    assert_eq!(
      schedule.interval_for_attempt(1).as_millis(), 200
    );
    assert_eq!(
      schedule.interval_for_attempt(2).as_millis(), 300
    );
    assert_eq!(
      schedule.interval_for_attempt(5).as_millis(), 300
    );
}
