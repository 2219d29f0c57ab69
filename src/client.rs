use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info};
use crate::AgenFoot;

/// Backend state for routing generation requests
pub struct AgenBackendState
{   pub config: crate::config::RouterConfig
}

impl AgenBackendState
{   /// Create a new backend state
    pub fn new(config: crate::config::RouterConfig) -> Self
    {   debug!("Initializing AgenBackendState");
        AgenBackendState
        {   config
        }
    }

    /// Build a fresh router from the current configuration
    /// The router is stateless, so per-request construction
    /// and caching are equally correct
    fn build_router(&self)
      -> Result<
          Arc<crate::router::Router<
            crate::providers::GeminiBackend
          >>,
          crate::error::Error
        >
    {   crate::router::gemini_router(&self.config)
          .map(Arc::new)
    }
}

/// Public API for the AGEN backend - owns the task
pub struct AgenBackend
{   hand: crate::AgenHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl AgenBackend
{   /// Create and spawn a new AGEN backend
    /// Returns immediately - spawns background task
    pub fn new(
      config: crate::config::RouterConfig
    ) -> Self
    {   debug!("Creating AgenBackend with task ownership");

        let (dispatch_tx, dispatch_rx)
          = mpsc::unbounded_channel();
        let (generate_video_script_tx
             , generate_video_script_rx)
          = mpsc::unbounded_channel();
        let (set_api_key_tx, set_api_key_rx)
          = mpsc::unbounded_channel();
        let (get_engines_tx, get_engines_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::AgenHand
        {   dispatch_tx: dispatch_tx.clone()
          , generate_video_script_tx
              : generate_video_script_tx.clone()
          , set_api_key_tx: set_api_key_tx.clone()
          , get_engines_tx: get_engines_tx.clone()
          , kill_process_tx: kill_process_tx.clone()
        };

        let foot = crate::AgenFoot
        {   dispatch_rx
          , generate_video_script_rx
          , set_api_key_rx
          , get_engines_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, config).await
        });

        AgenBackend
        {   hand
          , _task_handle
        }
    }

    /// Queue a dispatch - returns almost immediately
    pub async fn dispatch(
      &self
    , tool_kind: String
    , prompt: String
    , options: crate::request::GenerationOptions
    ) -> Result<
        mpsc::UnboundedReceiver<crate::DispatchReply>,
        crate::error::Error
      >
    {   debug!("dispatch queuing command for: {}", tool_kind);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::DispatchArgs
        {   tool_kind
          , prompt
          , options
          , reply: reply_tx
        };

        self.hand.dispatch_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a video script generation - returns almost
    /// immediately
    pub async fn generate_video_script(
      &self
    , topic: String
    , tone: String
    ) -> Result<
        mpsc::UnboundedReceiver
          <crate::GenerateVideoScriptReply>,
        crate::error::Error
      >
    {   debug!(
          "generate_video_script queuing for: {}", topic
        );
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GenerateVideoScriptArgs
        {   topic
          , tone
          , reply: reply_tx
        };

        self.hand.generate_video_script_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Replace the API key used for subsequent requests
    pub async fn set_api_key(
      &self
    , key: String
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SetApiKeyReply>,
        crate::error::Error
      >
    {   debug!("set_api_key queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SetApiKeyArgs
        {   key
          , reply: reply_tx
        };

        self.hand.set_api_key_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Fetch the engine catalog
    pub async fn get_engines(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetEnginesReply>,
        crate::error::Error
      >
    {   debug!("get_engines queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GetEnginesArgs
        {   reply: reply_tx
        };

        self.hand.get_engines_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down AgenBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown timeout");
            Err(crate::error::Error::Timeout)
        }
    }
}

/// Main backend event loop
///
/// Design: tokio::select! is ONLY for fast queueing.
/// Generation work is spawned onto its own task, so a slow
/// video poll never blocks the queue or other requests.
async fn run_backend_loop(
  foot: crate::AgenFoot
, config: crate::config::RouterConfig
)
{   debug!("Starting AgenBackend event loop");
    let mut state = AgenBackendState::new(config);
    let AgenFoot
    {   mut dispatch_rx
      , mut generate_video_script_rx
      , mut set_api_key_rx
      , mut get_engines_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = dispatch_rx.recv() => {
          debug!(
            "Received Dispatch for tool: {}", cmd.tool_kind
          );

          match state.build_router()
          {   Ok(router) => {
                tokio::spawn(async move {
                  let result = router
                    .dispatch(
                      &cmd.tool_kind,
                      &cmd.prompt,
                      &cmd.options
                    )
                    .await;
                  let _ = cmd.reply.send(result);
                });
              }
            , Err(e) => {
                error!("Cannot build router: {}", e);
                let _ = cmd.reply.send(Err(e));
              }
          }
        }
      , Some(cmd) = generate_video_script_rx.recv() => {
          debug!(
            "Received GenerateVideoScript for: {}", cmd.topic
          );

          match state.build_router()
          {   Ok(router) => {
                tokio::spawn(async move {
                  let result = router
                    .generate_video_script(
                      &cmd.topic,
                      &cmd.tone
                    )
                    .await;
                  let _ = cmd.reply.send(result);
                });
              }
            , Err(e) => {
                error!("Cannot build router: {}", e);
                let _ = cmd.reply.send(Err(e));
              }
          }
        }
      , Some(cmd) = set_api_key_rx.recv() => {
          debug!("Received SetApiKey");
          state.config.api_key = Some(cmd.key);
          let _ = cmd.reply.send(Ok(()));
        }
      , Some(cmd) = get_engines_rx.recv() => {
          debug!("Received GetEngines");
          let _ = cmd.reply.send(Ok(
            crate::providers::gemini::engine_catalog()
          ));
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("AgenBackend shutting down");
          break;
        }
      }
    }
}
