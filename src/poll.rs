//! Polling for long-running video generation jobs
//!
//! A submitted job walks Submitted -> Polling -> Succeeded or
//! Failed, with bounded exponential backoff between polls, an
//! overall deadline, and cooperative cancellation.

use std::time::Duration;
use log::{debug, trace, info, warn, error};
use tokio_util::sync::CancellationToken;

use crate::providers::{
  GenerationBackend, VideoJob, VideoJobStatus
};

/// Lifecycle of a submitted video job
#[derive(Debug, Clone, PartialEq)]
pub enum VideoJobState
{   /// Accepted by the provider, not yet polled
    Submitted
  , /// Waiting on the provider, with the poll attempt count
    Polling(usize)
  , /// Finished; provider URL of the rendered video
    Succeeded(String)
  , /// Provider reported failure
    Failed(String)
}

/// Poll schedule with bounded exponential backoff
#[derive(Debug, Clone)]
pub struct PollSchedule
{   initial_interval: Duration
  , backoff_multiplier: f32
  , max_interval: Duration
  , max_wait: Duration
}

impl PollSchedule
{   /// Build a schedule from polling configuration
    pub fn from_config(
      config: &crate::config::PollConfig
    ) -> Self
    {   PollSchedule
        {   initial_interval: Duration::from_millis(
              config.initial_interval_ms
            )
          , backoff_multiplier: config.backoff_multiplier
          , max_interval: Duration::from_millis(
              config.max_interval_ms
            )
          , max_wait: Duration::from_secs(
              config.max_wait_secs
            )
        }
    }

    /// Interval to sleep before the given poll attempt
    pub fn interval_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   let multiplier
          = self.backoff_multiplier.powi(attempt as i32);
        let interval = Duration::from_millis(
          (self.initial_interval.as_millis() as f32
            * multiplier) as u64
        );
        interval.min(self.max_interval)
    }

    /// Total time budget for the job
    pub fn max_wait(&self) -> Duration
    {   self.max_wait
    }
}

impl Default for PollSchedule
{   fn default() -> Self
    {   PollSchedule::from_config(
          &crate::config::PollConfig::default()
        )
    }
}

/// Wait for a submitted video job to finish
/// Returns the provider URL of the rendered video
pub async fn await_video<B: GenerationBackend>(
  backend: &B
, job: &VideoJob
, schedule: &PollSchedule
, cancel: Option<&CancellationToken>
) -> Result<String, crate::error::Error>
{   debug!("Awaiting video job: {}", job.operation);
    let started = tokio::time::Instant::now();
    let mut state = VideoJobState::Submitted;
    trace!("Job {} state: {:?}", job.operation, state);
    let mut attempt = 0usize;

    loop
    {   let interval = schedule.interval_for_attempt(attempt);
        if started.elapsed() + interval > schedule.max_wait()
        {   warn!(
              "Giving up on job {} after {:?}",
              job.operation,
              started.elapsed()
            );
            return Err(crate::error::Error::JobTimedOut);
        }

        sleep_or_cancel(interval, cancel).await?;

        state = VideoJobState::Polling(attempt + 1);
        trace!("Job {} state: {:?}", job.operation, state);

        match backend.poll_video_job(job).await?
        {   VideoJobStatus::Pending => {
              debug!(
                "Job {} still rendering (poll {})",
                job.operation,
                attempt + 1
              );
              attempt += 1;
            }
          , VideoJobStatus::Complete(uri) => {
              state = VideoJobState::Succeeded(uri.clone());
              info!(
                "Job {} state: {:?}",
                job.operation, state
              );
              return Ok(uri);
            }
          , VideoJobStatus::Failed(message) => {
              state = VideoJobState::Failed(message.clone());
              error!(
                "Job {} state: {:?}",
                job.operation, state
              );
              return Err(crate::error::Error::JobFailed(
                message
              ));
            }
        }
    }
}

/// Sleep for the poll interval, aborting if the caller
/// cancels first
async fn sleep_or_cancel(
  interval: Duration
, cancel: Option<&CancellationToken>
) -> Result<(), crate::error::Error>
{   match cancel
    {   Some(token) => {
          tokio::select!
          {   _ = token.cancelled() => {
                info!("Video wait cancelled by caller");
                Err(crate::error::Error::Cancelled)
              }
            , _ = tokio::time::sleep(interval) => Ok(())
          }
        }
      , None => {
          tokio::time::sleep(interval).await;
          Ok(())
        }
    }
}
