use std::fmt;

/// Custom error type for AGEN operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// No API key available from config or environment
    MissingCredential
  , /// Request failed precondition checks
    InvalidRequest(String)
  , /// HTTP request error
    HttpError(String)
  , /// API returned an error response
    ApiError(String)
  , /// Failed to parse API response
    ParseError(String)
  , /// No candidates in API response
    NoCandidatesInResponse
  , /// Failed to decode a binary media payload
    MediaDecode(String)
  , /// Provider reported a failed generation job
    JobFailed(String)
  , /// Gave up waiting on a generation job
    JobTimedOut
  , /// Caller cancelled while waiting on a job
    Cancelled
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Timeout error
    Timeout
  , /// Generic error
    Other(String)
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingCredential => {
              write!(f,
                "No API key found in config or environment"
              )
            }
          , Error::InvalidRequest(msg) => {
              write!(f, "Invalid request: {}", msg)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError(msg) => {
              write!(f, "API error: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoCandidatesInResponse => {
              write!(f, "API response contained no candidates")
            }
          , Error::MediaDecode(msg) => {
              write!(f, "Media decode error: {}", msg)
            }
          , Error::JobFailed(msg) => {
              write!(f, "Generation job failed: {}", msg)
            }
          , Error::JobTimedOut => {
              write!(f,
                "Timed out waiting for a generation job"
              )
            }
          , Error::Cancelled => {
              write!(f, "Request cancelled by caller")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
