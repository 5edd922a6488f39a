use std::fmt;

/// Coarse classification of every [`Error`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind
{   /// Fatal setup problem, never retried
    Configuration
  , /// Network failure, timeout or non-success HTTP status
    Transport
  , /// Anything else that went wrong around the call
    Call
  , /// The model answered but the answer is unusable
    ResponseShape
}

/// Custom error type for agentmedia operations
/// Implements Clone so results can be handed across tasks freely
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// API key is missing or empty
    MissingApiKey(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Request rejected before it was sent
    InvalidRequest(String)
  , /// HTTP transport error
    HttpError(String)
  , /// API returned a non-success status
    ApiError
    {   status: u16
      , body: String
    }
  , /// Timeout error
    Timeout
  , /// Failed to decode the API reply envelope
    ParseError(String)
  , /// No choices in API response
    NoChoicesInResponse
  , /// Model reply is not valid JSON
    InvalidResponse
    {   agent: String
      , preview: String
    }
  , /// Model reply is JSON but does not fit the agent's report
    SchemaViolation
    {   agent: String
      , reason: String
    }
  , /// Generic error
    Other(String)
}

impl Error
{   /// Taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind
    {   match self
        {   Error::MissingApiKey(_)
          | Error::InvalidConfiguration(_) => ErrorKind::Configuration
          , Error::HttpError(_)
          | Error::ApiError { .. }
          | Error::Timeout => ErrorKind::Transport
          , Error::InvalidResponse { .. }
          | Error::SchemaViolation { .. } => ErrorKind::ResponseShape
          , Error::InvalidRequest(_)
          | Error::ParseError(_)
          | Error::NoChoicesInResponse
          | Error::Other(_) => ErrorKind::Call
        }
    }

    pub fn is_transport(&self) -> bool
    {   self.kind() == ErrorKind::Transport
    }

    pub fn is_response_shape(&self) -> bool
    {   self.kind() == ErrorKind::ResponseShape
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey(var) => {
              write!(f, "Missing API key: {}", var)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::InvalidRequest(msg) => {
              write!(f, "Invalid request: {}", msg)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, body } => {
              write!(f, "API error ({}): {}", status, body)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::InvalidResponse { agent, preview } => {
              write!(f,
                "Invalid JSON response from {}: {}",
                agent, preview
              )
            }
          , Error::SchemaViolation { agent, reason } => {
              write!(f,
                "Response from {} does not match its schema: {}",
                agent, reason
              )
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

pub type Result<T> = std::result::Result<T, Error>;
