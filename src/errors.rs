use thiserror::Error;

/// Failures a caller may want to tell apart from plain I/O errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("IMAP login rejected for {account}: {reason}")]
    Authentication { account: String, reason: String },

    #[error("Words API responded with {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("message {id} could not be parsed")]
    MalformedMessage { id: String },
}
