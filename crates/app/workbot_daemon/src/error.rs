use thiserror::Error;
use workbot_core::backend::BackendError;
use workbot_core::credential::CredentialError;
use workbot_core::helix::HelixError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("Credential: {0}")]
    Credential(#[from] CredentialError),

    #[error("Helix: {0}")]
    Helix(#[from] HelixError),

    #[error("Backend: {0}")]
    Backend(#[from] BackendError),

    /// The validated token did not identify a user.
    #[error("Access token is not bound to a user; a user access token is required")]
    MissingBotUserId,

    #[error("Channel '{0}' does not exist")]
    UnknownChannel(String),
}
