use nv_api::DiscoverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The credential was rejected; no organization can be scanned.
    #[error("the API key was rejected; check NETVAULT_API_KEY")]
    Auth,

    #[error(transparent)]
    Discover(DiscoverError),
}

impl From<DiscoverError> for ExtractError {
    fn from(e: DiscoverError) -> Self {
        match e {
            DiscoverError::Auth => Self::Auth,
            other => Self::Discover(other),
        }
    }
}
