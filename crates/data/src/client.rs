//! Shared HTTP plumbing for the exchange and regulator downloads.

use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not a zip archive")]
    NotAnArchive(PathBuf),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Builds a client sending `user_agent` with a whole-request `timeout`.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}

/// Fails with `FetchError::Status` unless the response is 2xx.
pub(crate) fn check_status(response: &reqwest::Response) -> Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}
