//! Downloading plugin archives.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::error::{PackError, PackResult};

/// Maximum number of redirects followed per download.
const MAX_REDIRECTS: usize = 10;

/// Retrieves a remote archive into a local file.
///
/// The reconciler only talks to the network through this trait, so tests
/// can substitute a local implementation.
pub trait ArchiveFetcher {
    /// Download `url` into `dest`, creating or truncating it.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success response, or
    /// if `dest` cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> PackResult<u64>;
}

/// Blocking HTTP(S) fetcher.
///
/// Downloads are not time-limited: a slow mirror is waited on rather than
/// abandoned half way.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the packsmith user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> PackResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("packsmith/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|source| PackError::Http {
                url: "(client setup)".to_string(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> PackResult<u64> {
        debug!(url, dest = %dest.display(), "Downloading archive");

        let mut response = self.client.get(url).send().map_err(|source| PackError::Http {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(PackError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file =
            File::create(dest).map_err(|e| PackError::io("failed to create", dest, e))?;
        let written = response
            .copy_to(&mut file)
            .map_err(|source| PackError::Http {
                url: url.to_string(),
                source,
            })?;

        debug!(url, bytes = written, "Download complete");
        Ok(written)
    }
}
