//! Remote profile client
//!
//! Read-only client for the profile endpoint `GET {base}/users/{username}`.
//! The trait seam exists so tools can run against a mock source in tests;
//! the HTTP implementation is the only one shipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{RemoteError, Result};

/// Profile payload as served by the remote endpoint. Everything except the
/// login and numeric id may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub login: String,
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the profile for `username`. Any non-2xx response is an error.
    async fn fetch(&self, username: &str) -> Result<Profile>;
}

pub struct HttpProfileSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProfileSource {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        // The GitHub API rejects requests without a User-Agent
        let client = reqwest::Client::builder()
            .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Network)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch(&self, username: &str) -> Result<Profile> {
        let url = format!("{}/users/{}", self.base_url, username);
        debug!(%url, "fetching profile");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(RemoteError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                username: username.to_string(),
            }
            .into());
        }

        let profile = response
            .json::<Profile>()
            .await
            .map_err(RemoteError::Network)?;
        Ok(profile)
    }
}
