//! HTTP client for the DDS coverage service.
//!
//! Two endpoints are used:
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | [`DdsClient::get_dates`] | `GET {server}/coverages/{id}/{from}/{to}` | JSON array of `YYYYmmddHHMM` stamps |
//! | [`DdsClient::get_data`] | `GET {server}/coverages/{id}/{date}/{variable}/{level}` | NetCDF file |
//!
//! Path segments are percent-encoded. Requests use HTTP basic auth and are
//! not retried.

pub mod error;

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use forcing_common::time::{format_compact, parse_datetime};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, instrument};

pub use error::{DdsError, DdsResult};

/// Service location and account.
#[derive(Clone, Deserialize)]
pub struct DdsCredentials {
    pub server: String,
    pub user: String,
    pub password: String,
}

impl DdsCredentials {
    pub fn new(
        server: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for DdsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdsCredentials")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client for one DDS server.
pub struct DdsClient {
    client: Client,
    base_url: Url,
    credentials: DdsCredentials,
}

impl DdsClient {
    /// Create a client with a 10 minute request timeout.
    pub fn new(credentials: DdsCredentials) -> DdsResult<Self> {
        Self::with_timeout(credentials, Duration::from_secs(600))
    }

    pub fn with_timeout(credentials: DdsCredentials, timeout: Duration) -> DdsResult<Self> {
        let not_http = || {
            DdsError::Config(format!(
                "server must be an http(s) URL, got '{}'",
                credentials.server
            ))
        };
        let base_url = Url::parse(credentials.server.trim()).map_err(|_| not_http())?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(not_http());
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn dates_url(&self, data_id: &str, from: &DateTime<Utc>, to: &DateTime<Utc>) -> Url {
        self.coverage_url(&[data_id, &format_compact(from), &format_compact(to)])
    }

    pub fn data_url(
        &self,
        data_id: &str,
        date: &DateTime<Utc>,
        variable: &str,
        level: &str,
    ) -> Url {
        self.coverage_url(&[data_id, &format_compact(date), variable, level])
    }

    /// `{server}/coverages/` followed by `segments`, each percent-encoded.
    fn coverage_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // The base was checked to have a path when the client was built
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("coverages").extend(segments);
        }
        url
    }

    /// Dates with data for `data_id` between `from` and `to`, ascending.
    #[instrument(skip(self, from, to), fields(from = %format_compact(from), to = %format_compact(to)))]
    pub async fn get_dates(
        &self,
        data_id: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> DdsResult<Vec<DateTime<Utc>>> {
        let url = self.dates_url(data_id, from, to);
        let body = self.get(url.clone()).await?;
        let dates = parse_dates(url.as_str(), &body)?;
        info!(count = dates.len(), "Listed available dates");
        Ok(dates)
    }

    /// Raw NetCDF bytes of `variable` at `level` for one date.
    #[instrument(skip(self, date), fields(date = %format_compact(date)))]
    pub async fn get_data(
        &self,
        data_id: &str,
        date: &DateTime<Utc>,
        variable: &str,
        level: &str,
    ) -> DdsResult<Bytes> {
        let url = self.data_url(data_id, date, variable, level);
        let body = self.get(url).await?;
        info!(bytes = body.len(), "Downloaded coverage");
        Ok(body)
    }

    async fn get(&self, url: Url) -> DdsResult<Bytes> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DdsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(response.bytes().await?)
    }
}

/// Decode a JSON array of date stamps, sorted ascending.
pub fn parse_dates(url: &str, body: &[u8]) -> DdsResult<Vec<DateTime<Utc>>> {
    let invalid = |reason: String| DdsError::InvalidResponse {
        url: url.to_string(),
        reason,
    };

    let stamps: Vec<String> =
        serde_json::from_slice(body).map_err(|e| invalid(format!("expected a JSON array of dates: {}", e)))?;
    let mut dates = stamps
        .iter()
        .map(|s| parse_datetime(s).map_err(|e| invalid(e.to_string())))
        .collect::<DdsResult<Vec<_>>>()?;
    dates.sort();
    Ok(dates)
}
