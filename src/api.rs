//! CameraHub API client.
//!
//! The remote service is treated as an opaque, basic-auth'd HTTP collaborator.
//! List endpoints return DRF-style pages: `{ "count": N, "results": [...] }`.

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the remote CameraHub service.
///
/// Per-file handling distinguishes "record vanished" ([`ApiError::NotFound`])
/// from transport and server failures; all of them skip the current file and
/// let the run continue. Only [`ApiError::Unauthorized`] during the initial
/// credential check aborts the run.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("credentials rejected by {0}")]
    Unauthorized(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("server returned {status}: {message}")]
    Remote { status: StatusCode, message: String },
}

/// A DRF-style paginated response page.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub results: Vec<T>,
}

/// A Negative candidate returned by the `/negative/` search.
#[derive(Debug, Clone, Deserialize)]
pub struct NegativeRecord {
    /// Stable identifier, e.g. `123.22`.
    pub slug: String,
    pub film: String,
    pub frame: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// A full Scan record, as returned by `/scan/?uuid=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRecord {
    pub uuid: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub negative: Option<NegativeDetail>,
}

/// Everything the catalogue knows about the negative behind a scan.
///
/// All fields are optional: CameraHub users fill in as much or as little as
/// they know about each exposure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NegativeDetail {
    pub slug: String,
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub film_stock: Option<String>,
    #[serde(default)]
    pub camera_make: Option<String>,
    #[serde(default)]
    pub camera_model: Option<String>,
    #[serde(default)]
    pub camera_serial: Option<String>,
    #[serde(default)]
    pub lens_make: Option<String>,
    #[serde(default)]
    pub lens_model: Option<String>,
    #[serde(default)]
    pub lens_serial: Option<String>,
    #[serde(default)]
    pub focal_length: Option<u32>,
    #[serde(default)]
    pub focal_length_35mm: Option<u32>,
    #[serde(default)]
    pub aperture: Option<f64>,
    #[serde(default)]
    pub shutter_speed: Option<String>,
    #[serde(default)]
    pub film_speed: Option<u32>,
    #[serde(default)]
    pub photographer: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Body for `POST /scan/`, associating a new Scan with a Negative.
#[derive(Debug, Serialize)]
struct NewScan<'a> {
    negative: &'a str,
    filename: &'a str,
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct CreatedScan {
    uuid: String,
}

/// Client for a single CameraHub server, reused for the whole run.
pub struct ApiClient {
    http: Client,
    server: String,
    username: String,
    password: String,
}

impl ApiClient {
    pub fn new(server: &str, username: &str, password: &str) -> Result<Self, ApiError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            server: server.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{path}", self.server))
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Validate the profile's credentials with a cheap authenticated request.
    pub async fn test_credentials(&self) -> Result<(), ApiError> {
        let resp = self.get("/camera/").send().await?;
        match resp.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::Unauthorized(self.server.clone()))
            }
            status => Err(ApiError::Remote {
                status,
                message: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Search for negatives matching a film ID and frame number.
    ///
    /// Returns every candidate; the matching policy (auto-select, confirm,
    /// choose) lives in the pipeline, not here.
    pub async fn find_negatives(
        &self,
        film: &str,
        frame: &str,
    ) -> Result<Vec<NegativeRecord>, ApiError> {
        let resp = self
            .get("/negative/")
            .query(&[("film", film), ("frame", frame)])
            .send()
            .await?;
        let page: Paginated<NegativeRecord> = Self::check(resp).await?.json().await?;
        log::debug!(
            "Negative search film={film} frame={frame}: {} candidate(s)",
            page.count
        );
        Ok(page.results)
    }

    /// Create a Scan record for a negative and return its UUID.
    pub async fn create_scan(&self, negative: &str, filename: &str) -> Result<String, ApiError> {
        let body = NewScan {
            negative,
            filename,
            date: chrono::Local::now().date_naive(),
        };
        let resp = self
            .http
            .post(format!("{}/scan/", self.server))
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;
        let created: CreatedScan = Self::check(resp).await?.json().await?;
        Ok(created.uuid)
    }

    /// Fetch the full Scan record for a UUID.
    ///
    /// The record can vanish between match and fetch (deleted server-side);
    /// that surfaces as [`ApiError::NotFound`].
    pub async fn get_scan(&self, uuid: &str) -> Result<ScanRecord, ApiError> {
        let resp = self.get("/scan/").query(&[("uuid", uuid)]).send().await?;
        let mut page: Paginated<ScanRecord> = Self::check(resp).await?.json().await?;
        if page.count == 1 && page.results.len() == 1 {
            Ok(page.results.remove(0))
        } else {
            Err(ApiError::NotFound("scan"))
        }
    }

    /// Map non-success statuses to [`ApiError`] before body parsing.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let url = resp.url().to_string();
            return Err(ApiError::Unauthorized(url));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound("record"));
        }
        Err(ApiError::Remote {
            status,
            message: resp.text().await.unwrap_or_default(),
        })
    }
}
