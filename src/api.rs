// API client module: the `MediaClient` seam the upload flow talks to, and a
// blocking HTTP implementation of it that speaks to the media service.

use std::fmt;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

/// Capabilities of the external media service. Each call blocks until the
/// service answers.
pub trait MediaClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()>;
    fn photo_upload(&mut self, path: &str, caption: &str) -> Result<Media>;
    fn album_upload(&mut self, paths: &[String], caption: &str) -> Result<Media>;
    fn logout(&mut self) -> Result<()>;
}

/// The created media item as returned by the service. Its shape belongs to
/// the service, so it is kept as raw JSON and only printed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Media(pub serde_json::Value);

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.0) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

/// Login request payload.
#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    token: String,
}

/// Environment variable holding the base URL of the media service.
pub const API_URL_ENV: &str = "INSTA_POST_API_URL";

/// Base URL used when `INSTA_POST_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Blocking HTTP client for the media service. The session token and any
/// cookies live only as long as this value.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create an ApiClient for the URL in `INSTA_POST_API_URL`, or
    /// `http://localhost:3001` when it is unset.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(&base_url)
    }

    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            let val = HeaderValue::from_str(&format!("Bearer {}", t))
                .context("Session token is not a valid header value")?;
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.post(self.url(path)).headers(self.auth_headers()?))
    }

    fn send_media(&self, path: &str, form: multipart::Form, what: &str) -> Result<Media> {
        let res = self
            .post(path)?
            .multipart(form)
            .send()
            .with_context(|| format!("Failed to send {} request", what))?;
        let res = ensure_success(res, what)?;
        res.json::<Media>()
            .with_context(|| format!("Parsing {} response json", what))
    }
}

impl MediaClient for ApiClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let res = self
            .post("/login")?
            .json(&LoginRequest { username, password })
            .send()
            .context("Failed to send login request")?;
        let res = ensure_success(res, "login")?;
        let resp: LoginResponse = res.json().context("Parsing login response json")?;
        self.token = Some(resp.token);
        Ok(())
    }

    fn photo_upload(&mut self, path: &str, caption: &str) -> Result<Media> {
        let form = multipart::Form::new()
            .text("caption", caption.to_string())
            .part("photo", file_part(path)?);
        self.send_media("/media/photo", form, "photo upload")
    }

    fn album_upload(&mut self, paths: &[String], caption: &str) -> Result<Media> {
        let mut form = multipart::Form::new().text("caption", caption.to_string());
        for path in paths {
            form = form.part("photos", file_part(path)?);
        }
        self.send_media("/media/album", form, "album upload")
    }

    fn logout(&mut self) -> Result<()> {
        let res = self
            .post("/logout")?
            .send()
            .context("Failed to send logout request")?;
        ensure_success(res, "logout")?;
        self.token = None;
        Ok(())
    }
}

/// Turn a non-success status into an error carrying the response body.
fn ensure_success(res: Response, what: &str) -> Result<Response> {
    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().unwrap_or_else(|_| "".into());
        anyhow::bail!("{} failed: {} - {}", capitalize(what), status, txt);
    }
    Ok(res)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn file_part(path: &str) -> Result<multipart::Part> {
    let file = File::open(path).with_context(|| format!("Failed to open image file {}", path))?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    multipart::Part::reader(file)
        .file_name(file_name)
        .mime_str(mime_for(path))
        .context("Invalid mime type")
}

/// Content type sent for an image file, from its extension alone.
fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
