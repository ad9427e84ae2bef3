pub mod models;

pub use models::{
    FileListReply, GeneratedFile, GenerationReply, GenerationRequest, LoginReply, LoginRequest,
    RegisterReply, RegisterRequest, SessionCheckReply,
};

use std::{fmt, str::FromStr};

use anyhow::bail;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::session::SessionToken;

pub const SESSION_HEADER: &str = "X-Session-ID";
const BODY_PREVIEW_CHARS: usize = 500;

/// Failure to obtain a usable reply: connection problems or unparsable bodies.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected reply from {path}: {detail}")]
    Decode { path: String, detail: String },

    #[error("cannot build endpoint url for {path}")]
    Endpoint { path: String },
}

/// Where the generation call carries the session identifier.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SessionChannel {
    Header,
    Body,
    #[default]
    Both,
}

impl SessionChannel {
    pub fn in_header(self) -> bool {
        matches!(self, SessionChannel::Header | SessionChannel::Both)
    }

    pub fn in_body(self) -> bool {
        matches!(self, SessionChannel::Body | SessionChannel::Both)
    }
}

impl fmt::Display for SessionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionChannel::Header => write!(f, "header"),
            SessionChannel::Body => write!(f, "body"),
            SessionChannel::Both => write!(f, "both"),
        }
    }
}

impl FromStr for SessionChannel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(SessionChannel::Header),
            "body" => Ok(SessionChannel::Body),
            "both" => Ok(SessionChannel::Both),
            other => bail!("unknown session channel '{other}' (expected header, body or both)"),
        }
    }
}

/// Remote music service consumed by the controllers.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn check_session(&self, token: &SessionToken)
    -> Result<SessionCheckReply, TransportError>;

    async fn list_files(&self, token: &SessionToken) -> Result<FileListReply, TransportError>;

    /// Returns whether the backend answered with a success status.
    async fn delete_file(&self, token: &SessionToken, filename: &str)
    -> Result<bool, TransportError>;

    async fn logout(&self, token: &SessionToken) -> Result<(), TransportError>;

    async fn login(&self, request: &LoginRequest) -> Result<LoginReply, TransportError>;

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterReply, TransportError>;

    async fn generate(&self, request: &GenerationRequest)
    -> Result<GenerationReply, TransportError>;

    /// Fetch a file by the (possibly relative) URL the backend handed out.
    async fn download(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// `reqwest` implementation talking to the Flask backend.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
    channel: SessionChannel,
}

impl HttpBackend {
    pub fn new(base_url: Url, channel: SessionChannel) -> Self {
        Self {
            http: Client::new(),
            base_url,
            channel,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Endpoint {
                path: segments.join("/"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve a backend-supplied link against the base URL.
    pub fn resolve(&self, link: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(link)
            .map_err(|_| TransportError::Endpoint {
                path: link.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        let path = url.path().to_string();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| request_error(&path, source))?;
        read_json(&path, response).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, TransportError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let path = url.path().to_string();
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| request_error(&path, source))?;
        read_json(&path, response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn check_session(
        &self,
        token: &SessionToken,
    ) -> Result<SessionCheckReply, TransportError> {
        let url = self.endpoint(&["api", "check-session", token.as_str()])?;
        self.get_json(url).await
    }

    async fn list_files(&self, token: &SessionToken) -> Result<FileListReply, TransportError> {
        let url = self.endpoint(&["api", "user-files", token.as_str()])?;
        self.get_json(url).await
    }

    async fn delete_file(
        &self,
        token: &SessionToken,
        filename: &str,
    ) -> Result<bool, TransportError> {
        let url = self.endpoint(&["api", "delete-file", token.as_str(), filename])?;
        let path = url.path().to_string();
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|source| request_error(&path, source))?;
        let status = response.status();
        debug!(%status, filename, "delete reply");
        Ok(status.is_success())
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), TransportError> {
        let url = self.endpoint(&["api", "logout", token.as_str()])?;
        let path = url.path().to_string();
        self.http
            .post(url)
            .send()
            .await
            .map_err(|source| request_error(&path, source))?;
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginReply, TransportError> {
        let url = self.endpoint(&["api", "login"])?;
        self.post_json(url, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterReply, TransportError> {
        let url = self.endpoint(&["api", "register"])?;
        self.post_json(url, request).await
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationReply, TransportError> {
        let url = self.endpoint(&["generate_music"])?;
        let path = url.path().to_string();
        let payload = generation_payload(request, self.channel);

        let mut builder = self.http.post(url).json(&payload);
        if self.channel.in_header() {
            builder = builder.header(SESSION_HEADER, request.session_id.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|source| request_error(&path, source))?;
        read_json(&path, response).await
    }

    async fn download(&self, link: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.resolve(link)?;
        let path = url.path().to_string();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| request_error(&path, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Decode {
                path,
                detail: format!("status {status}"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| request_error(&path, source))?;
        Ok(bytes.to_vec())
    }
}

/// JSON body of `POST /generate_music` for the configured channel.
pub fn generation_payload(
    request: &GenerationRequest,
    channel: SessionChannel,
) -> serde_json::Value {
    let mut payload = json!({
        "genre": request.genre,
        "mood": request.mood,
        "instrument": request.instrument,
        "length": request.length,
        "tempo": request.tempo,
        "description": request.description,
    });
    if channel.in_body() {
        payload["session_id"] = json!(request.session_id.as_str());
    }
    payload
}

fn request_error(path: &str, source: reqwest::Error) -> TransportError {
    TransportError::Request {
        path: path.to_string(),
        source,
    }
}

// Error replies still carry JSON, so the status code is only reported on decode failure.
async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| request_error(path, source))?;

    serde_json::from_str(&text).map_err(|err| {
        let preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
        TransportError::Decode {
            path: path.to_string(),
            detail: format!("status {status}: {err}; body: {preview}"),
        }
    })
}
