use serde::{Deserialize, Serialize};

use crate::session::SessionToken;

/// Reply of `GET /api/check-session/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionCheckReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub username: Option<String>,
}

/// Reply of `GET /api/user-files/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileListReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<GeneratedFile>,
}

/// Server-owned record of one generated track.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedFile {
    #[serde(default)]
    pub name: Option<String>,
    /// Empty when the backend omitted it; such records are not listed.
    #[serde(default)]
    pub filename: String,
    /// Creation time in epoch seconds; the backend may report fractions.
    #[serde(default)]
    pub created: Option<f64>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One validated submission of the generator form.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub genre: String,
    pub mood: String,
    pub instrument: String,
    pub length: u32,
    pub tempo: u32,
    pub description: String,
    pub session_id: SessionToken,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
