use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;

use crate::api::SessionChannel;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_STORAGE_PATH: &str = ".musicgen/local_storage.json";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Client settings resolved from the environment.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub storage_path: PathBuf,
    pub download_dir: PathBuf,
    pub session_channel: SessionChannel,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_url = read("MUSICGEN_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&raw_url)?;

        let session_channel = match read("MUSICGEN_SESSION_CHANNEL") {
            Some(raw) => raw
                .parse()
                .context("MUSICGEN_SESSION_CHANNEL is invalid")?,
            None => SessionChannel::default(),
        };

        Ok(Self {
            base_url,
            storage_path: read("MUSICGEN_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
            download_dir: read("MUSICGEN_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            session_channel,
        })
    }

    pub fn with_base_url(mut self, raw: &str) -> Result<Self> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).with_context(|| format!("invalid backend url '{raw}'"))
}
