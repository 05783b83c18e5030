//! Run configuration.
//!
//! Everything the harvester needs to know about a run lives in [`Config`]. The defaults are a
//! complete, working configuration; a JSON file can override any subset of the keys.

use crate::harvest::comments::{DEFAULT_MAX_REQUESTS, DEFAULT_THREADS_PER_VIDEO};
use eyre::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Channels that are always searched for keyword matches, in addition to the user's
/// subscriptions.
const DEFAULT_CHANNEL_IDS: &[&str] = &[
    "UCW2QcKZiU8aUGg4yxCIditg",
    "UCfU2oLt2NnK9Te6NCN3UEJw",
    "UCWvorN5uzvFhA7zJst6NKTg",
    "UCW5Jb8DlHXphrZVsXEWTVqg",
    "UC16niRr50-MSBwiO3YDb3RA",
    "UCupvZG-5ko_eiXAupbDfxWw",
    "UCNye-wNBqNL5ZzHSJj3l8Bg",
    "UCQfwfsi5VrQ8yKZ-UWmAEFg",
    "UCSrZ3UV4jOidv8ppoVuvW9Q",
    "UCLLWAXn5F415g2kNAcE_T1g",
    "UCI3RT5PGmdi1KVp9FG_CneA",
    "UCzKH70qfN_yuXq3s91fdwmg",
    "UCOBMhI7TtRLTAGpcTjNvYCw",
    "UC75cGmLHmXN5oTK0nfYuBgA",
    "UCVODHOG-e7SDwhzARSPAlEQ",
    "UCnhp5NblY_wOoQ7YIJJLWCQ",
    "UCU08WO0NZldAswNY0ajTo2w",
    "UCbDTw0HZwrSL4BJRKdIwBKA",
    "UC6ZbGuT_zebhXkV-OeRzSoQ",
];

const DEFAULT_USER_CHANNEL_IDS: &[&str] = &["UCEmRmaGIcLPw7bHVCY758ug"];

const DEFAULT_KEYWORDS: &[&str] = &["Election 2024"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Google OAuth client secrets for an installed application.
    pub client_secrets: PathBuf,
    /// Where the OAuth token is cached between runs.
    pub token_cache: PathBuf,
    /// File harvested comments are appended to.
    pub output: PathBuf,
    /// Channels whose comments are harvested and whose subscriptions are searched.
    ///
    /// When empty, the channels owned by the authenticated account are used.
    pub user_channel_ids: Vec<String>,
    /// Channels searched with `keywords`.
    pub channel_ids: Vec<String>,
    /// Any of these terms must match for a video on `channel_ids` to be considered.
    pub keywords: Vec<String>,
    /// How far back to look for videos.
    pub lookback_days: u32,
    /// Ceiling on `commentThreads.list` calls per run.
    pub max_comment_requests: usize,
    pub max_subscriptions: u32,
    pub max_search_results: u32,
    pub max_comments_per_video: u32,
}

impl Default for Config {
    fn default() -> Self {
        fn owned(ids: &[&str]) -> Vec<String> {
            ids.iter().map(|id| id.to_string()).collect()
        }

        Self {
            client_secrets: PathBuf::from("client_secrets.json"),
            token_cache: PathBuf::from("tokens.json"),
            output: PathBuf::from("user_comments.txt"),
            user_channel_ids: owned(DEFAULT_USER_CHANNEL_IDS),
            channel_ids: owned(DEFAULT_CHANNEL_IDS),
            keywords: owned(DEFAULT_KEYWORDS),
            lookback_days: 30,
            max_comment_requests: DEFAULT_MAX_REQUESTS,
            max_subscriptions: 500,
            max_search_results: 500,
            max_comments_per_video: DEFAULT_THREADS_PER_VIDEO,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let config: Self = serde_json::from_str(json).context("parse configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from `path`, or the defaults if no path is given.
    pub async fn load(path: Option<&Path>) -> eyre::Result<Self> {
        let Some(path) = path else {
            tracing::debug!("no configuration file given, using defaults");
            return Ok(Self::default());
        };
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read configuration from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("load {}", path.display()))
    }

    fn validate(&self) -> eyre::Result<()> {
        if !(1..=100).contains(&self.max_comments_per_video) {
            eyre::bail!(
                "max_comments_per_video must be between 1 and 100, got {}",
                self.max_comments_per_video
            );
        }
        Ok(())
    }
}
