//! YouTube Search API types.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Parameters for searching one channel's recent videos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSearchQuery {
    /// Channel to search within.
    pub channel_id: String,
    /// Free-text query (`q`), e.g. `election|debate` to match either term.
    pub query: Option<String>,
    /// Only videos published at or after this instant are returned.
    pub published_after: Timestamp,
    /// Upper bound on the number of results returned.
    pub max_results: u32,
}

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: VecDeque<SearchResult>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A single search hit.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
    pub snippet: Option<SearchResultSnippet>,
}

/// Which resource a search result refers to.
///
/// Only the field matching `kind` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultId {
    pub kind: String,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultSnippet {
    #[serde(rename = "publishedAt")]
    pub published_at: Option<Timestamp>,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub title: String,
}

impl SearchResult {
    pub fn video_id(&self) -> Option<&str> {
        self.id.video_id.as_deref()
    }
}
