//! YouTube Comment Threads API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Parameters for listing the top-level comment threads of one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThreadQuery {
    pub video_id: String,
    /// Between 1 and 100.
    pub max_results: u32,
}

/// Response structure for the `commentThreads.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/commentThreads/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentThreadListResponse {
    #[serde(default)]
    pub items: VecDeque<CommentThread>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `commentThread` resource: a top-level comment and (optionally) its replies.
///
/// See: <https://developers.google.com/youtube/v3/docs/commentThreads#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThreadSnippet {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: Comment,
    #[serde(rename = "totalReplyCount", default)]
    pub total_reply_count: u64,
}

/// A `comment` resource.
///
/// See: <https://developers.google.com/youtube/v3/docs/comments#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub snippet: CommentSnippet,
}

/// The snippet of a comment, which is what gets stored for each harvested comment.
///
/// Fields we don't interpret are kept in `other` so a stored record round-trips everything
/// YouTube sent us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSnippet {
    /// The comment as YouTube renders it (HTML for the default `textFormat`).
    #[serde(rename = "textDisplay")]
    pub text_display: String,
    #[serde(rename = "authorDisplayName", skip_serializing_if = "Option::is_none")]
    pub author_display_name: Option<String>,
    /// Missing for comments by users without a channel.
    #[serde(rename = "authorChannelId", skip_serializing_if = "Option::is_none")]
    pub author_channel_id: Option<AuthorChannelId>,
    #[serde(rename = "videoId", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorChannelId {
    pub value: String,
}

impl CommentSnippet {
    /// A bare comment with only text and author, as used in tests and fakes.
    pub fn new(author_channel_id: impl Into<String>, text_display: impl Into<String>) -> Self {
        Self {
            text_display: text_display.into(),
            author_display_name: None,
            author_channel_id: Some(AuthorChannelId {
                value: author_channel_id.into(),
            }),
            video_id: None,
            other: BTreeMap::new(),
        }
    }

    pub fn author_channel_id(&self) -> Option<&str> {
        self.author_channel_id.as_ref().map(|id| id.value.as_str())
    }
}

impl CommentThread {
    /// The snippet of the comment that started this thread.
    pub fn top_level_snippet(&self) -> &CommentSnippet {
        &self.snippet.top_level_comment.snippet
    }

    pub fn into_top_level_snippet(self) -> CommentSnippet {
        self.snippet.top_level_comment.snippet
    }
}
