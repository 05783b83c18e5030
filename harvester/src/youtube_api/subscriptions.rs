//! YouTube Subscriptions API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Parameters for listing the public subscriptions of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionQuery {
    /// Channel whose subscriptions to list.
    pub channel_id: String,
    /// Upper bound on the number of subscriptions returned.
    pub max_results: u32,
}

/// Response structure for the `subscriptions.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/subscriptions/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionListResponse {
    #[serde(default)]
    pub items: VecDeque<Subscription>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `subscription` resource: one channel following another.
///
/// See: <https://developers.google.com/youtube/v3/docs/subscriptions#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub snippet: SubscriptionSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSnippet {
    /// Title of the channel subscribed to.
    #[serde(default)]
    pub title: String,
    /// The resource being subscribed to.
    #[serde(rename = "resourceId")]
    pub resource_id: ResourceId,
}

/// Identifies the resource a subscription points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceId {
    /// Usually `youtube#channel`.
    pub kind: String,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

impl Subscription {
    /// The channel this subscription follows, if YouTube told us.
    pub fn target_channel_id(&self) -> Option<&str> {
        self.snippet.resource_id.channel_id.as_deref()
    }
}
