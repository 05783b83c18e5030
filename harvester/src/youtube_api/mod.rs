//! YouTube Data API v3 client library.
//!
//! Only the handful of read endpoints the comment harvester needs are covered:
//!
//! - `subscriptions.list` to find which channels a user follows,
//! - `search.list` to find a channel's recent videos,
//! - `commentThreads.list` to read the top-level comments on a video,
//! - `channels.list` (`mine=true`) to find the authenticated user's own channels and to
//!   validate tokens.
//!
//! The first three are exposed through the [`VideoPlatform`] trait so that the harvesting
//! pipeline can be driven by something other than the real API.
//!
//! # Errors
//!
//! Every call returns an [`eyre::Result`]. When YouTube answers with a non-success status, the
//! report wraps an [`ApiError`] that can be recovered with `report.downcast_ref::<ApiError>()`.

use std::future::Future;

pub mod channels;
pub mod client;
pub mod comments;
pub mod error;
pub mod search;
pub mod subscriptions;
pub mod types;

pub use client::{TimeBoundAccessToken, YouTubeClient};
pub use comments::{CommentSnippet, CommentThread, CommentThreadQuery};
pub use error::ApiError;
pub use search::{SearchResult, VideoSearchQuery};
pub use subscriptions::{Subscription, SubscriptionQuery};
pub use types::{PageInfo, PagedStream};

/// The queries the harvesting pipeline makes against a video platform.
///
/// Each call returns the response's items (an absent `items` list is an empty `Vec`), or an error
/// for the call as a whole.
pub trait VideoPlatform {
    /// Lists the channels that `query.channel_id` is publicly subscribed to.
    fn list_subscriptions(
        &self,
        query: &SubscriptionQuery,
    ) -> impl Future<Output = eyre::Result<Vec<Subscription>>>;

    /// Searches one channel for videos.
    fn search_videos(
        &self,
        query: &VideoSearchQuery,
    ) -> impl Future<Output = eyre::Result<Vec<SearchResult>>>;

    /// Lists top-level comment threads on one video.
    fn list_comment_threads(
        &self,
        query: &CommentThreadQuery,
    ) -> impl Future<Output = eyre::Result<Vec<CommentThread>>>;
}
