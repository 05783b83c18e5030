//! Core YouTube API client functionality and authentication management.

use crate::oauth::OAuthManager;
use crate::youtube_api::VideoPlatform;
use crate::youtube_api::channels::{Channel, ChannelListResponse};
use crate::youtube_api::comments::{CommentThread, CommentThreadListResponse, CommentThreadQuery};
use crate::youtube_api::error::ApiError;
use crate::youtube_api::search::{SearchListResponse, SearchResult, VideoSearchQuery};
use crate::youtube_api::subscriptions::{
    Subscription, SubscriptionListResponse, SubscriptionQuery,
};
use crate::youtube_api::types::{PagedStream, collect_up_to, page_size};
use eyre::Context;
use http::Method;
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio_stream::Stream;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// An OAuth token together with the time at which we stop trusting its access token.
#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the current access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Wraps a token loaded from storage; it is refreshed before first use.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    /// Wraps a token that was just issued.
    ///
    /// The expiry is the token's `expires_in` minus a 5-minute safety buffer.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }

    /// Refreshes this token using the provided OAuth manager, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Token was successfully refreshed
    /// * `Ok(false)` - Refresh failed (invalid grant, no refresh token, etc.)
    /// * `Err(_)` - Network or other error occurred
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        tracing::trace!("refreshing token");
        match oauth_manager
            .refresh_token(self.token.clone())
            .await
            .context("refresh OAuth token")?
        {
            Some(new_token) => {
                let old_token = std::mem::replace(&mut self.token, new_token);

                // Google usually omits the refresh token from refresh responses.
                if self.token.refresh_token().is_none() {
                    tracing::trace!("new token lacks refresh token, preserving original");
                    self.token
                        .set_refresh_token(old_token.refresh_token().cloned());
                }

                self.expires_at = Self::calculate_token_expiry(&self.token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Without `expires_in` we assume Google's usual one hour, minus the buffer.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        let lifetime = token
            .expires_in()
            .unwrap_or(Duration::from_secs(3600))
            .saturating_sub(Duration::from_secs(300));
        now + lifetime
    }
}

/// Client for the YouTube Data API v3.
///
/// Wraps an OAuth2 token and refreshes the access token before it expires. Cloning is cheap and
/// clones share the same token.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    oauth_manager: Arc<OAuthManager>,
    client: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager,
            client,
        }
    }

    /// Returns a clone of the underlying OAuth2 token, e.g. for writing to the token cache.
    pub async fn token(&self) -> BasicTokenResponse {
        self.token.lock().await.token.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            tracing::debug!("access token expired, attempting refresh");

            if token.refresh(&self.oauth_manager).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                eyre::bail!("unable to refresh expired access token");
            }
        }

        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authenticated GET against `resource` and decodes the JSON response.
    ///
    /// Non-success responses become an [`ApiError`] (wrapped in the returned report) so callers
    /// can tell apart the reasons YouTube gives.
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query_params: &[(&'static str, String)],
    ) -> eyre::Result<T> {
        let access_token = self.fresh_access_token().await?;
        let url = format!("{API_BASE}/{resource}");

        let response = self
            .client
            .request(Method::GET, &url)
            .bearer_auth(access_token)
            .query(query_params)
            .send()
            .await
            .with_context(|| format!("send GET request to YouTube API: {url}"))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let payload = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(eyre::Report::new(ApiError::from_response(
                status_code,
                payload,
            )));
        }

        response
            .json()
            .await
            .with_context(|| format!("parse YouTube {resource} API response as JSON"))
    }

    /// Checks that the token works by asking for the user's own channel.
    ///
    /// The error says why the token is unusable (refresh rejected, HTTP 401, no network, ...).
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> eyre::Result<()> {
        self.list_channels_internal(1, None)
            .await
            .context("list own channels with the current token")?;
        tracing::debug!("YouTube API token validation successful");
        Ok(())
    }

    /// Returns a paginated stream of YouTube channels owned by the authenticated user.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    #[instrument(skip(self))]
    pub fn list_my_channels(&self) -> impl Stream<Item = eyre::Result<Channel>> + use<'_> {
        PagedStream::new(|page_token| async {
            let response = self.list_channels_internal(50, page_token).await?;
            Ok((response.items, response.next_page_token))
        })
    }

    async fn list_channels_internal(
        &self,
        max_results: u32,
        page_token: Option<String>,
    ) -> eyre::Result<ChannelListResponse> {
        let query_params = my_channels_params(max_results, page_token);
        let channels: ChannelListResponse = self.get_json("channels", &query_params).await?;
        tracing::debug!(
            total_results = channels.page_info.total_results,
            returned_items = channels.items.len(),
            "fetched channels"
        );
        Ok(channels)
    }

    /// One page of `subscriptions.list` for `channel_id`.
    ///
    /// <https://developers.google.com/youtube/v3/docs/subscriptions/list>
    async fn list_subscriptions_internal(
        &self,
        channel_id: &str,
        max_results: u32,
        page_token: Option<String>,
    ) -> eyre::Result<SubscriptionListResponse> {
        let query_params = subscriptions_params(channel_id, max_results, page_token);
        let subscriptions: SubscriptionListResponse =
            self.get_json("subscriptions", &query_params).await?;
        tracing::debug!(
            channel_id,
            total_results = subscriptions.page_info.total_results,
            returned_items = subscriptions.items.len(),
            "fetched subscriptions"
        );
        Ok(subscriptions)
    }

    /// One page of `search.list` restricted to videos of a single channel.
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    async fn search_videos_internal(
        &self,
        search: &VideoSearchQuery,
        max_results: u32,
        page_token: Option<String>,
    ) -> eyre::Result<SearchListResponse> {
        let query_params = search_params(search, max_results, page_token);
        let results: SearchListResponse = self.get_json("search", &query_params).await?;
        tracing::debug!(
            channel_id = search.channel_id,
            total_results = results.page_info.total_results,
            returned_items = results.items.len(),
            "fetched search results"
        );
        Ok(results)
    }
}

impl VideoPlatform for YouTubeClient {
    #[instrument(skip(self))]
    async fn list_subscriptions(&self, query: &SubscriptionQuery) -> eyre::Result<Vec<Subscription>> {
        let per_page = page_size(query.max_results);
        let pages = PagedStream::new(|page_token| async move {
            let response = self
                .list_subscriptions_internal(&query.channel_id, per_page, page_token)
                .await?;
            Ok((response.items, response.next_page_token))
        });
        collect_up_to(pages, query.max_results as usize).await
    }

    #[instrument(skip(self))]
    async fn search_videos(&self, query: &VideoSearchQuery) -> eyre::Result<Vec<SearchResult>> {
        let per_page = page_size(query.max_results);
        let pages = PagedStream::new(|page_token| async move {
            let response = self
                .search_videos_internal(query, per_page, page_token)
                .await?;
            Ok((response.items, response.next_page_token))
        });
        collect_up_to(pages, query.max_results as usize).await
    }

    /// A single `commentThreads.list` call; only the first page of threads is looked at.
    ///
    /// <https://developers.google.com/youtube/v3/docs/commentThreads/list>
    #[instrument(skip(self))]
    async fn list_comment_threads(
        &self,
        query: &CommentThreadQuery,
    ) -> eyre::Result<Vec<CommentThread>> {
        let query_params = comment_threads_params(query);
        let threads: CommentThreadListResponse =
            self.get_json("commentThreads", &query_params).await?;
        tracing::debug!(
            video_id = query.video_id,
            returned_items = threads.items.len(),
            "fetched comment threads"
        );
        Ok(threads.items.into())
    }
}

type QueryParams = Vec<(&'static str, String)>;

fn push_page_token(params: &mut QueryParams, page_token: Option<String>) {
    if let Some(token) = page_token {
        params.push(("pageToken", token));
    }
}

fn my_channels_params(max_results: u32, page_token: Option<String>) -> QueryParams {
    let mut params = vec![
        ("part", "id,snippet".to_string()),
        ("mine", "true".to_string()),
        ("maxResults", max_results.to_string()),
    ];
    push_page_token(&mut params, page_token);
    params
}

fn subscriptions_params(
    channel_id: &str,
    max_results: u32,
    page_token: Option<String>,
) -> QueryParams {
    let mut params = vec![
        ("part", "snippet".to_string()),
        ("channelId", channel_id.to_string()),
        ("maxResults", max_results.to_string()),
    ];
    push_page_token(&mut params, page_token);
    params
}

/// `publishedAfter` is sent as RFC 3339 UTC with whole seconds.
fn search_params(
    search: &VideoSearchQuery,
    max_results: u32,
    page_token: Option<String>,
) -> QueryParams {
    let mut params = vec![
        ("part", "snippet".to_string()),
        ("channelId", search.channel_id.clone()),
        ("type", "video".to_string()),
        (
            "publishedAfter",
            search
                .published_after
                .strftime("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        ),
        ("maxResults", max_results.to_string()),
    ];
    if let Some(ref q) = search.query {
        params.push(("q", q.clone()));
    }
    push_page_token(&mut params, page_token);
    params
}

fn comment_threads_params(query: &CommentThreadQuery) -> QueryParams {
    vec![
        ("part", "snippet".to_string()),
        ("videoId", query.video_id.clone()),
        ("maxResults", query.max_results.to_string()),
    ]
}
