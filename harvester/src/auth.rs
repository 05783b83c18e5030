//! Obtaining an authorized [`YouTubeClient`].

use crate::config::Config;
use crate::oauth::{self, ClientSecrets, OAuthManager};
use crate::youtube_api::{TimeBoundAccessToken, YouTubeClient};
use eyre::Context;
use oauth2::basic::BasicTokenResponse;
use std::path::Path;
use std::sync::Arc;
use tokio_stream::StreamExt;

async fn load_cached_token(path: &Path) -> eyre::Result<Option<BasicTokenResponse>> {
    if !tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("check whether {} exists", path.display()))?
    {
        return Ok(None);
    }
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read cached token from {}", path.display()))?;
    match serde_json::from_str(&json) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable token cache: {e}");
            Ok(None)
        }
    }
}

async fn store_token(path: &Path, token: &BasicTokenResponse) -> eyre::Result<()> {
    let json = serde_json::to_string(token).context("serialize OAuth token")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("write token cache {}", path.display()))
}

/// Authenticates with YouTube and returns a ready-to-use client.
///
/// A token cached by an earlier run is refreshed and reused; otherwise (or if the refresh is
/// rejected) the user is sent through the OAuth consent flow in their browser. The resulting
/// token is validated and then written back to the cache.
pub async fn authenticate(config: &Config) -> eyre::Result<YouTubeClient> {
    let secrets = ClientSecrets::load(&config.client_secrets).await?;
    let oauth_manager = OAuthManager::new(secrets, oauth::YOUTUBE_FORCE_SSL_SCOPE);

    let token = match load_cached_token(&config.token_cache).await? {
        Some(cached) => {
            tracing::info!("refreshing cached token");
            let mut token = TimeBoundAccessToken::expired(cached);
            if token
                .refresh(&oauth_manager)
                .await
                .context("refresh cached token")?
            {
                tracing::debug!("successfully refreshed cached token");
                token
            } else {
                tracing::warn!("token refresh failed, getting new token via full OAuth");
                let raw_token = oauth_manager
                    .authenticate()
                    .await
                    .context("authorize user to YouTube")?;
                TimeBoundAccessToken::new(raw_token)
            }
        }
        None => {
            let raw_token = oauth_manager
                .authenticate()
                .await
                .context("authorize user to YouTube")?;
            TimeBoundAccessToken::new(raw_token)
        }
    };

    let http_client = reqwest::Client::builder()
        .build()
        .context("build YouTube API HTTP client")?;
    let client = YouTubeClient::new(token, Arc::new(oauth_manager), http_client);

    client
        .validate_token()
        .await
        .context("validate YouTube token")?;

    store_token(&config.token_cache, &client.token().await).await?;
    Ok(client)
}

/// IDs of the channels owned by the authenticated account.
pub async fn own_channel_ids(client: &YouTubeClient) -> eyre::Result<Vec<String>> {
    let channels = client.list_my_channels();
    let mut channels = std::pin::pin!(channels);
    let mut ids = Vec::new();
    while let Some(channel) = channels.next().await {
        let channel = channel.context("fetch own channel")?;
        tracing::info!(id = %channel.id, name = %channel.snippet.title, "harvesting as channel");
        ids.push(channel.id);
    }
    if ids.is_empty() {
        eyre::bail!("the authenticated account owns no YouTube channels");
    }
    Ok(ids)
}
