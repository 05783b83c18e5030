//! The harvesting pipeline.
//!
//! A run goes through these steps in order:
//!
//! 1. [`resolve_subscriptions`]: which channels do the users follow?
//! 2. [`find_videos`] over the configured channels, filtered by keywords.
//! 3. [`find_videos`] over the subscribed channels, unfiltered.
//! 4. [`collect_comments`] on all of those videos, keeping the users' own comments.
//! 5. [`append_comments`] to the output file.

use crate::config::Config;
use crate::youtube_api::VideoPlatform;
use eyre::Context;
use jiff::{SignedDuration, Timestamp, Unit};
use std::collections::HashSet;
use std::path::PathBuf;

pub mod comments;
pub mod sink;
pub mod subscriptions;
pub mod videos;

#[cfg(test)]
pub(crate) mod fake;

pub use comments::collect_comments;
pub use sink::append_comments;
pub use subscriptions::resolve_subscriptions;
pub use videos::find_videos;

/// Everything a single run needs, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct HarvestPlan {
    /// Whose subscriptions to follow and whose comments to keep.
    pub user_channel_ids: Vec<String>,
    /// Extra channels searched with `keywords`.
    pub channel_ids: Vec<String>,
    pub keywords: Vec<String>,
    pub published_after: Timestamp,
    pub max_comment_requests: usize,
    pub max_subscriptions: u32,
    pub max_search_results: u32,
    pub max_comments_per_video: u32,
    pub output: PathBuf,
}

impl HarvestPlan {
    /// Builds the plan for a run starting at `now`, looking back `config.lookback_days`.
    pub fn from_config(
        config: &Config,
        user_channel_ids: Vec<String>,
        now: Timestamp,
    ) -> eyre::Result<Self> {
        let lookback = SignedDuration::from_hours(i64::from(config.lookback_days) * 24);
        let published_after = now
            .checked_sub(lookback)
            .context("compute start of lookback window")?
            .round(Unit::Second)
            .context("round start of lookback window")?;

        Ok(Self {
            user_channel_ids,
            channel_ids: config.channel_ids.clone(),
            keywords: config.keywords.clone(),
            published_after,
            max_comment_requests: config.max_comment_requests,
            max_subscriptions: config.max_subscriptions,
            max_search_results: config.max_search_results,
            max_comments_per_video: config.max_comments_per_video,
            output: config.output.clone(),
        })
    }
}

/// What a run found, stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub subscribed_channels: usize,
    pub keyword_videos: usize,
    pub subscription_videos: usize,
    pub matching_comments: usize,
    pub stored_comments: usize,
}

/// Runs the whole pipeline once.
///
/// Fails without touching the output file if comment collection fails.
pub async fn run<P: VideoPlatform>(platform: &P, plan: &HarvestPlan) -> eyre::Result<HarvestSummary> {
    let subscribed =
        resolve_subscriptions(platform, &plan.user_channel_ids, plan.max_subscriptions).await;
    let mut subscribed: Vec<_> = subscribed.into_iter().collect();
    subscribed.sort();
    tracing::info!(count = subscribed.len(), channels = ?subscribed, "resolved subscribed channels");

    let mut video_ids = find_videos(
        platform,
        &plan.channel_ids,
        Some(plan.keywords.as_slice()),
        plan.published_after,
        plan.max_search_results,
    )
    .await;
    let keyword_videos = video_ids.len();
    tracing::info!(count = keyword_videos, "found videos matching keywords");

    let subscription_videos = find_videos(
        platform,
        &subscribed,
        None,
        plan.published_after,
        plan.max_search_results,
    )
    .await;
    tracing::info!(
        count = subscription_videos.len(),
        "found videos from subscribed channels"
    );
    let subscription_video_count = subscription_videos.len();
    video_ids.extend(subscription_videos);

    let interesting: HashSet<String> = plan.user_channel_ids.iter().cloned().collect();
    let comments = collect_comments(
        platform,
        &interesting,
        &video_ids,
        plan.max_comment_requests,
        plan.max_comments_per_video,
    )
    .await
    .context("collect comments")?;
    tracing::info!(count = comments.len(), "found comments by the user");

    let stored = append_comments(&comments, &plan.output)
        .await
        .context("save comments")?;
    tracing::info!(
        stored,
        path = %plan.output.display(),
        "comments saved"
    );

    Ok(HarvestSummary {
        subscribed_channels: subscribed.len(),
        keyword_videos,
        subscription_videos: subscription_video_count,
        matching_comments: comments.len(),
        stored_comments: stored,
    })
}
