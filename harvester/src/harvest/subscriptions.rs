//! Resolving which channels a set of users subscribe to.

use crate::youtube_api::{SubscriptionQuery, VideoPlatform};
use std::collections::HashSet;

/// Returns every channel that any of `user_channel_ids` is subscribed to.
///
/// At most `max_results` subscriptions are read per user. A user whose subscriptions can't be
/// listed (private subscriptions, a bad id, a transport error) is logged and skipped.
pub async fn resolve_subscriptions<P: VideoPlatform>(
    platform: &P,
    user_channel_ids: &[String],
    max_results: u32,
) -> HashSet<String> {
    let mut subscribed = HashSet::new();
    for user_channel_id in user_channel_ids {
        tracing::info!(channel_id = %user_channel_id, "fetching subscriptions");
        let query = SubscriptionQuery {
            channel_id: user_channel_id.clone(),
            max_results,
        };
        let subscriptions = match platform.list_subscriptions(&query).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::warn!(channel_id = %user_channel_id, "failed to fetch subscriptions: {e:#}");
                continue;
            }
        };

        if subscriptions.is_empty() {
            tracing::info!(channel_id = %user_channel_id, "no subscriptions found");
            continue;
        }
        subscribed.extend(
            subscriptions
                .iter()
                .filter_map(|s| s.target_channel_id())
                .map(str::to_string),
        );
    }
    subscribed
}
