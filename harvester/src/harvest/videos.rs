//! Finding recent videos on a set of channels.

use crate::youtube_api::{VideoPlatform, VideoSearchQuery};
use jiff::Timestamp;

/// Builds the `q` search term that matches any of `keywords`.
///
/// Returns `None` when there is nothing to filter on, so that no `q` is sent at all.
pub fn keyword_query(keywords: Option<&[String]>) -> Option<String> {
    match keywords {
        Some(keywords) if !keywords.is_empty() => Some(keywords.join("|")),
        _ => None,
    }
}

/// Searches each channel for videos published after `published_after`.
///
/// When `keywords` is non-empty, only videos matching one of them are returned; the matching is
/// done by YouTube. Video ids are returned in the order the API lists them, channel by channel,
/// without deduplication. Channels that fail to search are logged and skipped.
pub async fn find_videos<P: VideoPlatform>(
    platform: &P,
    channel_ids: &[String],
    keywords: Option<&[String]>,
    published_after: Timestamp,
    max_results: u32,
) -> Vec<String> {
    let query = keyword_query(keywords);
    let mut video_ids = Vec::new();
    for channel_id in channel_ids {
        tracing::info!(%channel_id, "searching videos");
        let search = VideoSearchQuery {
            channel_id: channel_id.clone(),
            query: query.clone(),
            published_after,
            max_results,
        };
        let results = match platform.search_videos(&search).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(%channel_id, "failed to search videos: {e:#}");
                continue;
            }
        };

        if results.is_empty() {
            tracing::info!(%channel_id, "no videos found");
            continue;
        }
        video_ids.extend(
            results
                .iter()
                .filter_map(|r| r.video_id())
                .map(str::to_string),
        );
    }
    video_ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::fake::FakePlatform;
    use pretty_assertions::assert_eq;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn since() -> Timestamp {
        "2024-10-01T00:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn keywords_become_one_or_query() {
        let platform = FakePlatform::new();
        let keywords = ids(&["Election 2024", "debate"]);
        find_videos(&platform, &ids(&["C1", "C2"]), Some(keywords.as_slice()), since(), 500).await;

        let queries = platform.search_queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        for query in queries.iter() {
            assert_eq!(query.query.as_deref(), Some("Election 2024|debate"));
            assert_eq!(query.published_after, since());
            assert_eq!(query.max_results, 500);
        }
    }

    #[tokio::test]
    async fn no_keywords_means_no_query() {
        let platform = FakePlatform::new();
        find_videos(&platform, &ids(&["C1"]), None, since(), 500).await;
        find_videos(&platform, &ids(&["C2"]), Some(&[][..]), since(), 500).await;

        let queries = platform.search_queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries.iter().all(|q| q.query.is_none()));
    }

    #[tokio::test]
    async fn keeps_order_and_duplicates() {
        let platform = FakePlatform::new()
            .with_videos("C1", &["V1", "V2"])
            .with_videos("C2", &["V3", "V1"]);
        let videos = find_videos(&platform, &ids(&["C1", "C2"]), None, since(), 500).await;
        assert_eq!(videos, ids(&["V1", "V2", "V3", "V1"]));
    }

    #[tokio::test]
    async fn failing_channel_is_skipped() {
        let platform = FakePlatform::new()
            .with_failing_search("C1", "invalidChannelId")
            .with_videos("C2", &["V7"]);
        let videos = find_videos(&platform, &ids(&["C1", "C2"]), None, since(), 500).await;
        assert_eq!(videos, ids(&["V7"]));
    }

    #[test]
    fn single_keyword() {
        assert_eq!(keyword_query(Some(ids(&["one"]).as_slice())), Some("one".to_string()));
    }
}
