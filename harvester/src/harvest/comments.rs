//! Collecting comments by specific authors from a list of videos.

use crate::youtube_api::{ApiError, CommentSnippet, CommentThreadQuery, VideoPlatform};
use eyre::Context;
use std::collections::HashSet;

/// Default ceiling on comment thread requests per run.
pub const DEFAULT_MAX_REQUESTS: usize = 1000;

/// Default number of top-level threads read per video (the API's maximum).
pub const DEFAULT_THREADS_PER_VIDEO: u32 = 100;

/// Reads the top-level comments on each video and keeps the ones written by
/// `interesting_authors`.
///
/// At most `max_requests` videos are fetched; once the ceiling is hit the comments found so far
/// are returned. Every attempted fetch counts towards the ceiling, including ones that fail.
///
/// Videos with comments turned off are skipped. Any other error aborts the whole collection.
pub async fn collect_comments<P: VideoPlatform>(
    platform: &P,
    interesting_authors: &HashSet<String>,
    video_ids: &[String],
    max_requests: usize,
    threads_per_video: u32,
) -> eyre::Result<Vec<CommentSnippet>> {
    let mut comments = Vec::new();
    let mut requests = 0;

    for video_id in video_ids {
        if requests >= max_requests {
            tracing::warn!(max_requests, "reached maximum request limit");
            break;
        }

        tracing::info!(%video_id, "fetching comments");
        let query = CommentThreadQuery {
            video_id: video_id.clone(),
            max_results: threads_per_video,
        };
        requests += 1;
        let threads = match platform.list_comment_threads(&query).await {
            Ok(threads) => threads,
            Err(e) => match e.downcast_ref::<ApiError>() {
                Some(api_error) if api_error.is_comments_disabled() => {
                    tracing::info!(%video_id, "comments are disabled, skipping video");
                    continue;
                }
                Some(api_error) => {
                    tracing::error!(%video_id, reason = api_error.reason(), "failed to fetch comments");
                    return Err(e).with_context(|| format!("fetch comments for video {video_id}"));
                }
                None => {
                    tracing::error!(%video_id, "failed to fetch comments: {e:#}");
                    return Err(e).with_context(|| format!("fetch comments for video {video_id}"));
                }
            },
        };

        if threads.is_empty() {
            tracing::debug!(%video_id, "no comments found");
            continue;
        }
        comments.extend(
            threads
                .into_iter()
                .map(|thread| thread.into_top_level_snippet())
                .filter(|comment| {
                    comment
                        .author_channel_id()
                        .is_some_and(|author| interesting_authors.contains(author))
                }),
        );
    }

    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::fake::FakePlatform;
    use pretty_assertions::assert_eq;

    fn authors(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn videos(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn texts(comments: &[CommentSnippet]) -> Vec<&str> {
        comments.iter().map(|c| c.text_display.as_str()).collect()
    }

    #[tokio::test]
    async fn keeps_only_interesting_authors() {
        let platform = FakePlatform::new().with_comments("V1", &[("A", "from a"), ("B", "from b")]);
        let comments = collect_comments(&platform, &authors(&["A"]), &videos(&["V1"]), 1000, 100)
            .await
            .unwrap();
        assert_eq!(texts(&comments), vec!["from a"]);
        assert_eq!(comments[0].author_channel_id(), Some("A"));
    }

    #[tokio::test]
    async fn zero_requests_fetches_nothing() {
        let platform = FakePlatform::new().with_comments("V1", &[("A", "hi")]);
        let comments = collect_comments(&platform, &authors(&["A"]), &videos(&["V1"]), 0, 100)
            .await
            .unwrap();
        assert!(comments.is_empty());
        assert!(platform.comment_fetches().is_empty());
    }

    #[tokio::test]
    async fn request_ceiling_is_respected() {
        let platform = FakePlatform::new()
            .with_comments("V1", &[("A", "one")])
            .with_comments("V2", &[("A", "two")])
            .with_comments("V3", &[("A", "three")]);
        let comments = collect_comments(
            &platform,
            &authors(&["A"]),
            &videos(&["V1", "V2", "V3"]),
            2,
            100,
        )
        .await
        .unwrap();
        assert_eq!(texts(&comments), vec!["one", "two"]);
        assert_eq!(platform.comment_fetches(), videos(&["V1", "V2"]));
    }

    #[tokio::test]
    async fn comments_disabled_is_skipped_but_counted() {
        let platform = FakePlatform::new()
            .with_comments_disabled("V1")
            .with_comments("V2", &[("A", "after")])
            .with_comments("V3", &[("A", "too late")]);
        let comments = collect_comments(
            &platform,
            &authors(&["A"]),
            &videos(&["V1", "V2", "V3"]),
            2,
            100,
        )
        .await
        .unwrap();
        assert_eq!(texts(&comments), vec!["after"]);
        assert_eq!(platform.comment_fetches(), videos(&["V1", "V2"]));
    }

    #[tokio::test]
    async fn other_errors_abort() {
        let platform = FakePlatform::new()
            .with_comments("V1", &[("A", "first")])
            .with_failing_comments("V2", "quotaExceeded")
            .with_comments("V3", &[("A", "never")]);
        let err = collect_comments(
            &platform,
            &authors(&["A"]),
            &videos(&["V1", "V2", "V3"]),
            1000,
            100,
        )
        .await
        .unwrap_err();

        let api_error = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_error.reason(), "quotaExceeded");
        assert_eq!(platform.comment_fetches(), videos(&["V1", "V2"]));
    }

    #[tokio::test]
    async fn asks_for_configured_thread_count() {
        let platform = FakePlatform::new();
        collect_comments(&platform, &authors(&[]), &videos(&["V1"]), 1000, 100)
            .await
            .unwrap();
        assert_eq!(
            *platform.comment_queries.lock().unwrap(),
            vec![CommentThreadQuery {
                video_id: "V1".to_string(),
                max_results: 100,
            }]
        );
    }
}
