//! In-memory [`VideoPlatform`] for tests.

use crate::youtube_api::comments::{Comment, CommentThreadSnippet};
use crate::youtube_api::search::SearchResultId;
use crate::youtube_api::subscriptions::{ResourceId, SubscriptionSnippet};
use crate::youtube_api::{
    ApiError, CommentSnippet, CommentThread, CommentThreadQuery, SearchResult, Subscription,
    SubscriptionQuery, VideoPlatform, VideoSearchQuery,
};
use http::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;

/// A canned response: either items or an API error with the given reason.
#[derive(Debug, Clone)]
enum Canned<T> {
    Items(Vec<T>),
    Fail(StatusCode, &'static str),
}

#[derive(Debug, Default)]
pub(crate) struct FakePlatform {
    subscriptions: HashMap<String, Canned<String>>,
    videos: HashMap<String, Canned<String>>,
    comments: HashMap<String, Canned<CommentSnippet>>,
    pub(crate) subscription_queries: Mutex<Vec<SubscriptionQuery>>,
    pub(crate) search_queries: Mutex<Vec<VideoSearchQuery>>,
    pub(crate) comment_queries: Mutex<Vec<CommentThreadQuery>>,
}

fn api_error(status: StatusCode, reason: &str) -> eyre::Report {
    let payload = format!(
        r#"{{"error": {{"code": {}, "message": "{reason}", "errors": [{{"reason": "{reason}"}}]}}}}"#,
        status.as_u16()
    );
    eyre::Report::new(ApiError::from_response(status, payload))
}

fn respond<T: Clone>(canned: Option<&Canned<T>>) -> eyre::Result<Vec<T>> {
    match canned {
        None => Ok(Vec::new()),
        Some(Canned::Items(items)) => Ok(items.clone()),
        Some(Canned::Fail(status, reason)) => Err(api_error(*status, reason)),
    }
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_subscriptions(mut self, channel: &str, targets: &[&str]) -> Self {
        self.subscriptions.insert(
            channel.to_string(),
            Canned::Items(targets.iter().map(|t| t.to_string()).collect()),
        );
        self
    }

    pub(crate) fn with_failing_subscriptions(mut self, channel: &str, reason: &'static str) -> Self {
        self.subscriptions
            .insert(channel.to_string(), Canned::Fail(StatusCode::FORBIDDEN, reason));
        self
    }

    pub(crate) fn with_videos(mut self, channel: &str, videos: &[&str]) -> Self {
        self.videos.insert(
            channel.to_string(),
            Canned::Items(videos.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub(crate) fn with_failing_search(mut self, channel: &str, reason: &'static str) -> Self {
        self.videos
            .insert(channel.to_string(), Canned::Fail(StatusCode::BAD_REQUEST, reason));
        self
    }

    /// `comments` are `(author channel id, text)` pairs.
    pub(crate) fn with_comments(mut self, video: &str, comments: &[(&str, &str)]) -> Self {
        self.comments.insert(
            video.to_string(),
            Canned::Items(
                comments
                    .iter()
                    .map(|(author, text)| {
                        let mut snippet = CommentSnippet::new(*author, *text);
                        snippet.video_id = Some(video.to_string());
                        snippet
                    })
                    .collect(),
            ),
        );
        self
    }

    pub(crate) fn with_comments_disabled(mut self, video: &str) -> Self {
        self.comments.insert(
            video.to_string(),
            Canned::Fail(StatusCode::FORBIDDEN, "commentsDisabled"),
        );
        self
    }

    pub(crate) fn with_failing_comments(mut self, video: &str, reason: &'static str) -> Self {
        self.comments
            .insert(video.to_string(), Canned::Fail(StatusCode::FORBIDDEN, reason));
        self
    }

    pub(crate) fn comment_fetches(&self) -> Vec<String> {
        self.comment_queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.video_id.clone())
            .collect()
    }
}

impl VideoPlatform for FakePlatform {
    async fn list_subscriptions(&self, query: &SubscriptionQuery) -> eyre::Result<Vec<Subscription>> {
        self.subscription_queries.lock().unwrap().push(query.clone());
        let targets = respond(self.subscriptions.get(&query.channel_id))?;
        Ok(targets
            .into_iter()
            .enumerate()
            .map(|(i, target)| Subscription {
                id: format!("{}-sub{i}", query.channel_id),
                snippet: SubscriptionSnippet {
                    title: target.clone(),
                    resource_id: ResourceId {
                        kind: "youtube#channel".to_string(),
                        channel_id: Some(target),
                    },
                },
            })
            .collect())
    }

    async fn search_videos(&self, query: &VideoSearchQuery) -> eyre::Result<Vec<SearchResult>> {
        self.search_queries.lock().unwrap().push(query.clone());
        let videos = respond(self.videos.get(&query.channel_id))?;
        Ok(videos
            .into_iter()
            .map(|video| SearchResult {
                id: SearchResultId {
                    kind: "youtube#video".to_string(),
                    video_id: Some(video),
                },
                snippet: None,
            })
            .collect())
    }

    async fn list_comment_threads(
        &self,
        query: &CommentThreadQuery,
    ) -> eyre::Result<Vec<CommentThread>> {
        self.comment_queries.lock().unwrap().push(query.clone());
        let snippets = respond(self.comments.get(&query.video_id))?;
        Ok(snippets
            .into_iter()
            .enumerate()
            .map(|(i, snippet)| {
                let id = format!("{}-c{i}", query.video_id);
                CommentThread {
                    id: id.clone(),
                    snippet: CommentThreadSnippet {
                        video_id: Some(query.video_id.clone()),
                        top_level_comment: Comment { id, snippet },
                        total_reply_count: 0,
                    },
                }
            })
            .collect())
    }
}
