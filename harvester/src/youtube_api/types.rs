//! Shared types and pagination for the YouTube API client.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::{Stream, StreamExt};

/// Largest `maxResults` any of the list endpoints we use accepts per page.
pub const MAX_PAGE_SIZE: u32 = 50;

type Page<T> = (VecDeque<T>, Option<String>);

type PendingPage<'a, F, T> = Pin<Box<dyn Future<Output = eyre::Result<(F, Page<T>)>> + 'a + Send>>;

/// A stream over every item of a paginated YouTube list endpoint.
///
/// `fetcher` is called with `None` for the first page and with each `nextPageToken` after that.
/// Pages are only requested once the previous one has been drained, so dropping the stream
/// early (e.g. through [`collect_up_to`]) never issues requests for pages that aren't needed.
pub struct PagedStream<'a, T, F> {
    buffered: VecDeque<T>,
    pending: Option<PendingPage<'a, F, T>>,
}

impl<'a, T, F> PagedStream<'a, T, F> {
    pub fn new<Fut>(fetcher: F) -> Self
    where
        F: Fn(Option<String>) -> Fut,
        F: Send + 'a,
        Fut: Future<Output = eyre::Result<Page<T>>> + Send + 'a,
    {
        let first_page = async move {
            let page = fetcher(None).await?;
            Ok((fetcher, page))
        };
        Self {
            buffered: VecDeque::new(),
            pending: Some(Box::pin(first_page)),
        }
    }
}

impl<T: Unpin, F> Unpin for PagedStream<'_, T, F> {}

impl<'a, T: Unpin, F, Fut> Stream for PagedStream<'a, T, F>
where
    F: Fn(Option<String>) -> Fut,
    F: Send + 'a,
    Fut: Future<Output = eyre::Result<Page<T>>> + Send + 'a,
{
    type Item = eyre::Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.buffered.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            let Some(pending) = self.pending.as_mut() else {
                return Poll::Ready(None);
            };

            match pending.as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => {
                    self.pending = None;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Ok((fetcher, (items, next_page_token)))) => {
                    self.buffered.extend(items);
                    self.pending = match next_page_token {
                        Some(token) => Some(Box::pin(async move {
                            let page = fetcher(Some(token)).await?;
                            Ok((fetcher, page))
                        })),
                        None => None,
                    };
                }
            }
        }
    }
}

/// Drains at most `limit` items from a paginated stream, stopping at the first error.
pub async fn collect_up_to<T, S>(stream: S, limit: usize) -> eyre::Result<Vec<T>>
where
    S: Stream<Item = eyre::Result<T>>,
{
    let mut stream = std::pin::pin!(stream.take(limit));
    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item?);
    }
    Ok(items)
}

/// Page size to request when at most `wanted` items are needed in total.
pub fn page_size(wanted: u32) -> u32 {
    wanted.clamp(1, MAX_PAGE_SIZE)
}

/// Paging details for lists of resources.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    ///
    /// For `search.list` this is an approximation.
    #[serde(rename = "totalResults", default)]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage", default)]
    pub results_per_page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fake_pages(calls: &AtomicUsize) -> impl Stream<Item = eyre::Result<u32>> + '_ {
        PagedStream::new(move |token: Option<String>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(match token.as_deref() {
                None => (VecDeque::from([1, 2]), Some("p2".to_string())),
                Some("p2") => (VecDeque::from([3]), Some("p3".to_string())),
                Some(_) => (VecDeque::from([4, 5]), None),
            })
        })
    }

    #[tokio::test]
    async fn follows_page_tokens_to_the_end() {
        let calls = AtomicUsize::new(0);
        let items = collect_up_to(fake_pages(&calls), usize::MAX).await.unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_fetching_once_limit_is_reached() {
        let calls = AtomicUsize::new(0);
        let items = collect_up_to(fake_pages(&calls), 2).await.unwrap();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn page_error_ends_collection() {
        let stream = PagedStream::new(|token: Option<String>| async move {
            match token {
                None => Ok((VecDeque::from(["a"]), Some("next".to_string()))),
                Some(_) => Err(eyre::eyre!("quota exceeded")),
            }
        });
        assert!(collect_up_to(stream, 10).await.is_err());
    }

    #[test]
    fn page_sizes() {
        assert_eq!(page_size(500), 50);
        assert_eq!(page_size(20), 20);
        assert_eq!(page_size(0), 1);
    }
}
