//! Appending harvested comments to the output file.
//!
//! The file holds one JSON object per line, each the full snippet of one comment. It is only
//! ever appended to. A comment is written only if no comment with the same display text has
//! been written before, in this run or an earlier one.

use crate::youtube_api::CommentSnippet;
use eyre::Context;
use std::collections::HashSet;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Display text of a stored line.
///
/// Lines that aren't stored comments are compared verbatim.
fn stored_text(line: &str) -> String {
    match serde_json::from_str::<CommentSnippet>(line) {
        Ok(comment) => comment.text_display,
        Err(_) => line.to_string(),
    }
}

/// What is already in the output file.
struct Stored {
    seen: HashSet<String>,
    /// The last line lacks its `\n`, so the next record must not be appended to it.
    unterminated: bool,
}

async fn read_stored(path: &Path) -> eyre::Result<Stored> {
    if !tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("check whether {} exists", path.display()))?
    {
        return Ok(Stored {
            seen: HashSet::new(),
            unterminated: false,
        });
    }

    let existing = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read existing comments from {}", path.display()))?;
    Ok(Stored {
        seen: existing.lines().map(stored_text).collect(),
        unterminated: !existing.is_empty() && !existing.ends_with('\n'),
    })
}

/// Appends every comment whose display text hasn't been stored yet, returning how many lines
/// were written.
///
/// Only the display text is compared: two comments with the same text on different videos are
/// stored once.
pub async fn append_comments(comments: &[CommentSnippet], path: &Path) -> eyre::Result<usize> {
    let Stored {
        mut seen,
        mut unterminated,
    } = read_stored(path).await?;

    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("open {} for appending", path.display()))?;
    let mut file = tokio::io::BufWriter::new(file);

    let mut written = 0;
    for comment in comments {
        if seen.contains(&comment.text_display) {
            tracing::trace!(text = %comment.text_display, "skipping already stored comment");
            continue;
        }

        let mut line = String::new();
        if unterminated {
            line.push('\n');
            unterminated = false;
        }
        line.push_str(&serde_json::to_string(comment).context("serialize comment")?);
        line.push('\n');
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("append comment to {}", path.display()))?;
        seen.insert(comment.text_display.clone());
        written += 1;
    }

    file.flush()
        .await
        .with_context(|| format!("flush {}", path.display()))?;
    tracing::debug!(written, path = %path.display(), "appended comments");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn comment(author: &str, text: &str) -> CommentSnippet {
        CommentSnippet::new(author, text)
    }

    async fn stored_lines(path: &Path) -> Vec<String> {
        tokio::fs::read_to_string(path)
            .await
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn creates_file_with_one_line_per_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_comments.txt");

        let written = append_comments(&[comment("U1", "hello"), comment("U1", "world")], &path)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let lines = stored_lines(&path).await;
        assert_eq!(lines.len(), 2);
        let first: CommentSnippet = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first, comment("U1", "hello"));
    }

    #[tokio::test]
    async fn duplicate_text_in_one_batch_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_comments.txt");

        let mut other_video = comment("U2", "same");
        other_video.video_id = Some("V2".to_string());
        let written = append_comments(&[comment("U1", "same"), other_video], &path)
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(stored_lines(&path).await.len(), 1);
    }

    #[tokio::test]
    async fn repeated_runs_do_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_comments.txt");

        append_comments(&[comment("U1", "hello")], &path).await.unwrap();
        let written = append_comments(&[comment("U1", "hello"), comment("U1", "new")], &path)
            .await
            .unwrap();
        assert_eq!(written, 1);

        let texts: Vec<_> = stored_lines(&path)
            .await
            .iter()
            .map(|line| stored_text(line))
            .collect();
        assert_eq!(texts, vec!["hello", "new"]);
    }

    #[tokio::test]
    async fn keeps_foreign_lines_and_matches_them_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_comments.txt");
        tokio::fs::write(&path, "hand written note\n").await.unwrap();

        let written = append_comments(
            &[comment("U1", "hand written note"), comment("U1", "fresh")],
            &path,
        )
        .await
        .unwrap();
        assert_eq!(written, 1);

        let lines = stored_lines(&path).await;
        assert_eq!(lines[0], "hand written note");
        assert_eq!(stored_text(&lines[1]), "fresh");
    }

    #[tokio::test]
    async fn file_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_comments.txt");
        tokio::fs::write(&path, "hand written note").await.unwrap();

        assert_eq!(append_comments(&[comment("U1", "hello")], &path).await.unwrap(), 1);
        assert_eq!(append_comments(&[comment("U1", "hello")], &path).await.unwrap(), 0);

        let lines = stored_lines(&path).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "hand written note");
        assert_eq!(stored_text(&lines[1]), "hello");
    }

    #[tokio::test]
    async fn text_with_newlines_stays_on_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_comments.txt");

        append_comments(&[comment("U1", "two\nlines")], &path).await.unwrap();
        append_comments(&[comment("U1", "two\nlines")], &path).await.unwrap();
        assert_eq!(stored_lines(&path).await.len(), 1);
    }

    #[tokio::test]
    async fn empty_batch_still_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_comments.txt");

        assert_eq!(append_comments(&[], &path).await.unwrap(), 0);
        assert!(stored_lines(&path).await.is_empty());
    }

    #[tokio::test]
    async fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("user_comments.txt");
        assert!(append_comments(&[comment("U1", "x")], &path).await.is_err());
    }
}
