//! Interactive driver loop.
//!
//! Reads one topic per line, fetches news for it, asks the model for a digest and
//! prints it. Each topic is handled completely before the next prompt is shown;
//! nothing is kept between iterations.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::digest::DigestGenerator;
use crate::error::BriefError;
use crate::news::{render_items_block, NewsItem, NewsProvider};

/// Input that ends the loop (trimmed, case-insensitive)
pub const SENTINEL: &str = "exit";
pub const PROMPT: &str = "\nEnter topic (or 'exit'): ";
pub const NO_RESULTS_MESSAGE: &str = "No news found. Try a different topic.";
pub const PROVIDER_FAILURE_MESSAGE: &str = "News search is unavailable right now. Try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Fetching,
    Summarizing,
    Printing,
    Terminated,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The sentinel was entered
    Exited,
    /// Input stream closed
    EndOfInput,
    /// Shutdown was requested while waiting for input
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub outcome: LoopOutcome,
    /// Topics that reached the Printing state
    pub topics_processed: usize,
}

pub fn is_sentinel(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(SENTINEL)
}

pub struct Driver {
    news: Arc<dyn NewsProvider>,
    digest: DigestGenerator,
    max_results: usize,
    shutdown: Arc<Notify>,
}

impl Driver {
    pub fn new(news: Arc<dyn NewsProvider>, digest: DigestGenerator, max_results: usize) -> Self {
        Self {
            news,
            digest,
            max_results,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Share a shutdown signal; a notification ends the loop at the next prompt.
    pub fn with_shutdown(mut self, shutdown: Arc<Notify>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run until the sentinel, end of input, or shutdown.
    ///
    /// News provider failures are reported to the user and the loop continues.
    /// Model failures and I/O errors stop the loop and are returned.
    pub async fn run<R, W>(&self, mut input: R, output: &mut W) -> Result<LoopSummary, BriefError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line_buf: Vec<u8> = Vec::new();
        let mut state = LoopState::AwaitingInput;
        let mut outcome = LoopOutcome::EndOfInput;
        let mut topics_processed = 0usize;

        let mut topic = String::new();
        let mut items: Vec<NewsItem> = Vec::new();
        let mut digest = String::new();

        while state != LoopState::Terminated {
            debug!(?state, "driver step");
            state = match state {
                LoopState::AwaitingInput => {
                    output.write_all(PROMPT.as_bytes()).await?;
                    output.flush().await?;

                    let line = tokio::select! {
                        biased;
                        _ = self.shutdown.notified() => {
                            outcome = LoopOutcome::Interrupted;
                            None
                        }
                        line = read_line_lossy(&mut input, &mut line_buf) => line?,
                    };

                    match line {
                        None => LoopState::Terminated,
                        Some(l) if is_sentinel(&l) => {
                            outcome = LoopOutcome::Exited;
                            LoopState::Terminated
                        }
                        Some(l) if l.trim().is_empty() => LoopState::AwaitingInput,
                        Some(l) => {
                            topic = l.trim().to_string();
                            LoopState::Fetching
                        }
                    }
                }
                LoopState::Fetching => match self.news.fetch(&topic, self.max_results).await {
                    Ok(found) if found.is_empty() => {
                        info!(topic = %topic, "no news found");
                        write_line(output, NO_RESULTS_MESSAGE).await?;
                        LoopState::AwaitingInput
                    }
                    Ok(found) => {
                        items = found;
                        LoopState::Summarizing
                    }
                    Err(e @ BriefError::ProviderUnavailable(_)) => {
                        warn!(topic = %topic, error = %e, "news fetch failed");
                        write_line(output, PROVIDER_FAILURE_MESSAGE).await?;
                        LoopState::AwaitingInput
                    }
                    Err(e) => return Err(e),
                },
                LoopState::Summarizing => {
                    let block = render_items_block(&items);
                    items.clear();
                    digest = match self.digest.generate(&topic, &block).await {
                        Ok(text) => text,
                        Err(e) => {
                            error!(topic = %topic, error = %e, "digest failed, stopping loop");
                            return Err(e);
                        }
                    };
                    LoopState::Printing
                }
                LoopState::Printing => {
                    output.write_all(format!("\n{}\n", digest).as_bytes()).await?;
                    output.flush().await?;
                    digest.clear();
                    topics_processed += 1;
                    LoopState::AwaitingInput
                }
                LoopState::Terminated => LoopState::Terminated,
            };
        }

        info!(?outcome, topics_processed, "driver loop finished");
        Ok(LoopSummary {
            outcome,
            topics_processed,
        })
    }
}

/// Read one line, dropping the terminator. Bytes that are not valid UTF-8 are
/// replaced rather than failing the read. `None` at end of input.
async fn read_line_lossy<R: AsyncBufRead + Unpin>(
    input: &mut R,
    buf: &mut Vec<u8>,
) -> Result<Option<String>, BriefError> {
    buf.clear();
    if input.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    let line = String::from_utf8_lossy(buf);
    if matches!(line, std::borrow::Cow::Owned(_)) {
        warn!("input line was not valid UTF-8, invalid bytes replaced");
    }
    Ok(Some(line.into_owned()))
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> Result<(), BriefError> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
