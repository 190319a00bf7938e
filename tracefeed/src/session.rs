//! Cursor-paginated fetch session.
//!
//! One `FetchSession` lives for exactly one query: it walks the API's
//! cursor chain sequentially, accumulates records up to a hard download
//! cap, and publishes an immutable snapshot at every checkpoint. The
//! per-page transitions are pure (`absorb_page`), so the CAPPED /
//! COMPLETED / FAILED paths are testable without any I/O; `run` is the
//! async driver that feeds pages from a `TracePageSource` into them.

use tokio::sync::mpsc;
use trace_types::{TracePage, TraceQuery, TraceRecord};

use crate::client::{TraceFetchError, TracePageSource};
use crate::config::Config;

/// Limits governing one fetch session.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// Records per page; must match the `limit` sent with the query.
    pub page_size: u32,
    /// Maximum total records to download before stopping early.
    pub max_download: u64,
}

impl FetchLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            max_download: config.max_download,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Init,
    FetchingFirst,
    FetchingNext,
    Completed,
    Capped,
    Failed,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Capped | Self::Failed)
    }
}

/// What to do after absorbing one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDisposition {
    /// More pages remain and the cap allows another; fetch with this cursor.
    Continue(String),
    /// The cursor chain ended; every matching record is downloaded.
    Completed,
    /// Another page exists but fetching it would exceed the cap.
    Capped,
}

/// Immutable snapshot published at each checkpoint. Receivers own their
/// copy; the session's accumulation buffer is never shared.
#[derive(Debug, Clone)]
pub struct TraceSnapshot {
    pub traces: Vec<TraceRecord>,
    /// Total matching records server-side, from the first page.
    pub record_count: u64,
    pub downloaded_count: u64,
    pub capped: bool,
}

/// Terminal result of a session; consumes the accumulation buffer.
#[derive(Debug)]
pub struct SessionOutcome {
    pub traces: Vec<TraceRecord>,
    pub record_count: u64,
    pub downloaded_count: u64,
    pub capped: bool,
    pub pages_fetched: u32,
}

#[derive(Debug)]
pub struct FetchSession {
    limits: FetchLimits,
    phase: SessionPhase,
    pages_fetched: u32,
    accumulated: Vec<TraceRecord>,
    total_count: u64,
    downloaded: u64,
    capped: bool,
}

impl FetchSession {
    pub fn new(limits: FetchLimits) -> Self {
        Self {
            limits,
            phase: SessionPhase::Init,
            pages_fetched: 0,
            accumulated: Vec::new(),
            total_count: 0,
            downloaded: 0,
            capped: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn snapshot(&self) -> TraceSnapshot {
        TraceSnapshot {
            traces: self.accumulated.clone(),
            record_count: self.total_count,
            downloaded_count: self.downloaded,
            capped: self.capped,
        }
    }

    /// Absorb one page response. Pure state transition: appends the page,
    /// updates the counters, and decides whether another page may be
    /// fetched. The cap is enforced *before* the page that would exceed it
    /// is ever requested, so no over-cap page is fetched or merged.
    pub fn absorb_page(&mut self, page: TracePage) -> PageDisposition {
        self.pages_fetched += 1;
        let page_size = u64::from(self.limits.page_size);

        if self.pages_fetched == 1 {
            self.total_count = page.page.total_count;
            self.accumulated = page.data;
        } else {
            self.accumulated.extend(page.data);
        }

        match page.page.next {
            Some(cursor) => {
                // First page: actual count if the whole result fits one
                // page, else one page's worth. After that: page math.
                self.downloaded = if self.pages_fetched == 1 {
                    page_size.min(self.total_count)
                } else {
                    u64::from(self.pages_fetched) * page_size
                };
                let projected = u64::from(self.pages_fetched + 1) * page_size;
                if projected > self.limits.max_download {
                    self.capped = true;
                    self.phase = SessionPhase::Capped;
                    PageDisposition::Capped
                } else {
                    self.phase = SessionPhase::FetchingNext;
                    PageDisposition::Continue(cursor)
                }
            }
            None => {
                self.downloaded = self.total_count;
                self.phase = SessionPhase::Completed;
                PageDisposition::Completed
            }
        }
    }

    fn fail(&mut self) {
        self.phase = SessionPhase::Failed;
    }

    fn into_outcome(self) -> SessionOutcome {
        SessionOutcome {
            traces: self.accumulated,
            record_count: self.total_count,
            downloaded_count: self.downloaded,
            capped: self.capped,
            pages_fetched: self.pages_fetched,
        }
    }

    /// Drive the session to a terminal state against `source`.
    ///
    /// Pages are requested strictly sequentially; each request needs the
    /// cursor from the previous response. Progress snapshots are sent on
    /// `progress` after every absorbed page, the terminal one included.
    /// On a transport or decode error the failing page is not merged, the
    /// last published snapshot stands, and the error propagates.
    pub async fn run(
        mut self,
        source: &dyn TracePageSource,
        query: &TraceQuery,
        progress: Option<&mpsc::UnboundedSender<TraceSnapshot>>,
    ) -> Result<SessionOutcome, TraceFetchError> {
        self.phase = SessionPhase::FetchingFirst;
        let mut cursor: Option<String> = None;

        loop {
            let page = match source.fetch_page(query, cursor.as_deref()).await {
                Ok(page) => page,
                Err(err) => {
                    self.fail();
                    tracing::warn!(
                        error = %err,
                        pages_fetched = self.pages_fetched,
                        "trace page fetch failed; last published snapshot stands"
                    );
                    return Err(err);
                }
            };

            let disposition = self.absorb_page(page);
            if let Some(tx) = progress {
                let _ = tx.send(self.snapshot());
            }

            match disposition {
                PageDisposition::Continue(next) => {
                    tracing::debug!(
                        pages_fetched = self.pages_fetched,
                        downloaded = self.downloaded,
                        total = self.total_count,
                        "trace page absorbed, continuing"
                    );
                    cursor = Some(next);
                }
                PageDisposition::Completed => {
                    tracing::info!(
                        pages_fetched = self.pages_fetched,
                        downloaded = self.downloaded,
                        "trace fetch completed"
                    );
                    return Ok(self.into_outcome());
                }
                PageDisposition::Capped => {
                    tracing::info!(
                        pages_fetched = self.pages_fetched,
                        downloaded = self.downloaded,
                        max_download = self.limits.max_download,
                        "trace fetch stopped at download cap"
                    );
                    return Ok(self.into_outcome());
                }
            }
        }
    }
}
