//! End-to-end pagination behaviour of `FetchSession` against a scripted
//! in-memory page source: page math, cap enforcement, and failure
//! handling, without any network.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::mpsc;
use trace_types::{PageInfo, TraceLayer, TracePage, TraceQuery, TraceRecord};
use tracefeed::client::{TraceFetchError, TracePageSource};
use tracefeed::session::{FetchLimits, FetchSession, TraceSnapshot};

/// Serves `total` synthetic records in `page_size` chunks, recording the
/// cursor of every request. Optionally fails the nth request.
struct ScriptedSource {
    total: u64,
    page_size: u64,
    fail_on_page: Option<u32>,
    calls: Mutex<Vec<Option<String>>>,
}

impl ScriptedSource {
    fn new(total: u64, page_size: u64) -> Self {
        Self {
            total,
            page_size,
            fail_on_page: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(total: u64, page_size: u64, page: u32) -> Self {
        Self {
            fail_on_page: Some(page),
            ..Self::new(total, page_size)
        }
    }

    fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn record(i: u64) -> TraceRecord {
        TraceRecord {
            report_from: "GB7BPQ".to_string(),
            srce: format!("G8BPQ-{}", i % 16),
            dest: "G7XYZ-2".to_string(),
            l2_type: "I".to_string(),
            time: Some(1_700_000_000 + i as i64),
            ..TraceRecord::default()
        }
    }
}

#[async_trait]
impl TracePageSource for ScriptedSource {
    async fn fetch_page(
        &self,
        _query: &TraceQuery,
        cursor: Option<&str>,
    ) -> Result<TracePage, TraceFetchError> {
        let page_index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(cursor.map(ToString::to_string));
            calls.len() as u32
        };
        if self.fail_on_page == Some(page_index) {
            return Err(TraceFetchError::Request("connection reset".to_string()));
        }

        let offset = u64::from(page_index - 1) * self.page_size;
        let count = self.page_size.min(self.total.saturating_sub(offset));
        let data = (offset..offset + count).map(Self::record).collect();
        let next = if offset + count < self.total {
            Some(format!("cursor-{page_index}"))
        } else {
            None
        };
        Ok(TracePage {
            data,
            page: PageInfo {
                total_count: self.total,
                next,
            },
        })
    }
}

fn query(page_size: u32) -> TraceQuery {
    TraceQuery {
        report_from: vec!["GB7BPQ".to_string()],
        from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        to: Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap(),
        layer: TraceLayer::All,
        l3_type: None,
        page_size,
        include_count: true,
    }
}

fn limits(page_size: u32, max_download: u64) -> FetchLimits {
    FetchLimits {
        page_size,
        max_download,
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TraceSnapshot>) -> Vec<TraceSnapshot> {
    let mut snapshots = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        snapshots.push(snapshot);
    }
    snapshots
}

#[tokio::test]
async fn normal_pagination_fetches_every_page() {
    let source = ScriptedSource::new(1200, 500);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let session = FetchSession::new(limits(500, 5000));
    let outcome = session
        .run(&source, &query(500), Some(&tx))
        .await
        .expect("session completes");
    drop(tx);

    assert_eq!(
        source.calls(),
        vec![
            None,
            Some("cursor-1".to_string()),
            Some("cursor-2".to_string()),
        ]
    );
    let downloaded: Vec<u64> = drain(&mut rx).iter().map(|s| s.downloaded_count).collect();
    assert_eq!(downloaded, vec![500, 1000, 1200]);

    assert!(!outcome.capped);
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.record_count, 1200);
    assert_eq!(outcome.downloaded_count, 1200);
    assert_eq!(outcome.traces.len(), 1200);
}

#[tokio::test]
async fn cap_stops_fetching_without_requesting_past_it() {
    let source = ScriptedSource::new(20_000, 500);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let session = FetchSession::new(limits(500, 5000));
    let outcome = session
        .run(&source, &query(500), Some(&tx))
        .await
        .expect("capped is not an error");
    drop(tx);

    // Ten pages fill the cap exactly; the eleventh is never requested.
    assert_eq!(source.calls().len(), 10);
    assert!(outcome.capped);
    assert_eq!(outcome.downloaded_count, 5000);
    assert_eq!(outcome.traces.len(), 5000);
    assert_eq!(outcome.record_count, 20_000);

    let snapshots = drain(&mut rx);
    assert_eq!(snapshots.len(), 10);
    assert!(snapshots.last().unwrap().capped);
    assert!(snapshots[..9].iter().all(|s| !s.capped));
}

#[tokio::test]
async fn failure_keeps_previously_published_snapshots() {
    let source = ScriptedSource::failing_on(1200, 500, 2);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let session = FetchSession::new(limits(500, 5000));
    let result = session.run(&source, &query(500), Some(&tx)).await;
    drop(tx);

    assert!(matches!(result, Err(TraceFetchError::Request(_))));
    // Only the first page was published; the failing page merged nothing.
    let snapshots = drain(&mut rx);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].downloaded_count, 500);
    assert_eq!(snapshots[0].traces.len(), 500);
    assert_eq!(snapshots[0].record_count, 1200);
}

#[tokio::test]
async fn failure_on_first_page_publishes_nothing() {
    let source = ScriptedSource::failing_on(1200, 500, 1);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let session = FetchSession::new(limits(500, 5000));
    let result = session.run(&source, &query(500), Some(&tx)).await;
    drop(tx);

    assert!(result.is_err());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn single_short_page_completes_in_one_request() {
    let source = ScriptedSource::new(42, 500);
    let session = FetchSession::new(limits(500, 5000));
    let outcome = session
        .run(&source, &query(500), None)
        .await
        .expect("completes");

    assert_eq!(source.calls(), vec![None]);
    assert_eq!(outcome.downloaded_count, 42);
    assert_eq!(outcome.traces.len(), 42);
    assert!(!outcome.capped);
}
