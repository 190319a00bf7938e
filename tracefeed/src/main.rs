//! One-shot trace fetch for scripting and smoke testing.
//!
//! Reads the search window from the environment, runs a capped fetch
//! session against the configured node API, applies any persisted filter
//! string, and prints the filtered traces plus the derived facets as JSON
//! on stdout.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trace_types::{
    CallsignPair, FilterCriteria, NetRomCircuit, PortFacet, TraceLayer, TraceQuery, TraceRecord,
};
use tracefeed::client::HttpTraceApi;
use tracefeed::config::{env_csv, Config};
use tracefeed::facets::{extract_callsign_pairs, extract_circuits, extract_ports};
use tracefeed::filter::apply_filters;
use tracefeed::query::decode_query_string;
use tracefeed::session::{FetchLimits, FetchSession, TraceSnapshot};

#[derive(Debug, Serialize)]
struct FeedOutput {
    record_count: u64,
    downloaded_count: u64,
    capped: bool,
    pages_fetched: u32,
    circuits: Vec<NetRomCircuit>,
    ports: Vec<PortFacet>,
    callsign_pairs: Vec<CallsignPair>,
    traces: Vec<TraceRecord>,
}

fn env_timestamp(key: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
    match std::env::var(key) {
        Ok(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw.trim())
                .map_err(|e| anyhow::anyhow!("Failed to parse {key}={raw}: {e}"))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        Err(_) => Ok(None),
    }
}

fn build_query(config: &Config) -> anyhow::Result<TraceQuery> {
    let to = env_timestamp("TRACEFEED_TO")?.unwrap_or_else(Utc::now);
    let from = env_timestamp("TRACEFEED_FROM")?.unwrap_or_else(|| to - Duration::hours(1));
    // The fetch session assumes a validated window; check it here.
    if from > to {
        return Err(anyhow::anyhow!(
            "TRACEFEED_FROM ({from}) is after TRACEFEED_TO ({to})"
        ));
    }

    let layer = match std::env::var("TRACEFEED_LAYER") {
        Ok(raw) => TraceLayer::parse(&raw)
            .ok_or_else(|| anyhow::anyhow!("Invalid TRACEFEED_LAYER '{raw}'"))?,
        Err(_) => TraceLayer::All,
    };

    Ok(TraceQuery {
        report_from: env_csv("TRACEFEED_REPORT_FROM"),
        from,
        to,
        layer,
        l3_type: std::env::var("TRACEFEED_L3TYPE").ok().filter(|s| !s.is_empty()),
        page_size: config.page_size,
        include_count: true,
    })
}

fn criteria_from_env() -> FilterCriteria {
    match std::env::var("TRACEFEED_FILTER") {
        Ok(raw) => decode_query_string(&raw).criteria,
        Err(_) => FilterCriteria::default(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tracefeed=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        base_url = %config.api_base_url,
        page_size = config.page_size,
        max_download = config.max_download,
        "tracefeed starting"
    );

    let query = build_query(&config)?;
    let criteria = criteria_from_env();
    let api = HttpTraceApi::new(&config)?;

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<TraceSnapshot>();
    let reporter = tokio::spawn(async move {
        while let Some(snapshot) = progress_rx.recv().await {
            info!(
                downloaded = snapshot.downloaded_count,
                total = snapshot.record_count,
                capped = snapshot.capped,
                "fetch progress"
            );
        }
    });

    let session = FetchSession::new(FetchLimits::from_config(&config));
    let outcome = session.run(&api, &query, Some(&progress_tx)).await?;
    drop(progress_tx);
    let _ = reporter.await;

    let output = FeedOutput {
        record_count: outcome.record_count,
        downloaded_count: outcome.downloaded_count,
        capped: outcome.capped,
        pages_fetched: outcome.pages_fetched,
        circuits: extract_circuits(&outcome.traces),
        ports: extract_ports(&outcome.traces),
        callsign_pairs: extract_callsign_pairs(&outcome.traces),
        traces: apply_filters(&outcome.traces, &criteria),
    };
    serde_json::to_writer_pretty(std::io::stdout().lock(), &output)?;
    println!();

    Ok(())
}
