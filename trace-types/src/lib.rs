//! Shared types between the trace feed core and the UI
//!
//! These types are used by both:
//! - the fetch/filter core (native Rust)
//! - the trace viewer frontend (via generated TypeScript bindings)
//!
//! Serializable with serde for JSON over HTTP; field names mirror the
//! remote trace API exactly (mixed camelCase/lowercase, as the API sends
//! them).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Protocol tag carried by NET/ROM records.
pub const NETROM_PROTOCOL: &str = "NET/ROM";
/// `l3type` value marking a routing broadcast.
pub const ROUTING_INFO: &str = "Routing info";
/// Classification tag for INP3 routing records.
pub const INP3_TYPE: &str = "INP3";
/// Classification tag for NODES broadcasts.
pub const NODES_TYPE: &str = "NODES";
/// AX.25 frame type of an unnumbered information frame.
pub const L2_UI: &str = "UI";
/// AX.25 frame type of a frame reject.
pub const L2_FRMR: &str = "FRMR";

// ============================================================================
// Trace records
// ============================================================================

/// Direction of an observed frame relative to the reporting station.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Dirn {
    #[default]
    Sent,
    Rcvd,
}

/// Port identifier as reported by a node. Some firmwares report numeric
/// port ids, others report names, so both shapes must deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum PortId {
    Number(i64),
    Name(String),
}

impl PortId {
    /// Parse a textual port id, preferring the numeric form.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Name(raw.to_string()),
        }
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(s) => write!(f, "{s}"),
        }
    }
}

/// One entry of a NODES routing broadcast (`l3type == "Routing info"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export)]
pub struct RouteEntry {
    pub call: String,
    pub hops: u32,
    /// One-way trip time reported for the route.
    pub tt: u32,
}

/// One observed AX.25 frame/event, immutable once received.
///
/// Layer-2 fields (`l2_type`, `cr`, `pf`, `tseq`, `rseq`) are always
/// meaningful; layer-3/4 fields are present only on NET/ROM traffic, and
/// `nodes` only when the record is a routing broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export)]
pub struct TraceRecord {
    /// Station that reported the frame.
    #[serde(rename = "reportFrom")]
    pub report_from: String,
    pub port: PortId,
    pub dirn: Dirn,
    pub srce: String,
    pub dest: String,
    /// AX.25 frame type: C, D, UA, UI, FRMR, RR, ...
    #[serde(rename = "l2Type")]
    pub l2_type: String,
    /// Command/response flag.
    pub cr: bool,
    /// Poll/final flag.
    pub pf: Option<bool>,
    /// Link-layer send sequence number.
    pub tseq: Option<u32>,
    /// Link-layer receive sequence number.
    pub rseq: Option<u32>,
    /// Network protocol tag, e.g. "NET/ROM".
    pub ptcl: Option<String>,
    #[serde(rename = "toCct")]
    pub to_cct: Option<u32>,
    #[serde(rename = "fromCct")]
    pub from_cct: Option<u32>,
    /// NET/ROM transport send sequence number.
    #[serde(rename = "txSeq")]
    pub tx_seq: Option<u32>,
    /// NET/ROM transport receive sequence number.
    #[serde(rename = "rxSeq")]
    pub rx_seq: Option<u32>,
    #[serde(rename = "payLen")]
    pub pay_len: Option<u32>,
    /// High-level classification, e.g. "NODES", "INP3".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "l3type")]
    pub l3_type: Option<String>,
    #[serde(rename = "l3src")]
    pub l3_src: Option<String>,
    #[serde(rename = "l3dst")]
    pub l3_dst: Option<String>,
    #[serde(rename = "l4type")]
    pub l4_type: Option<String>,
    /// Route entries when `l3type == "Routing info"`.
    pub nodes: Option<Vec<RouteEntry>>,
    /// Epoch-seconds timestamp (older nodes).
    pub time: Option<i64>,
    /// ISO timestamp (newer nodes).
    pub timestamp: Option<DateTime<Utc>>,
}

impl TraceRecord {
    /// Resolve the record timestamp from whichever field the node sent.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .or_else(|| self.time.and_then(|secs| Utc.timestamp_opt(secs, 0).single()))
    }
}

// ============================================================================
// API pages
// ============================================================================

/// Pagination envelope of one trace API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct PageInfo {
    /// Total matching records server-side.
    #[serde(rename = "totalCount")]
    pub total_count: u64,
    /// Opaque cursor for the next page; absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

/// One trace API response unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct TracePage {
    pub data: Vec<TraceRecord>,
    pub page: PageInfo,
}

// ============================================================================
// Queries
// ============================================================================

/// Which trace endpoint variant to query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TraceLayer {
    #[default]
    All,
    L2,
    L3,
}

impl TraceLayer {
    /// Path suffix appended to the `/history/traces` endpoint.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::L2 => "/l2",
            Self::L3 => "/l3",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Some(Self::All),
            "l2" => Some(Self::L2),
            "l3" => Some(Self::L3),
            _ => None,
        }
    }
}

/// Search parameters for one fetch session. The time range is validated by
/// the caller (start <= end) before a session is started.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct TraceQuery {
    pub report_from: Vec<String>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub layer: TraceLayer,
    pub l3_type: Option<String>,
    /// Records per page requested from the API.
    pub page_size: u32,
    pub include_count: bool,
}

// ============================================================================
// Facets
// ============================================================================

/// A distinct NET/ROM circuit offered as a filter choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export)]
pub struct NetRomCircuit {
    #[serde(rename = "toCct")]
    pub to_cct: u32,
    #[serde(rename = "l3src")]
    pub l3_src: Option<String>,
    #[serde(rename = "l3dst")]
    pub l3_dst: Option<String>,
}

/// A distinct (port, reporting station) combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export)]
pub struct PortFacet {
    pub port: PortId,
    #[serde(rename = "reportFrom")]
    pub report_from: String,
}

/// An unordered pair of callsigns. The pair is canonicalized on
/// construction (lexicographically smaller callsign first) so `(A,B)` and
/// `(B,A)` are the same facet, matching the symmetric filter rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export)]
pub struct CallsignPair {
    pub first: String,
    pub second: String,
}

impl CallsignPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                first: a.to_string(),
                second: b.to_string(),
            }
        } else {
            Self {
                first: b.to_string(),
                second: a.to_string(),
            }
        }
    }

    /// Symmetric match against a record's source/destination callsigns.
    pub fn matches(&self, srce: &str, dest: &str) -> bool {
        (self.first == srce && self.second == dest) || (self.first == dest && self.second == srce)
    }
}

// ============================================================================
// Filter criteria
// ============================================================================

/// User-controlled filter state applied to the published trace set.
/// Empty selection vectors impose no constraint in their dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export)]
pub struct FilterCriteria {
    pub circuits: Vec<NetRomCircuit>,
    pub ports: Vec<PortFacet>,
    pub callsign_pairs: Vec<CallsignPair>,
    pub suppress_nodes: bool,
    pub suppress_ui: bool,
    pub suppress_netrom: bool,
    pub suppress_inp3: bool,
    pub show_only_frmr: bool,
    pub show_only_routing_info: bool,
}

impl FilterCriteria {
    /// True when no stage of the pipeline would drop anything.
    pub fn is_neutral(&self) -> bool {
        self.circuits.is_empty()
            && self.ports.is_empty()
            && self.callsign_pairs.is_empty()
            && !self.suppress_nodes
            && !self.suppress_ui
            && !self.suppress_netrom
            && !self.suppress_inp3
            && !self.show_only_frmr
            && !self.show_only_routing_info
    }
}
