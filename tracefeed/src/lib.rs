//! AX.25 trace feed core.
//!
//! Runtime shape:
//! 1) `session::FetchSession` pulls cursor-paginated pages from a
//!    `client::TracePageSource`, capped at a configured maximum download,
//!    publishing progress snapshots at each checkpoint
//! 2) `facets` derives the selectable filter dimensions (circuits, ports,
//!    callsign pairs) from the published trace set
//! 3) `filter` narrows the trace set by the user's `FilterCriteria`
//! 4) `query` encodes/decodes the search + filter state for URL persistence
//!
//! Rendering, theming and export are the frontend's concern; this crate
//! only produces the data the viewer displays.

pub mod client;
pub mod config;
pub mod facets;
pub mod filter;
pub mod query;
pub mod session;
