//! Filter pipeline.
//!
//! Pure function from (trace set, criteria) to the displayed subset, in a
//! fixed stage order: facet intersection, then exclusive view modes, then
//! type suppression. Output preserves input order and re-applying the
//! pipeline to its own output is a no-op.

use trace_types::{
    FilterCriteria, TraceRecord, INP3_TYPE, L2_FRMR, L2_UI, NETROM_PROTOCOL, NODES_TYPE,
    ROUTING_INFO,
};

/// Apply the full pipeline, keeping surviving records in input order.
pub fn apply_filters(traces: &[TraceRecord], criteria: &FilterCriteria) -> Vec<TraceRecord> {
    traces
        .iter()
        .filter(|record| passes(record, criteria))
        .cloned()
        .collect()
}

fn passes(record: &TraceRecord, criteria: &FilterCriteria) -> bool {
    // Stage 1: facet intersection. OR within a dimension, AND across
    // dimensions; an empty selection imposes no constraint.
    if !criteria.circuits.is_empty()
        && !criteria
            .circuits
            .iter()
            .any(|circuit| record.to_cct == Some(circuit.to_cct))
    {
        return false;
    }
    if !criteria.ports.is_empty()
        && !criteria
            .ports
            .iter()
            .any(|facet| facet.port == record.port && facet.report_from == record.report_from)
    {
        return false;
    }
    if !criteria.callsign_pairs.is_empty()
        && !criteria
            .callsign_pairs
            .iter()
            .any(|pair| pair.matches(&record.srce, &record.dest))
    {
        return false;
    }

    // Stage 2: exclusive view modes.
    if criteria.show_only_routing_info && record.l3_type.as_deref() != Some(ROUTING_INFO) {
        return false;
    }
    if criteria.show_only_frmr && record.l2_type != L2_FRMR {
        return false;
    }

    // Stage 3: independent suppressions. INP3 is tagged in `type` by some
    // nodes and `l3type` by others; suppress on either.
    if criteria.suppress_netrom && record.ptcl.as_deref() == Some(NETROM_PROTOCOL) {
        return false;
    }
    if criteria.suppress_inp3
        && (record.kind.as_deref() == Some(INP3_TYPE)
            || record.l3_type.as_deref() == Some(INP3_TYPE))
    {
        return false;
    }
    if criteria.suppress_nodes && record.kind.as_deref() == Some(NODES_TYPE) {
        return false;
    }
    if criteria.suppress_ui && record.l2_type == L2_UI {
        return false;
    }

    true
}
