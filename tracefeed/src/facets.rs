//! Facet extraction.
//!
//! One full pass over the published trace set per facet dimension,
//! producing the deduplicated choice lists the viewer offers for
//! filtering. Pure and side-effect free: identical input yields identical
//! output.

use std::collections::HashSet;

use trace_types::{CallsignPair, NetRomCircuit, PortFacet, TraceRecord, NETROM_PROTOCOL};

/// Distinct NET/ROM circuits, sorted ascending by circuit id.
pub fn extract_circuits(traces: &[TraceRecord]) -> Vec<NetRomCircuit> {
    let mut seen = HashSet::new();
    let mut circuits = Vec::new();
    for record in traces {
        if record.ptcl.as_deref() != Some(NETROM_PROTOCOL) {
            continue;
        }
        let Some(to_cct) = record.to_cct else {
            continue;
        };
        let circuit = NetRomCircuit {
            to_cct,
            l3_src: record.l3_src.clone(),
            l3_dst: record.l3_dst.clone(),
        };
        if seen.insert(circuit.clone()) {
            circuits.push(circuit);
        }
    }
    circuits.sort_by_key(|c| c.to_cct);
    circuits
}

/// Distinct (port, reporting station) combinations in first-seen order.
pub fn extract_ports(traces: &[TraceRecord]) -> Vec<PortFacet> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();
    for record in traces {
        let port = PortFacet {
            port: record.port.clone(),
            report_from: record.report_from.clone(),
        };
        if seen.insert(port.clone()) {
            ports.push(port);
        }
    }
    ports
}

/// Distinct callsign pairs in first-seen order. Pairs are canonicalized by
/// `CallsignPair::new`, so a QSO seen in both directions is one facet.
pub fn extract_callsign_pairs(traces: &[TraceRecord]) -> Vec<CallsignPair> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for record in traces {
        let pair = CallsignPair::new(&record.srce, &record.dest);
        if seen.insert(pair.clone()) {
            pairs.push(pair);
        }
    }
    pairs
}
