//! URL persistence of the search + filter state.
//!
//! Short-key query-string contract shared with the viewer: repeated `rf`
//! for report-from stations, `from`/`to` ISO timestamps, repeated
//! `cct`/`port`/`pair` for selected facets, and view/suppression booleans
//! serialized as `"true"` when set and omitted when clear. Decoding is
//! tolerant: unknown keys and malformed values are skipped, never fatal.

use chrono::{DateTime, Utc};
use trace_types::{CallsignPair, FilterCriteria, NetRomCircuit, PortFacet, PortId};

/// Separator inside composite facet values (`cct`, `port`, `pair`).
/// `~` never occurs in callsigns or circuit ids, so no escaping is needed.
const FIELD_SEP: char = '~';

const KEY_REPORT_FROM: &str = "rf";
const KEY_FROM: &str = "from";
const KEY_TO: &str = "to";
const KEY_CIRCUIT: &str = "cct";
const KEY_PORT: &str = "port";
const KEY_PAIR: &str = "pair";
const KEY_NO_NODES: &str = "noNodes";
const KEY_NO_UI: &str = "noUi";
const KEY_NO_NETROM: &str = "noNetrom";
const KEY_NO_INP3: &str = "noInp3";
const KEY_FRMR_ONLY: &str = "frmrOnly";
const KEY_ROUTING_ONLY: &str = "routingOnly";

/// Everything the viewer persists in the URL for one search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    pub report_from: Vec<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub criteria: FilterCriteria,
}

/// Encode to ordered key/value pairs, ready for form-urlencoding.
pub fn encode(state: &QueryState) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for station in &state.report_from {
        pairs.push((KEY_REPORT_FROM.to_string(), station.clone()));
    }
    if let Some(from) = state.from {
        pairs.push((KEY_FROM.to_string(), from.to_rfc3339()));
    }
    if let Some(to) = state.to {
        pairs.push((KEY_TO.to_string(), to.to_rfc3339()));
    }

    let criteria = &state.criteria;
    for circuit in &criteria.circuits {
        pairs.push((KEY_CIRCUIT.to_string(), encode_circuit(circuit)));
    }
    for port in &criteria.ports {
        pairs.push((
            KEY_PORT.to_string(),
            format!("{}{FIELD_SEP}{}", port.port, port.report_from),
        ));
    }
    for pair in &criteria.callsign_pairs {
        pairs.push((
            KEY_PAIR.to_string(),
            format!("{}{FIELD_SEP}{}", pair.first, pair.second),
        ));
    }

    for (key, set) in [
        (KEY_NO_NODES, criteria.suppress_nodes),
        (KEY_NO_UI, criteria.suppress_ui),
        (KEY_NO_NETROM, criteria.suppress_netrom),
        (KEY_NO_INP3, criteria.suppress_inp3),
        (KEY_FRMR_ONLY, criteria.show_only_frmr),
        (KEY_ROUTING_ONLY, criteria.show_only_routing_info),
    ] {
        if set {
            pairs.push((key.to_string(), "true".to_string()));
        }
    }

    pairs
}

/// Encode to a form-urlencoded query string.
pub fn encode_query_string(state: &QueryState) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in encode(state) {
        serializer.append_pair(&key, &value);
    }
    serializer.finish()
}

/// Decode from key/value pairs. Unknown keys and malformed values are
/// skipped so a stale or hand-edited URL still yields a usable state.
pub fn decode<'a, I>(pairs: I) -> QueryState
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut state = QueryState::default();
    for (key, value) in pairs {
        match key {
            KEY_REPORT_FROM => state.report_from.push(value.to_string()),
            KEY_FROM => state.from = parse_timestamp(value).or(state.from),
            KEY_TO => state.to = parse_timestamp(value).or(state.to),
            KEY_CIRCUIT => {
                if let Some(circuit) = decode_circuit(value) {
                    state.criteria.circuits.push(circuit);
                }
            }
            KEY_PORT => {
                if let Some((port, report_from)) = value.split_once(FIELD_SEP) {
                    state.criteria.ports.push(PortFacet {
                        port: PortId::parse(port),
                        report_from: report_from.to_string(),
                    });
                }
            }
            KEY_PAIR => {
                if let Some((first, second)) = value.split_once(FIELD_SEP) {
                    state
                        .criteria
                        .callsign_pairs
                        .push(CallsignPair::new(first, second));
                }
            }
            KEY_NO_NODES => state.criteria.suppress_nodes = value == "true",
            KEY_NO_UI => state.criteria.suppress_ui = value == "true",
            KEY_NO_NETROM => state.criteria.suppress_netrom = value == "true",
            KEY_NO_INP3 => state.criteria.suppress_inp3 = value == "true",
            KEY_FRMR_ONLY => state.criteria.show_only_frmr = value == "true",
            KEY_ROUTING_ONLY => state.criteria.show_only_routing_info = value == "true",
            _ => {}
        }
    }
    state
}

/// Decode from a form-urlencoded query string.
pub fn decode_query_string(raw: &str) -> QueryState {
    let parsed: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    decode(parsed.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn encode_circuit(circuit: &NetRomCircuit) -> String {
    format!(
        "{}{FIELD_SEP}{}{FIELD_SEP}{}",
        circuit.to_cct,
        circuit.l3_src.as_deref().unwrap_or(""),
        circuit.l3_dst.as_deref().unwrap_or("")
    )
}

fn decode_circuit(value: &str) -> Option<NetRomCircuit> {
    let mut fields = value.splitn(3, FIELD_SEP);
    let to_cct = fields.next()?.parse::<u32>().ok()?;
    let l3_src = fields.next().filter(|s| !s.is_empty());
    let l3_dst = fields.next().filter(|s| !s.is_empty());
    Some(NetRomCircuit {
        to_cct,
        l3_src: l3_src.map(ToString::to_string),
        l3_dst: l3_dst.map(ToString::to_string),
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
