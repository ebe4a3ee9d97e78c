//! Structured route records and a grammar-driven parser for device route-table output.
//!
//! This crate provides:
//! - the record model (`RouteRecord`, `RouteType`, `RouteProtocol`, `NextHop`)
//! - a position-aware [`Cursor`] over raw command output
//! - the [`Grammar`] description implemented by vendor dialect crates
//! - the generic state machine (`process`, `process_records`, `transition`)
//!
//! Parsing is best effort:
//! - malformed records are skipped and reported as [`ParseFinding`]s
//! - the parser resynchronizes on the next record or table anchor
//! - no input ever makes `process` fail
//!
//! # Example
//!
//! ```rust
//! use routesnap_ir::{NextHop, RouteProtocol, RouteRecord};
//!
//! let record = RouteRecord::new("10.0.0.0/24")
//!     .expect("non-empty prefix")
//!     .with_protocol(RouteProtocol::Isis)
//!     .with_next_hop(NextHop::parse("10.10.10.1").expect("next hop"))
//!     .with_metric(100);
//! assert!(record.next_hop.as_ref().is_some_and(NextHop::is_address));
//! ```

mod cursor;
mod engine;
mod grammar;
mod timestamp;
pub mod token;

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use cursor::Cursor;
pub use engine::{ParserState, Step, StepOutput, TableContext, process, process_records, transition};
pub use grammar::{
    FieldRule, FieldSpec, Grammar, Layout, NextHopStyle, RecordAnchor, TableHeader,
};
pub use timestamp::{TIMESTAMP_FORMAT, Timestamp, TimestampError};

/// Source span pointing to a single line and byte range in the original input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// Parser-level anomaly attached to a source span.
///
/// Codes are kebab-case and stable: `malformed-record`, `truncated-record`,
/// `service-mismatch`, `missing-title`, `invalid-service`,
/// `missing-table-start`, `unexpected-content`, `stalled-input`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFinding {
    pub code: String,
    pub message: String,
    pub span: Span,
}

impl ParseFinding {
    pub fn new(code: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            span,
        }
    }
}

/// Metadata attached during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub grammar: String,
    pub original_bytes: usize,
    pub line_count: usize,
    pub parse_findings: Vec<ParseFinding>,
}

/// Route tables discovered in one text blob, keyed by service (router instance) id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteTables {
    pub metadata: ParseMetadata,
    pub tables: BTreeMap<String, Vec<RouteRecord>>,
}

impl RouteTables {
    /// Create an empty result with caller-supplied metadata.
    pub fn new(metadata: ParseMetadata) -> Self {
        Self {
            metadata,
            tables: BTreeMap::new(),
        }
    }

    /// Register a table key. Returns `false` when the key was already present.
    pub fn register(&mut self, service: &str) -> bool {
        if self.tables.contains_key(service) {
            return false;
        }
        self.tables.insert(service.to_string(), Vec::new());
        true
    }

    /// Append a record to `service`, registering the key if needed.
    pub fn push(&mut self, service: &str, record: RouteRecord) {
        self.tables
            .entry(service.to_string())
            .or_default()
            .push(record);
    }

    /// Service ids in deterministic order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Records of one service, `None` when the service never appeared.
    pub fn routes(&self, service: &str) -> Option<&[RouteRecord]> {
        self.tables.get(service).map(Vec::as_slice)
    }

    /// Total number of records across all tables.
    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn findings(&self) -> &[ParseFinding] {
        &self.metadata.parse_findings
    }
}

/// Errors raised when building model values from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("route prefix must not be empty")]
    EmptyPrefix,
    #[error("next hop must not be empty")]
    EmptyNextHop,
    #[error("unknown {kind} '{value}'")]
    Unknown { kind: &'static str, value: String },
}

/// Route type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RouteType {
    Remote,
    Local,
    #[serde(rename = "Blackh*")]
    Blackhole,
}

impl RouteType {
    /// Vendor spelling as printed in route tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "Remote",
            Self::Local => "Local",
            Self::Blackhole => "Blackh*",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Remote" => Ok(Self::Remote),
            "Local" => Ok(Self::Local),
            "Blackh*" | "Blackhole" => Ok(Self::Blackhole),
            other => Err(RecordError::Unknown {
                kind: "route type",
                value: other.to_string(),
            }),
        }
    }
}

/// Source protocol of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RouteProtocol {
    #[serde(rename = "BGP")]
    Bgp,
    #[serde(rename = "BGP_LABEL")]
    BgpLabel,
    #[serde(rename = "BGP VPN")]
    BgpVpn,
    #[serde(rename = "IBGP")]
    Ibgp,
    #[serde(rename = "EBGP")]
    Ebgp,
    #[serde(rename = "ISIS")]
    Isis,
    #[serde(rename = "ISIS-L1")]
    IsisL1,
    #[serde(rename = "ISIS-L2")]
    IsisL2,
    #[serde(rename = "OSPF")]
    Ospf,
    /// OSPF AS-external.
    #[serde(rename = "O_ASE")]
    OspfAse,
    /// OSPF not-so-stubby area external.
    #[serde(rename = "O_NSSA")]
    OspfNssa,
    Static,
    #[serde(rename = "Aggr")]
    Aggregate,
    Local,
    #[serde(rename = "VPN Leak")]
    VpnLeak,
    Direct,
    #[serde(rename = "RIP")]
    Rip,
    #[serde(rename = "UNR")]
    Unr,
}

impl RouteProtocol {
    pub const ALL: [RouteProtocol; 18] = [
        Self::Bgp,
        Self::BgpLabel,
        Self::BgpVpn,
        Self::Ibgp,
        Self::Ebgp,
        Self::Isis,
        Self::IsisL1,
        Self::IsisL2,
        Self::Ospf,
        Self::OspfAse,
        Self::OspfNssa,
        Self::Static,
        Self::Aggregate,
        Self::Local,
        Self::VpnLeak,
        Self::Direct,
        Self::Rip,
        Self::Unr,
    ];

    /// Canonical spelling, shared with storage and serde.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bgp => "BGP",
            Self::BgpLabel => "BGP_LABEL",
            Self::BgpVpn => "BGP VPN",
            Self::Ibgp => "IBGP",
            Self::Ebgp => "EBGP",
            Self::Isis => "ISIS",
            Self::IsisL1 => "ISIS-L1",
            Self::IsisL2 => "ISIS-L2",
            Self::Ospf => "OSPF",
            Self::OspfAse => "O_ASE",
            Self::OspfNssa => "O_NSSA",
            Self::Static => "Static",
            Self::Aggregate => "Aggr",
            Self::Local => "Local",
            Self::VpnLeak => "VPN Leak",
            Self::Direct => "Direct",
            Self::Rip => "RIP",
            Self::Unr => "UNR",
        }
    }
}

impl fmt::Display for RouteProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteProtocol {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|protocol| protocol.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RecordError::Unknown {
                kind: "route protocol",
                value: trimmed.to_string(),
            })
    }
}

/// Forwarding target of a route.
///
/// An address-shaped token is a routed next hop; anything else names an
/// interface or VRF. The literal `Black Hole` is its own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NextHop {
    Address(IpAddr),
    BlackHole,
    Named(String),
}

impl NextHop {
    /// Classify trimmed text; `None` for blank input.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(address) = trimmed.parse::<IpAddr>() {
            return Some(Self::Address(address));
        }
        if trimmed.eq_ignore_ascii_case("black hole") {
            return Some(Self::BlackHole);
        }
        Some(Self::Named(trimmed.to_string()))
    }

    pub fn is_address(&self) -> bool {
        matches!(self, Self::Address(_))
    }
}

impl fmt::Display for NextHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::BlackHole => f.write_str("Black Hole"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<NextHop> for String {
    fn from(value: NextHop) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for NextHop {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(RecordError::EmptyNextHop)
    }
}

/// BGP path attributes carried by `bgp routes` tables.
///
/// LocalPref and MED land in [`RouteRecord::preference`] and
/// [`RouteRecord::metric`]; the rest lives here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BgpAttributes {
    /// Empty when the device printed `No As-Path`.
    pub as_path: Vec<u32>,
    pub path_id: Option<u32>,
    pub label: Option<u32>,
    pub igp_cost: Option<u32>,
}

impl BgpAttributes {
    /// Space separated AS path, or `No As-Path`.
    pub fn as_path_text(&self) -> String {
        if self.as_path.is_empty() {
            return "No As-Path".to_string();
        }
        self.as_path
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Inverse of [`BgpAttributes::as_path_text`].
    pub fn parse_as_path(text: &str) -> Option<Vec<u32>> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("no as-path") || trimmed.is_empty() {
            return Some(Vec::new());
        }
        trimmed
            .split_whitespace()
            .map(|token| token.parse::<u32>().ok())
            .collect()
    }
}

/// One observed route entry.
///
/// `prefix` is always non-empty. A prefix may appear in several records of the
/// same table (multipath), distinguished by next hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub prefix: String,
    pub flags: Option<String>,
    pub route_type: Option<RouteType>,
    pub route_protocol: Option<RouteProtocol>,
    pub age: Option<String>,
    pub preference: Option<u32>,
    pub next_hop: Option<NextHop>,
    pub interface_next_hop: Option<String>,
    pub interface: Option<String>,
    pub metric: Option<u32>,
    pub bgp: Option<BgpAttributes>,
    pub hostname: Option<String>,
    pub service: Option<String>,
    pub timestamp: Option<Timestamp>,
}

impl RouteRecord {
    /// Create a record for `prefix` with every other field absent.
    pub fn new(prefix: impl Into<String>) -> Result<Self, RecordError> {
        let prefix = prefix.into();
        let trimmed = prefix.trim();
        if trimmed.is_empty() {
            return Err(RecordError::EmptyPrefix);
        }
        let mut record = Self::draft();
        record.prefix = trimmed.to_string();
        Ok(record)
    }

    /// Work-in-progress record used by the parser before the prefix field is read.
    pub(crate) fn draft() -> Self {
        Self {
            prefix: String::new(),
            flags: None,
            route_type: None,
            route_protocol: None,
            age: None,
            preference: None,
            next_hop: None,
            interface_next_hop: None,
            interface: None,
            metric: None,
            bgp: None,
            hostname: None,
            service: None,
            timestamp: None,
        }
    }

    pub fn with_next_hop(mut self, next_hop: NextHop) -> Self {
        self.next_hop = Some(next_hop);
        self
    }

    pub fn with_metric(mut self, metric: u32) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn with_protocol(mut self, protocol: RouteProtocol) -> Self {
        self.route_protocol = Some(protocol);
        self
    }

    pub fn with_preference(mut self, preference: u32) -> Self {
        self.preference = Some(preference);
        self
    }

    /// Attach the snapshot identity this record belongs to.
    pub fn stamp(&mut self, hostname: &str, service: &str, timestamp: &Timestamp) {
        self.hostname = Some(hostname.to_string());
        self.service = Some(service.to_string());
        self.timestamp = Some(timestamp.clone());
    }

    pub fn bgp_mut(&mut self) -> &mut BgpAttributes {
        self.bgp.get_or_insert_with(BgpAttributes::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_prefix() {
        assert_eq!(RouteRecord::new("   "), Err(RecordError::EmptyPrefix));
    }

    #[test]
    fn next_hop_classifies_addresses_names_and_black_hole() {
        assert!(matches!(
            NextHop::parse(" 10.0.0.1 "),
            Some(NextHop::Address(_))
        ));
        assert!(matches!(
            NextHop::parse("2001:db8::1"),
            Some(NextHop::Address(_))
        ));
        assert_eq!(NextHop::parse("Black Hole"), Some(NextHop::BlackHole));
        assert_eq!(
            NextHop::parse("  To REMOTE-HOSTNAME "),
            Some(NextHop::Named("To REMOTE-HOSTNAME".to_string()))
        );
        assert_eq!(NextHop::parse("  "), None);
    }

    #[test]
    fn protocol_spellings_round_trip_through_from_str() {
        for protocol in RouteProtocol::ALL {
            assert_eq!(protocol.as_str().parse::<RouteProtocol>(), Ok(protocol));
        }
        assert!("EIGRP".parse::<RouteProtocol>().is_err());
    }

    #[test]
    fn serde_uses_vendor_spellings() {
        let json = serde_json::to_string(&RouteProtocol::BgpVpn).expect("serialize protocol");
        assert_eq!(json, "\"BGP VPN\"");
        let json = serde_json::to_string(&RouteProtocol::OspfAse).expect("serialize protocol");
        assert_eq!(json, "\"O_ASE\"");
        let json = serde_json::to_string(&RouteType::Blackhole).expect("serialize type");
        assert_eq!(json, "\"Blackh*\"");
        let json = serde_json::to_string(&NextHop::BlackHole).expect("serialize next hop");
        assert_eq!(json, "\"Black Hole\"");
    }

    #[test]
    fn as_path_text_handles_empty_path() {
        let mut attrs = BgpAttributes::default();
        assert_eq!(attrs.as_path_text(), "No As-Path");
        attrs.as_path = vec![65001, 65002];
        assert_eq!(attrs.as_path_text(), "65001 65002");
        assert_eq!(
            BgpAttributes::parse_as_path("65001 65002"),
            Some(vec![65001, 65002])
        );
        assert_eq!(BgpAttributes::parse_as_path("No As-Path"), Some(Vec::new()));
    }

    #[test]
    fn register_reports_repeated_services() {
        let mut tables = RouteTables::default();
        assert!(tables.register("Base"));
        assert!(!tables.register("Base"));
        assert_eq!(tables.routes("Base"), Some(&[][..]));
        assert_eq!(tables.routes("99"), None);
    }
}
