use std::fmt;
use std::str::FromStr;

use routesnap_ir::{NextHop, RouteProtocol, RouteRecord};
use serde::{Deserialize, Serialize};

/// Record field that participates in the Added/Deleted identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    Hostname,
    Service,
    Route,
    NextHop,
    Protocol,
}

impl IdentityField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hostname => "hostname",
            Self::Service => "service",
            Self::Route => "route",
            Self::NextHop => "next_hop",
            Self::Protocol => "protocol",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "hostname" => Ok(Self::Hostname),
            "service" => Ok(Self::Service),
            "route" | "prefix" => Ok(Self::Route),
            "next_hop" | "nexthop" => Ok(Self::NextHop),
            "protocol" | "route_protocol" => Ok(Self::Protocol),
            other => Err(format!("unknown identity field '{other}'")),
        }
    }
}

/// Options controlling how records are matched across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Sorted, deduplicated identity fields.
    fields: Vec<IdentityField>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self::new([
            IdentityField::Hostname,
            IdentityField::Service,
            IdentityField::Route,
        ])
    }
}

impl CompareOptions {
    /// Options keyed on an explicit field set. An empty set falls back to `route`.
    pub fn new(fields: impl IntoIterator<Item = IdentityField>) -> Self {
        let mut fields: Vec<IdentityField> = fields.into_iter().collect();
        fields.sort();
        fields.dedup();
        if fields.is_empty() {
            fields.push(IdentityField::Route);
        }
        Self { fields }
    }

    /// Identity on the prefix alone; multipath distinctions are ignored.
    pub fn route_only() -> Self {
        Self::new([IdentityField::Route])
    }

    pub fn with_field(self, field: IdentityField) -> Self {
        Self::new(self.fields.into_iter().chain([field]))
    }

    pub fn fields(&self) -> &[IdentityField] {
        &self.fields
    }
}

/// A path of a prefix present on both sides whose attributes differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub route: String,
    pub hostname: Option<String>,
    pub service: Option<String>,
    pub next_hop_before: Option<NextHop>,
    pub next_hop_after: Option<NextHop>,
    pub metric_before: Option<u32>,
    pub metric_after: Option<u32>,
    pub route_protocol_before: Option<RouteProtocol>,
    pub route_protocol_after: Option<RouteProtocol>,
    /// No unmatched path was left on the right side; every `*_after` is absent.
    pub path_removed: bool,
}

impl ChangeRecord {
    pub(crate) fn between(before: &RouteRecord, after: Option<&RouteRecord>) -> Self {
        Self {
            route: before.prefix.clone(),
            hostname: before.hostname.clone(),
            service: before.service.clone(),
            next_hop_before: before.next_hop.clone(),
            next_hop_after: after.and_then(|r| r.next_hop.clone()),
            metric_before: before.metric,
            metric_after: after.and_then(|r| r.metric),
            route_protocol_before: before.route_protocol,
            route_protocol_after: after.and_then(|r| r.route_protocol),
            path_removed: after.is_none(),
        }
    }

    pub fn next_hop_changed(&self) -> bool {
        self.next_hop_before != self.next_hop_after
    }

    pub fn metric_changed(&self) -> bool {
        self.metric_before != self.metric_after
    }

    pub fn protocol_changed(&self) -> bool {
        self.route_protocol_before != self.route_protocol_after
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonStats {
    pub added: usize,
    pub deleted: usize,
    pub changed: usize,
}

/// Added, Deleted and Changed records between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub added: Vec<RouteRecord>,
    pub deleted: Vec<RouteRecord>,
    pub changed: Vec<ChangeRecord>,
}

impl ComparisonResult {
    pub fn stats(&self) -> ComparisonStats {
        ComparisonStats {
            added: self.added.len(),
            deleted: self.deleted.len(),
            changed: self.changed.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.changed.is_empty()
    }

    /// The same result seen from the other direction.
    ///
    /// Removed paths have no counterpart in the reverse comparison and are
    /// dropped, so this mirrors `compare(t2, t1)` exactly only when every
    /// prefix keeps its path count.
    pub fn swap(self) -> Self {
        Self {
            added: self.deleted,
            deleted: self.added,
            changed: self
                .changed
                .into_iter()
                .filter(|change| !change.path_removed)
                .map(|change| ChangeRecord {
                    next_hop_before: change.next_hop_after,
                    next_hop_after: change.next_hop_before,
                    metric_before: change.metric_after,
                    metric_after: change.metric_before,
                    route_protocol_before: change.route_protocol_after,
                    route_protocol_after: change.route_protocol_before,
                    ..change
                })
                .collect(),
        }
    }
}
