//! Nokia SR OS (TiMOS) grammars for `routesnap_ir`.
//!
//! Two command outputs are understood:
//! - `show router [ID] route-table` (two-line records, optional `[flags]`)
//! - `show router [ID] bgp routes [vpn-ipv4]` (status codes, wrapped AS paths)
//!
//! # Example
//!
//! ```rust
//! use routesnap_dialect_timos::parse_timos_route_table;
//!
//! let output = "\
//! *A:pe1# show router route-table
//! Route Table (Router: Base)
//! -------------------------------------------------------------------------------
//! 1.1.1.2/32                                    Local   Local     76d07h31m  0
//!        loop-1                                                       0
//! -------------------------------------------------------------------------------
//! ";
//! let tables = parse_timos_route_table(output);
//! assert_eq!(tables.routes("Base").map(<[_]>::len), Some(1));
//! ```

use routesnap_ir::token::{abbreviates, command_tokens};
use routesnap_ir::{
    FieldRule, FieldSpec, Grammar, Layout, NextHopStyle, RecordAnchor, RouteProtocol, RouteTables,
    RouteType, TableHeader, process,
};

/// Route-table flag letters; digits count repeated next hops.
const ROUTE_FLAGS: &str = "0123456789nBLS";

/// BGP status and origin codes.
const BGP_STATUS: &str = "ushd*lx>bpie?";

const ROUTE_TYPES: &[(&str, RouteType)] = &[
    ("Remote", RouteType::Remote),
    ("Local", RouteType::Local),
    ("Blackh*", RouteType::Blackhole),
];

const ROUTE_PROTOCOLS: &[(&str, RouteProtocol)] = &[
    ("BGP_LABEL", RouteProtocol::BgpLabel),
    ("BGP VPN", RouteProtocol::BgpVpn),
    ("BGP", RouteProtocol::Bgp),
    ("ISIS", RouteProtocol::Isis),
    ("OSPF", RouteProtocol::Ospf),
    ("Static", RouteProtocol::Static),
    ("Aggr", RouteProtocol::Aggregate),
    ("Local", RouteProtocol::Local),
    ("VPN Leak", RouteProtocol::VpnLeak),
    ("RIP", RouteProtocol::Rip),
];

const ROUTE_TABLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldRule::Prefix),
    FieldSpec::new(FieldRule::BracketFlags {
        alphabet: ROUTE_FLAGS,
    })
    .optional(),
    FieldSpec::new(FieldRule::RouteType(ROUTE_TYPES)),
    FieldSpec::new(FieldRule::Protocol(ROUTE_PROTOCOLS)),
    FieldSpec::new(FieldRule::Age),
    FieldSpec::new(FieldRule::Preference).ends_line(),
    FieldSpec::new(FieldRule::NextHop(NextHopStyle::Symbolic { max_len: 60 })),
    FieldSpec::new(FieldRule::Tunnel).optional(),
    FieldSpec::new(FieldRule::Metric).ends_line(),
];

const ROUTE_TABLE_LAYOUTS: &[Layout] = &[Layout {
    name: "timos-route-table",
    marker: None,
    fields: ROUTE_TABLE_FIELDS,
    continuation: Some(6),
}];

const BGP_LABEL_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldRule::StatusCodes {
        alphabet: BGP_STATUS,
    }),
    FieldSpec::new(FieldRule::Prefix),
    FieldSpec::new(FieldRule::Preference),
    FieldSpec::new(FieldRule::Metric).ends_line(),
    FieldSpec::new(FieldRule::NextHop(NextHopStyle::Address)),
    FieldSpec::new(FieldRule::PathId),
    FieldSpec::new(FieldRule::Label).ends_line(),
    FieldSpec::new(FieldRule::AsPath {
        trailing_label: false,
    }),
];

const BGP_IGP_COST_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldRule::StatusCodes {
        alphabet: BGP_STATUS,
    }),
    FieldSpec::new(FieldRule::Prefix),
    FieldSpec::new(FieldRule::Preference),
    FieldSpec::new(FieldRule::Metric).ends_line(),
    FieldSpec::new(FieldRule::NextHop(NextHopStyle::Address)),
    FieldSpec::new(FieldRule::PathId),
    FieldSpec::new(FieldRule::IgpCost).ends_line(),
    FieldSpec::new(FieldRule::AsPath {
        trailing_label: true,
    }),
];

const BGP_LAYOUTS: &[Layout] = &[
    Layout {
        name: "timos-bgp-label",
        marker: None,
        fields: BGP_LABEL_FIELDS,
        continuation: None,
    },
    Layout {
        name: "timos-bgp-igp-cost",
        marker: Some("IGP Cost"),
        fields: BGP_IGP_COST_FIELDS,
        continuation: None,
    },
];

/// Grammar for `show router [ID] route-table`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimosRouteTable;

/// Grammar for `show router [ID] bgp routes [vpn-ipv4]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimosBgpRoutes;

/// Parse text using [`TimosRouteTable`].
pub fn parse_timos_route_table(input: &str) -> RouteTables {
    process(input, &TimosRouteTable)
}

/// Parse text using [`TimosBgpRoutes`].
pub fn parse_timos_bgp_routes(input: &str) -> RouteTables {
    process(input, &TimosBgpRoutes)
}

impl Grammar for TimosRouteTable {
    fn name(&self) -> &'static str {
        "timos-route-table"
    }

    fn match_header(&self, line: &str) -> Option<TableHeader> {
        // Captures without a command echo open with the title.
        if let Some(service) = route_table_title(line) {
            return Some(TableHeader::new(service).verified());
        }
        match command_tokens(line).as_slice() {
            ["show", "router", table] if is_route_table(table) => Some(TableHeader::new("Base")),
            ["show", "router", service, table] if is_route_table(table) => {
                Some(TableHeader::new(*service))
            }
            _ => None,
        }
    }

    fn match_title<'l>(&self, line: &'l str) -> Option<&'l str> {
        route_table_title(line)
    }

    fn requires_title(&self) -> bool {
        true
    }

    fn layouts(&self) -> &'static [Layout] {
        ROUTE_TABLE_LAYOUTS
    }
}

impl Grammar for TimosBgpRoutes {
    fn name(&self) -> &'static str {
        "timos-bgp-routes"
    }

    fn match_header(&self, line: &str) -> Option<TableHeader> {
        let tokens = command_tokens(line);
        let (service, rest) = match tokens.as_slice() {
            ["show", "router", "bgp", "routes", rest @ ..] => ("Base", rest),
            ["show", "router", service, "bgp", "routes", rest @ ..] => (*service, rest),
            _ => return None,
        };
        let protocol = match rest {
            [] => RouteProtocol::Bgp,
            [family] if family.eq_ignore_ascii_case("vpn-ipv4") => RouteProtocol::BgpVpn,
            _ => return None,
        };
        Some(TableHeader::new(service).with_protocol(protocol))
    }

    fn anchor(&self) -> RecordAnchor {
        RecordAnchor::StatusThenPrefix {
            alphabet: BGP_STATUS,
        }
    }

    fn layouts(&self) -> &'static [Layout] {
        BGP_LAYOUTS
    }
}

fn is_route_table(token: &str) -> bool {
    abbreviates(token, "route-table", "route-t".len())
}

/// `Route Table (Service: 99)` or `Route Table (Router: Base)`.
fn route_table_title(line: &str) -> Option<&str> {
    let inner = line
        .trim()
        .strip_prefix("Route Table (")?
        .strip_suffix(')')?;
    let service = inner
        .strip_prefix("Service:")
        .or_else(|| inner.strip_prefix("Router:"))?
        .trim();
    (!service.is_empty() && !service.contains(char::is_whitespace)).then_some(service)
}
