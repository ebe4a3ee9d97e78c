//! Huawei VRP grammar for `routesnap_ir`.
//!
//! Understands `display ip routing-table [vpn-instance NAME]`, including
//! abbreviated commands (`dis ip rou`) and equal-cost continuation lines.
//! The `Public` table is stored under the `Base` key.
//!
//! # Example
//!
//! ```rust
//! use routesnap_dialect_vrp::parse_vrp;
//!
//! let output = "\
//! <HUAWEI>display ip routing-table
//! Routing Tables: Public
//! Destination/Mask    Proto   Pre  Cost      Flags NextHop         Interface
//!
//!     10.1.1.0/24     Direct  0    0           D   10.1.1.1        GigabitEthernet1/0/0
//!
//! ";
//! let tables = parse_vrp(output);
//! assert_eq!(tables.routes("Base").map(<[_]>::len), Some(1));
//! ```

use routesnap_ir::token::{abbreviates, command_tokens};
use routesnap_ir::{
    FieldRule, FieldSpec, Grammar, Layout, NextHopStyle, RouteProtocol, RouteTables, TableHeader,
    process,
};

const PROTOCOLS: &[(&str, RouteProtocol)] = &[
    ("Direct", RouteProtocol::Direct),
    ("Static", RouteProtocol::Static),
    ("OSPF", RouteProtocol::Ospf),
    ("O_ASE", RouteProtocol::OspfAse),
    ("O_NSSA", RouteProtocol::OspfNssa),
    ("ISIS", RouteProtocol::Isis),
    ("ISIS-L1", RouteProtocol::IsisL1),
    ("ISIS-L2", RouteProtocol::IsisL2),
    ("BGP", RouteProtocol::Bgp),
    ("IBGP", RouteProtocol::Ibgp),
    ("EBGP", RouteProtocol::Ebgp),
    ("RIP", RouteProtocol::Rip),
    ("UNR", RouteProtocol::Unr),
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldRule::Prefix),
    FieldSpec::new(FieldRule::Protocol(PROTOCOLS)),
    FieldSpec::new(FieldRule::Preference),
    FieldSpec::new(FieldRule::Metric),
    FieldSpec::new(FieldRule::FlagWord { alphabet: "RD" }).optional(),
    FieldSpec::new(FieldRule::NextHop(NextHopStyle::Address)),
    FieldSpec::new(FieldRule::Interface).ends_line(),
];

const LAYOUTS: &[Layout] = &[Layout {
    name: "vrp-routing-table",
    marker: None,
    fields: FIELDS,
    continuation: Some(1),
}];

/// Grammar for `display ip routing-table`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VrpRoutingTable;

/// Parse text using [`VrpRoutingTable`].
pub fn parse_vrp(input: &str) -> RouteTables {
    process(input, &VrpRoutingTable)
}

impl Grammar for VrpRoutingTable {
    fn name(&self) -> &'static str {
        "vrp-routing-table"
    }

    fn match_header(&self, line: &str) -> Option<TableHeader> {
        let tokens = command_tokens(line);
        let [display, ip, table, rest @ ..] = tokens.as_slice() else {
            return None;
        };
        if !(abbreviates(display, "display", 2)
            && ip.eq_ignore_ascii_case("ip")
            && abbreviates(table, "routing-table", 2))
        {
            return None;
        }
        match rest {
            [] => Some(TableHeader::new("Base")),
            [keyword, name] if abbreviates(keyword, "vpn-instance", 1) => {
                Some(TableHeader::new(*name))
            }
            _ => None,
        }
    }

    fn match_title<'l>(&self, line: &'l str) -> Option<&'l str> {
        let name = line.trim().strip_prefix("Routing Tables:")?.trim();
        (!name.is_empty()).then_some(name)
    }

    fn requires_title(&self) -> bool {
        true
    }

    fn title_matches(&self, expected: &str, seen: &str) -> bool {
        expected == seen || (expected == self.default_service() && seen.eq_ignore_ascii_case("public"))
    }

    fn is_table_start(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.starts_with("Destination") && trimmed.ends_with("Interface")
    }

    /// A bare prompt closes the table; the blank line before it usually already has.
    fn is_table_end(&self, line: &str) -> bool {
        let trimmed = line.trim();
        (trimmed.starts_with('<') && trimmed.ends_with('>'))
            || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    }

    fn blank_ends_table(&self) -> bool {
        true
    }

    fn layouts(&self) -> &'static [Layout] {
        LAYOUTS
    }
}
