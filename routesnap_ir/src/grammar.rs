use crate::token::{is_prefix, is_divider};
use crate::{RouteProtocol, RouteType};

/// What a command echo (or a title standing in for one) says about the table that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub service: String,
    /// Protocol implied by the command itself (`bgp routes vpn-ipv4`).
    pub protocol: Option<RouteProtocol>,
    /// Set when the header line already was the table title.
    pub title_verified: bool,
}

impl TableHeader {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            protocol: None,
            title_verified: false,
        }
    }

    pub fn with_protocol(mut self, protocol: RouteProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn verified(mut self) -> Self {
        self.title_verified = true;
        self
    }
}

/// How the first line of a record is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAnchor {
    /// First token is a route prefix.
    Prefix,
    /// A status-code token drawn from `alphabet`, then a route prefix.
    StatusThenPrefix { alphabet: &'static str },
}

impl RecordAnchor {
    pub fn matches(&self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        match self {
            Self::Prefix => tokens.next().is_some_and(is_prefix),
            Self::StatusThenPrefix { alphabet } => {
                tokens.next().is_some_and(|status| in_alphabet(status, alphabet))
                    && tokens.next().is_some_and(is_prefix)
            }
        }
    }
}

pub(crate) fn in_alphabet(token: &str, alphabet: &str) -> bool {
    !token.is_empty() && token.chars().all(|ch| alphabet.contains(ch))
}

/// Interpretation of a next-hop column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextHopStyle {
    /// Only an IP address is accepted.
    Address,
    /// An IP address, or free text up to `max_len` characters naming an
    /// interface, VRF, or `Black Hole`.
    Symbolic { max_len: usize },
}

/// Extraction and acceptance rule of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Prefix,
    /// BGP status codes (`u*>i`), stored as flags.
    StatusCodes { alphabet: &'static str },
    /// `[BL]`-style flags directly after the prefix.
    BracketFlags { alphabet: &'static str },
    /// Bare flag word (`RD`).
    FlagWord { alphabet: &'static str },
    RouteType(&'static [(&'static str, RouteType)]),
    Protocol(&'static [(&'static str, RouteProtocol)]),
    Age,
    Preference,
    /// Integer, or the literal `None`.
    Metric,
    NextHop(NextHopStyle),
    /// Parenthesized tunnel descriptor such as `(tunneled:SR-ISIS:530001)`.
    Tunnel,
    Interface,
    PathId,
    Label,
    IgpCost,
    /// Integers wrapping across lines until an anchor; `No As-Path` allowed.
    AsPath { trailing_label: bool },
}

impl FieldRule {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Prefix => "route prefix",
            Self::StatusCodes { .. } => "status codes",
            Self::BracketFlags { .. } | Self::FlagWord { .. } => "flags",
            Self::RouteType(_) => "route type",
            Self::Protocol(_) => "protocol",
            Self::Age => "age",
            Self::Preference => "preference",
            Self::Metric => "metric",
            Self::NextHop(_) => "next hop",
            Self::Tunnel => "tunnel descriptor",
            Self::Interface => "interface",
            Self::PathId => "path id",
            Self::Label => "label",
            Self::IgpCost => "IGP cost",
            Self::AsPath { .. } => "AS path",
        }
    }
}

/// One field of a record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub rule: FieldRule,
    pub optional: bool,
    /// Nothing but whitespace may follow on the line; the next field starts on the next line.
    pub ends_line: bool,
}

impl FieldSpec {
    pub const fn new(rule: FieldRule) -> Self {
        Self {
            rule,
            optional: false,
            ends_line: false,
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }

    pub const fn ends_line(self) -> Self {
        Self {
            ends_line: true,
            ..self
        }
    }
}

/// Ordered field list for one column arrangement of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub name: &'static str,
    /// Column-header text selecting this layout; `None` for the default layout.
    pub marker: Option<&'static str>,
    pub fields: &'static [FieldSpec],
    /// Field index where a continuation line (another path of the same prefix) starts.
    pub continuation: Option<usize>,
}

pub(crate) static EMPTY_LAYOUT: Layout = Layout {
    name: "empty",
    marker: None,
    fields: &[],
    continuation: None,
};

/// Vendor/command grammar consumed by the generic engine.
///
/// Recognizers receive one line without its line ending.
pub trait Grammar {
    /// Stable grammar name stored in parse metadata.
    fn name(&self) -> &'static str;

    /// Recognize a command echo that opens a table.
    fn match_header(&self, line: &str) -> Option<TableHeader>;

    /// Service named by a table title line, when `line` is one.
    fn match_title<'l>(&self, _line: &'l str) -> Option<&'l str> {
        None
    }

    /// Whether a title must be seen before the table start divider.
    fn requires_title(&self) -> bool {
        false
    }

    fn title_matches(&self, expected: &str, seen: &str) -> bool {
        expected == seen
    }

    /// Device error echo such as `MINOR: CLI Invalid router "11".`
    fn is_error_line(&self, line: &str) -> bool {
        let lowered = line.trim_start().to_ascii_lowercase();
        ["minor:", "major:", "critical:", "error:"]
            .iter()
            .any(|marker| lowered.starts_with(marker))
    }

    /// Explicit marker of a table without entries.
    fn is_no_entries(&self, line: &str) -> bool {
        line.to_ascii_lowercase().contains("no matching entries")
    }

    fn is_table_start(&self, line: &str) -> bool {
        is_divider(line, '-')
    }

    fn is_table_end(&self, line: &str) -> bool {
        is_divider(line, '-')
    }

    /// A blank line after at least one record closes the table.
    fn blank_ends_table(&self) -> bool {
        false
    }

    fn anchor(&self) -> RecordAnchor {
        RecordAnchor::Prefix
    }

    fn layouts(&self) -> &'static [Layout];

    /// Table key used for headerless fragments.
    fn default_service(&self) -> &str {
        "Base"
    }
}
