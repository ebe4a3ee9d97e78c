use std::net::IpAddr;

use tracing::{debug, info, warn};

use crate::cursor::Cursor;
use crate::grammar::{EMPTY_LAYOUT, FieldRule, FieldSpec, Grammar, Layout, NextHopStyle, in_alphabet};
use crate::token::{is_age, is_prefix, parse_number};
use crate::{NextHop, ParseFinding, ParseMetadata, RouteProtocol, RouteRecord, RouteTables};

/// Steps allowed without moving the cursor before the driver forces a line skip.
const MAX_IDLE_STEPS: usize = 64;

/// Per-table parse context carried through the record states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableContext {
    pub service: String,
    /// Index into [`Grammar::layouts`].
    pub layout: usize,
    /// Protocol implied by the table header, applied to every record.
    pub protocol: Option<RouteProtocol>,
    /// Records emitted so far for this table.
    pub records: usize,
    /// Last emitted record, the base of continuation lines.
    pub last: Option<RouteRecord>,
}

impl TableContext {
    pub fn new(service: impl Into<String>, protocol: Option<RouteProtocol>) -> Self {
        Self {
            service: service.into(),
            layout: 0,
            protocol,
            records: 0,
            last: None,
        }
    }
}

/// Parser state. One value per run, moved through [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    AwaitTableHeader,
    AwaitTableStart {
        table: TableContext,
        title_seen: bool,
    },
    RecordStart {
        table: TableContext,
    },
    Field {
        table: TableContext,
        index: usize,
        draft: RouteRecord,
    },
    RecordComplete {
        table: TableContext,
        record: RouteRecord,
    },
    /// Skipping input after a malformed record until the next anchor.
    Resync {
        table: TableContext,
    },
    Done,
}

/// Something a step contributes to the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutput {
    /// A table key was announced by a header.
    Table(String),
    Record { service: String, record: RouteRecord },
}

/// Result of one [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<'a> {
    pub state: ParserState,
    pub cursor: Cursor<'a>,
    pub output: Option<StepOutput>,
    pub finding: Option<ParseFinding>,
}

impl<'a> Step<'a> {
    fn to(state: ParserState, cursor: Cursor<'a>) -> Self {
        Self {
            state,
            cursor,
            output: None,
            finding: None,
        }
    }

    fn with_output(mut self, output: StepOutput) -> Self {
        self.output = Some(output);
        self
    }

    fn with_finding(mut self, finding: ParseFinding) -> Self {
        self.finding = Some(finding);
        self
    }
}

#[derive(Debug, thiserror::Error)]
enum FieldError {
    #[error("expected {expected}, found '{found}'")]
    Unexpected {
        expected: &'static str,
        found: String,
    },
    #[error("missing {0}")]
    Missing(&'static str),
}

/// Parse a text blob containing any number of command outputs.
///
/// Never fails: anomalies are returned as findings in the metadata.
pub fn process<G: Grammar + ?Sized>(input: &str, grammar: &G) -> RouteTables {
    run(input, grammar, ParserState::AwaitTableHeader, None)
}

/// Parse record lines without any command echo or table header.
///
/// Records land in [`Grammar::default_service`].
pub fn process_records<G: Grammar + ?Sized>(input: &str, grammar: &G) -> RouteTables {
    let service = grammar.default_service().to_string();
    let table = TableContext::new(service.clone(), None);
    run(input, grammar, ParserState::RecordStart { table }, Some(service))
}

fn run<G: Grammar + ?Sized>(
    input: &str,
    grammar: &G,
    initial: ParserState,
    preset_service: Option<String>,
) -> RouteTables {
    let mut out = RouteTables::new(ParseMetadata {
        grammar: grammar.name().to_string(),
        original_bytes: input.len(),
        line_count: input.lines().count(),
        parse_findings: Vec::new(),
    });
    if let Some(service) = preset_service {
        out.register(&service);
    }

    let mut state = initial;
    let mut cursor = Cursor::new(input);
    let mut idle_steps = 0usize;

    while !matches!(state, ParserState::Done) {
        let before = cursor.offset();
        let step = transition(grammar, state, cursor);

        match step.output {
            Some(StepOutput::Table(service)) => {
                if !out.register(&service) {
                    info!(service = %service, "service found at least a second time");
                }
            }
            Some(StepOutput::Record { service, record }) => out.push(&service, record),
            None => {}
        }
        if let Some(finding) = step.finding {
            out.metadata.parse_findings.push(finding);
        }

        state = step.state;
        cursor = step.cursor;

        // Forward-progress guard.
        idle_steps = if cursor.offset() == before {
            idle_steps + 1
        } else {
            0
        };
        if idle_steps > MAX_IDLE_STEPS {
            warn!(line = cursor.line(), "parser made no progress; skipping line");
            out.metadata.parse_findings.push(ParseFinding::new(
                "stalled-input",
                "parser made no progress on this line; line skipped",
                cursor.line_span(),
            ));
            cursor = cursor.next_line();
            state = ParserState::AwaitTableHeader;
            idle_steps = 0;
        }
    }

    info!(
        grammar = grammar.name(),
        tables = out.tables.len(),
        records = out.record_count(),
        findings = out.metadata.parse_findings.len(),
        "route output processed"
    );
    out
}

/// Advance the state machine by one step.
///
/// Pure: the result depends only on the grammar, the state, and the cursor.
pub fn transition<'a, G: Grammar + ?Sized>(
    grammar: &G,
    state: ParserState,
    cursor: Cursor<'a>,
) -> Step<'a> {
    match state {
        ParserState::AwaitTableHeader => await_table_header(grammar, cursor),
        ParserState::AwaitTableStart { table, title_seen } => {
            await_table_start(grammar, table, title_seen, cursor)
        }
        ParserState::RecordStart { table } => record_start(grammar, table, cursor),
        ParserState::Field {
            table,
            index,
            draft,
        } => field(grammar, table, index, draft, cursor),
        ParserState::RecordComplete { table, record } => {
            record_complete(grammar, table, record, cursor)
        }
        ParserState::Resync { table } => resync(grammar, table, cursor),
        ParserState::Done => Step::to(ParserState::Done, cursor),
    }
}

fn await_table_header<'a, G: Grammar + ?Sized>(grammar: &G, cursor: Cursor<'a>) -> Step<'a> {
    if cursor.is_eof() {
        return Step::to(ParserState::Done, cursor);
    }
    let Some(header) = grammar.match_header(cursor.current_line()) else {
        return Step::to(ParserState::AwaitTableHeader, cursor.next_line());
    };

    info!(
        grammar = grammar.name(),
        service = %header.service,
        line = cursor.line(),
        "route table header"
    );
    let table = TableContext::new(header.service.clone(), header.protocol);
    Step::to(
        ParserState::AwaitTableStart {
            table,
            title_seen: header.title_verified,
        },
        cursor.next_line(),
    )
    .with_output(StepOutput::Table(header.service))
}

fn await_table_start<'a, G: Grammar + ?Sized>(
    grammar: &G,
    mut table: TableContext,
    title_seen: bool,
    cursor: Cursor<'a>,
) -> Step<'a> {
    if cursor.is_eof() {
        warn!(service = %table.service, "input ended before the route table started");
        return Step::to(ParserState::Done, cursor).with_finding(ParseFinding::new(
            "missing-table-start",
            format!("input ended before the table of service '{}' started", table.service),
            cursor.line_span(),
        ));
    }
    let line = cursor.current_line();

    if grammar.is_error_line(line) {
        warn!(service = %table.service, "device rejected the command: {}", line.trim());
        return Step::to(ParserState::AwaitTableHeader, cursor.next_line()).with_finding(
            ParseFinding::new(
                "invalid-service",
                format!(
                    "device rejected the request for service '{}': {}",
                    table.service,
                    line.trim()
                ),
                cursor.line_span(),
            ),
        );
    }

    if let Some(seen) = grammar.match_title(line) {
        if !grammar.title_matches(&table.service, seen) {
            warn!(
                expected = %table.service,
                found = seen,
                "route table belongs to a different service; table skipped"
            );
            return Step::to(ParserState::AwaitTableHeader, cursor.next_line()).with_finding(
                ParseFinding::new(
                    "service-mismatch",
                    format!(
                        "expected the table of service '{}' but found '{}'",
                        table.service, seen
                    ),
                    cursor.line_span(),
                ),
            );
        }
        debug!(service = %table.service, "route table title check passed");
        return Step::to(
            ParserState::AwaitTableStart {
                table,
                title_seen: true,
            },
            cursor.next_line(),
        );
    }

    if grammar.match_header(line).is_some() {
        warn!(service = %table.service, "new command before the route table started");
        return Step::to(ParserState::AwaitTableHeader, cursor).with_finding(ParseFinding::new(
            "missing-table-start",
            format!("no table followed the header of service '{}'", table.service),
            cursor.line_span(),
        ));
    }

    if let Some(index) = grammar
        .layouts()
        .iter()
        .position(|layout| layout.marker.is_some_and(|marker| line.contains(marker)))
    {
        table.layout = index;
    }

    if !grammar.is_table_start(line) {
        return Step::to(ParserState::AwaitTableStart { table, title_seen }, cursor.next_line());
    }

    if grammar.requires_title() && !title_seen {
        warn!(service = %table.service, "route table started without a title");
        return Step::to(ParserState::AwaitTableHeader, cursor.next_line()).with_finding(
            ParseFinding::new(
                "missing-title",
                format!("table of service '{}' has no title line", table.service),
                cursor.line_span(),
            ),
        );
    }

    debug!(
        service = %table.service,
        layout = layout_of(grammar, &table).name,
        "route table start"
    );
    Step::to(ParserState::RecordStart { table }, cursor.next_line())
}

fn record_start<'a, G: Grammar + ?Sized>(
    grammar: &G,
    table: TableContext,
    cursor: Cursor<'a>,
) -> Step<'a> {
    if cursor.is_eof() {
        return Step::to(ParserState::Done, cursor);
    }
    let line = cursor.current_line();

    if line.trim().is_empty() {
        if grammar.blank_ends_table() && table.records > 0 {
            return Step::to(ParserState::AwaitTableHeader, cursor.next_line());
        }
        return Step::to(ParserState::RecordStart { table }, cursor.next_line());
    }

    if grammar.is_table_end(line) || (table.records == 0 && grammar.is_no_entries(line)) {
        if table.records == 0 {
            info!(service = %table.service, "route table has no entries");
        }
        return Step::to(ParserState::AwaitTableHeader, cursor.next_line());
    }

    if grammar.match_header(line).is_some() {
        return Step::to(ParserState::AwaitTableHeader, cursor);
    }

    if grammar.anchor().matches(line) {
        let mut draft = RouteRecord::draft();
        draft.route_protocol = table.protocol;
        return Step::to(
            ParserState::Field {
                table,
                index: 0,
                draft,
            },
            cursor,
        );
    }

    let layout = layout_of(grammar, &table);
    if let (Some(index), Some(previous)) = (layout.continuation, table.last.as_ref()) {
        let draft = continuation_draft(previous, &layout.fields[index.min(layout.fields.len())..]);
        debug!(prefix = %draft.prefix, line = cursor.line(), "continuation of previous record");
        return Step::to(
            ParserState::Field {
                table,
                index,
                draft,
            },
            cursor,
        );
    }

    warn!(service = %table.service, line = cursor.line(), "unrecognized line in route table");
    Step::to(ParserState::Resync { table }, cursor.next_line()).with_finding(ParseFinding::new(
        "unexpected-content",
        format!("line is neither a record nor a table boundary: '{}'", line.trim()),
        cursor.line_span(),
    ))
}

fn field<'a, G: Grammar + ?Sized>(
    grammar: &G,
    mut table: TableContext,
    index: usize,
    mut draft: RouteRecord,
    cursor: Cursor<'a>,
) -> Step<'a> {
    let layout = layout_of(grammar, &table);
    let Some(spec) = layout.fields.get(index).copied() else {
        return Step::to(ParserState::RecordComplete { table, record: draft }, cursor);
    };

    if index > 0 && cursor.at_line_start() && closes_record(grammar, cursor) {
        warn!(
            service = %table.service,
            prefix = %draft.prefix,
            "record ended before its {}",
            spec.rule.describe()
        );
        table.last = None;
        return Step::to(ParserState::Resync { table }, cursor).with_finding(ParseFinding::new(
            "truncated-record",
            format!(
                "record {} ended before its {}",
                draft.prefix,
                spec.rule.describe()
            ),
            cursor.line_span(),
        ));
    }

    let extracted = extract(grammar, spec, &mut draft, cursor).and_then(|next| {
        if !spec.ends_line {
            return Ok(next);
        }
        if next.at_line_end() {
            return Ok(next.next_line());
        }
        Err(FieldError::Unexpected {
            expected: "end of line",
            found: next.current_line().trim().to_string(),
        })
    });

    match extracted {
        Ok(next) => {
            let state = if index + 1 < layout.fields.len() {
                ParserState::Field {
                    table,
                    index: index + 1,
                    draft,
                }
            } else {
                ParserState::RecordComplete {
                    table,
                    record: draft,
                }
            };
            Step::to(state, next)
        }
        Err(err) => {
            warn!(
                service = %table.service,
                line = cursor.line(),
                "malformed record skipped: {err}"
            );
            let finding = ParseFinding::new(
                "malformed-record",
                format!("{} field of record '{}': {err}", spec.rule.describe(), draft.prefix),
                cursor.line_span(),
            );
            let resume = if index == 0 || !cursor.at_line_start() {
                cursor.next_line()
            } else {
                cursor
            };
            table.last = None;
            Step::to(ParserState::Resync { table }, resume).with_finding(finding)
        }
    }
}

fn record_complete<'a, G: Grammar + ?Sized>(
    grammar: &G,
    mut table: TableContext,
    mut record: RouteRecord,
    cursor: Cursor<'a>,
) -> Step<'a> {
    if record.prefix.is_empty() {
        return Step::to(ParserState::Resync { table }, cursor).with_finding(ParseFinding::new(
            "malformed-record",
            "record has no prefix",
            cursor.line_span(),
        ));
    }

    record.service = Some(table.service.clone());
    debug!(service = %table.service, prefix = %record.prefix, "route record");
    table.records += 1;
    table.last = Some(record.clone());

    let service = table.service.clone();
    next_after_record(grammar, table, cursor).with_output(StepOutput::Record { service, record })
}

/// Where to go once a record is complete.
fn next_after_record<'a, G: Grammar + ?Sized>(
    grammar: &G,
    table: TableContext,
    cursor: Cursor<'a>,
) -> Step<'a> {
    if cursor.is_eof() {
        return Step::to(ParserState::Done, cursor);
    }
    let line = cursor.current_line();

    if grammar.is_table_end(line) {
        return Step::to(ParserState::AwaitTableHeader, cursor.next_line());
    }
    if line.trim().is_empty() {
        if grammar.blank_ends_table() {
            return Step::to(ParserState::AwaitTableHeader, cursor.next_line());
        }
        return Step::to(ParserState::RecordStart { table }, cursor);
    }
    if grammar.match_header(line).is_some() {
        return Step::to(ParserState::AwaitTableHeader, cursor);
    }
    if grammar.anchor().matches(line) || layout_of(grammar, &table).continuation.is_some() {
        return Step::to(ParserState::RecordStart { table }, cursor);
    }

    warn!(service = %table.service, line = cursor.line(), "unexpected content after record");
    Step::to(ParserState::AwaitTableHeader, cursor.next_line()).with_finding(ParseFinding::new(
        "unexpected-content",
        format!("unexpected content after record: '{}'", line.trim()),
        cursor.line_span(),
    ))
}

fn resync<'a, G: Grammar + ?Sized>(
    grammar: &G,
    table: TableContext,
    cursor: Cursor<'a>,
) -> Step<'a> {
    if cursor.is_eof() {
        return Step::to(ParserState::Done, cursor);
    }
    let line = cursor.current_line();

    if grammar.is_table_end(line)
        || (line.trim().is_empty() && grammar.blank_ends_table() && table.records > 0)
    {
        return Step::to(ParserState::AwaitTableHeader, cursor.next_line());
    }
    if grammar.match_header(line).is_some() {
        return Step::to(ParserState::AwaitTableHeader, cursor);
    }
    if grammar.anchor().matches(line) {
        debug!(service = %table.service, line = cursor.line(), "resynchronized on record start");
        return Step::to(ParserState::RecordStart { table }, cursor);
    }
    Step::to(ParserState::Resync { table }, cursor.next_line())
}

fn layout_of<G: Grammar + ?Sized>(grammar: &G, table: &TableContext) -> &'static Layout {
    let layouts = grammar.layouts();
    layouts
        .get(table.layout)
        .or_else(|| layouts.first())
        .unwrap_or(&EMPTY_LAYOUT)
}

/// Line at `cursor` cannot continue the record being built.
fn closes_record<G: Grammar + ?Sized>(grammar: &G, cursor: Cursor<'_>) -> bool {
    let line = cursor.current_line();
    cursor.is_eof()
        || line.trim().is_empty()
        || grammar.is_table_end(line)
        || grammar.anchor().matches(line)
        || grammar.match_header(line).is_some()
}

/// Copy of `previous` with every field produced by `fields` cleared.
fn continuation_draft(previous: &RouteRecord, fields: &[FieldSpec]) -> RouteRecord {
    let mut draft = previous.clone();
    draft.service = None;
    for spec in fields {
        match spec.rule {
            FieldRule::Prefix => {}
            FieldRule::StatusCodes { .. }
            | FieldRule::BracketFlags { .. }
            | FieldRule::FlagWord { .. } => draft.flags = None,
            FieldRule::RouteType(_) => draft.route_type = None,
            FieldRule::Protocol(_) => draft.route_protocol = None,
            FieldRule::Age => draft.age = None,
            FieldRule::Preference => draft.preference = None,
            FieldRule::Metric => draft.metric = None,
            FieldRule::NextHop(_) => draft.next_hop = None,
            FieldRule::Tunnel => draft.interface_next_hop = None,
            FieldRule::Interface => draft.interface = None,
            FieldRule::PathId | FieldRule::Label | FieldRule::IgpCost | FieldRule::AsPath { .. } => {
                draft.bgp = None
            }
        }
    }
    draft
}

fn extract<'a, G: Grammar + ?Sized>(
    grammar: &G,
    spec: FieldSpec,
    draft: &mut RouteRecord,
    cursor: Cursor<'a>,
) -> Result<Cursor<'a>, FieldError> {
    match extract_rule(grammar, spec.rule, draft, cursor)? {
        Some(next) => Ok(next),
        None if spec.optional => Ok(cursor),
        None => Err(match cursor.peek_token() {
            Some((found, _)) => FieldError::Unexpected {
                expected: spec.rule.describe(),
                found: found.to_string(),
            },
            None => FieldError::Missing(spec.rule.describe()),
        }),
    }
}

/// `Ok(None)` means the field is not present at the cursor.
fn extract_rule<'a, G: Grammar + ?Sized>(
    grammar: &G,
    rule: FieldRule,
    draft: &mut RouteRecord,
    cursor: Cursor<'a>,
) -> Result<Option<Cursor<'a>>, FieldError> {
    let token = cursor.peek_token();
    let next = match rule {
        FieldRule::Prefix => token.filter(|(t, _)| is_prefix(t)).map(|(t, next)| {
            draft.prefix = t.to_string();
            next
        }),
        FieldRule::StatusCodes { alphabet } | FieldRule::FlagWord { alphabet } => token
            .filter(|(t, _)| in_alphabet(t, alphabet))
            .map(|(t, next)| {
                draft.flags = Some(t.to_string());
                next
            }),
        FieldRule::BracketFlags { alphabet } => {
            return bracket_flags(cursor, alphabet, draft);
        }
        FieldRule::RouteType(choices) => match_choice(cursor, choices).map(|(value, next)| {
            draft.route_type = Some(value);
            next
        }),
        FieldRule::Protocol(choices) => match_choice(cursor, choices).map(|(value, next)| {
            draft.route_protocol = Some(value);
            next
        }),
        FieldRule::Age => token.filter(|(t, _)| is_age(t)).map(|(t, next)| {
            draft.age = Some(t.to_string());
            next
        }),
        FieldRule::Preference => token.and_then(|(t, next)| {
            let value = parse_number(t)?;
            draft.preference = Some(value);
            Some(next)
        }),
        FieldRule::Metric => number_or_none(token).map(|(value, next)| {
            draft.metric = value;
            next
        }),
        FieldRule::PathId => number_or_none(token).map(|(value, next)| {
            draft.bgp_mut().path_id = value;
            next
        }),
        FieldRule::Label => number_or_none(token).map(|(value, next)| {
            draft.bgp_mut().label = value;
            next
        }),
        FieldRule::IgpCost => number_or_none(token).map(|(value, next)| {
            draft.bgp_mut().igp_cost = value;
            next
        }),
        FieldRule::NextHop(style) => next_hop(cursor, style).map(|(value, next)| {
            draft.next_hop = Some(value);
            next
        }),
        FieldRule::Tunnel => {
            return tunnel(cursor, draft);
        }
        FieldRule::Interface => token.map(|(t, next)| {
            draft.interface = Some(t.to_string());
            next
        }),
        FieldRule::AsPath { trailing_label } => {
            return as_path(grammar, trailing_label, draft, cursor);
        }
    };
    Ok(next)
}

fn number_or_none<'a>(token: Option<(&str, Cursor<'a>)>) -> Option<(Option<u32>, Cursor<'a>)> {
    let (text, next) = token?;
    if text.eq_ignore_ascii_case("none") {
        return Some((None, next));
    }
    parse_number(text).map(|value| (Some(value), next))
}

/// Longest spelling in `choices` that matches at the cursor as whole words.
fn match_choice<'a, T: Copy>(
    cursor: Cursor<'a>,
    choices: &[(&'static str, T)],
) -> Option<(T, Cursor<'a>)> {
    let start = cursor.skip_inline_whitespace();
    let line = start.current_line();
    choices
        .iter()
        .filter(|(spelling, _)| {
            line.starts_with(spelling)
                && line[spelling.len()..]
                    .chars()
                    .next()
                    .is_none_or(char::is_whitespace)
        })
        .max_by_key(|(spelling, _)| spelling.len())
        .map(|(spelling, value)| (*value, start.advance(spelling.len())))
}

fn bracket_flags<'a>(
    cursor: Cursor<'a>,
    alphabet: &str,
    draft: &mut RouteRecord,
) -> Result<Option<Cursor<'a>>, FieldError> {
    let start = cursor.skip_inline_whitespace();
    let line = start.current_line();
    if !line.starts_with('[') {
        return Ok(None);
    }
    let close = line.find(']').ok_or(FieldError::Missing("closing ']' of flags"))?;
    let inner = &line[1..close];
    if !in_alphabet(inner, alphabet) {
        return Err(FieldError::Unexpected {
            expected: "flags",
            found: inner.to_string(),
        });
    }
    draft.flags = Some(inner.to_string());
    Ok(Some(start.advance(close + 1)))
}

fn tunnel<'a>(
    cursor: Cursor<'a>,
    draft: &mut RouteRecord,
) -> Result<Option<Cursor<'a>>, FieldError> {
    let start = cursor.skip_inline_whitespace();
    let line = start.current_line();
    if !line.starts_with('(') {
        return Ok(None);
    }
    let close = line
        .find(')')
        .ok_or(FieldError::Missing("closing ')' of tunnel descriptor"))?;
    let inner = line[1..close].trim();
    if inner.is_empty() {
        return Err(FieldError::Missing("tunnel descriptor"));
    }
    draft.interface_next_hop = Some(inner.to_string());
    Ok(Some(start.advance(close + 1)))
}

/// Address token, or free text up to a tunnel descriptor or the trailing column.
fn next_hop<'a>(cursor: Cursor<'a>, style: NextHopStyle) -> Option<(NextHop, Cursor<'a>)> {
    let start = cursor.skip_inline_whitespace();
    let (token, after) = start.peek_token()?;
    if let Ok(address) = token.parse::<IpAddr>() {
        return Some((NextHop::Address(address), after));
    }
    let NextHopStyle::Symbolic { max_len } = style else {
        return None;
    };

    let line = start.current_line();
    let content = line.trim_end();
    let last_token_start = content
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(idx, c)| idx + c.len_utf8());
    let end = match (line.find('('), last_token_start) {
        (Some(paren), _) => paren,
        (None, Some(last)) => last,
        (None, None) => content.len(),
    };
    let name = line[..end].trim();
    if name.is_empty() || name.chars().count() > max_len {
        return None;
    }
    NextHop::parse(name).map(|value| (value, start.advance(end)))
}

fn as_path<'a, G: Grammar + ?Sized>(
    grammar: &G,
    trailing_label: bool,
    draft: &mut RouteRecord,
    cursor: Cursor<'a>,
) -> Result<Option<Cursor<'a>>, FieldError> {
    let mut cursor = cursor;
    if !cursor.at_line_start() && cursor.at_line_end() {
        cursor = cursor.next_line();
    }

    let first = cursor.current_line().trim();
    if first
        .get(..10)
        .is_some_and(|head| head.eq_ignore_ascii_case("no as-path"))
    {
        let mut rest = first[10..].split_whitespace();
        let label = match (trailing_label, rest.next()) {
            (true, Some(token)) => Some(parse_number(token).ok_or_else(|| {
                FieldError::Unexpected {
                    expected: "label",
                    found: token.to_string(),
                }
            })?),
            (false, Some(token)) => {
                return Err(FieldError::Unexpected {
                    expected: "end of line",
                    found: token.to_string(),
                });
            }
            (_, None) => None,
        };
        if let Some(extra) = rest.next() {
            return Err(FieldError::Unexpected {
                expected: "end of line",
                found: extra.to_string(),
            });
        }
        let bgp = draft.bgp_mut();
        bgp.as_path = Vec::new();
        if trailing_label {
            bgp.label = label;
        }
        return Ok(Some(cursor.next_line()));
    }

    let mut path = Vec::new();
    while !cursor.is_eof() {
        let line = cursor.current_line();
        if line.trim().is_empty()
            || grammar.is_table_end(line)
            || grammar.anchor().matches(line)
            || grammar.match_header(line).is_some()
        {
            break;
        }
        for token in line.split_whitespace() {
            let asn = parse_number(token).ok_or_else(|| FieldError::Unexpected {
                expected: "AS number",
                found: token.to_string(),
            })?;
            path.push(asn);
        }
        cursor = cursor.next_line();
    }

    if path.is_empty() {
        return Ok(None);
    }
    let label = if trailing_label { path.pop() } else { None };
    let bgp = draft.bgp_mut();
    bgp.as_path = path;
    if trailing_label {
        bgp.label = label;
    }
    Ok(Some(cursor))
}
