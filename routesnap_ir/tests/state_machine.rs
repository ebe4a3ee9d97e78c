use routesnap_ir::token::command_tokens;
use routesnap_ir::{
    Cursor, FieldRule, FieldSpec, Grammar, Layout, NextHop, NextHopStyle, ParserState,
    RouteProtocol, StepOutput, TableContext, TableHeader, process, process_records, transition,
};

/// Two-line records: `prefix proto pref` then `next-hop metric`.
struct LabGrammar;

const PROTOCOLS: &[(&str, RouteProtocol)] = &[
    ("ISIS", RouteProtocol::Isis),
    ("Static", RouteProtocol::Static),
    ("BGP", RouteProtocol::Bgp),
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldRule::Prefix),
    FieldSpec::new(FieldRule::Protocol(PROTOCOLS)),
    FieldSpec::new(FieldRule::Preference).ends_line(),
    FieldSpec::new(FieldRule::NextHop(NextHopStyle::Symbolic { max_len: 60 })),
    FieldSpec::new(FieldRule::Metric).ends_line(),
];

const LAYOUTS: &[Layout] = &[Layout {
    name: "lab",
    marker: None,
    fields: FIELDS,
    continuation: Some(3),
}];

impl Grammar for LabGrammar {
    fn name(&self) -> &'static str {
        "lab"
    }

    fn match_header(&self, line: &str) -> Option<TableHeader> {
        match command_tokens(line).as_slice() {
            ["show", "routes"] => Some(TableHeader::new("Base")),
            ["show", "routes", name] => Some(TableHeader::new(*name)),
            _ => None,
        }
    }

    fn match_title<'l>(&self, line: &'l str) -> Option<&'l str> {
        line.trim().strip_prefix("Table: ").map(str::trim)
    }

    fn requires_title(&self) -> bool {
        true
    }

    fn layouts(&self) -> &'static [Layout] {
        LAYOUTS
    }
}

fn table(name: &str, body: &str) -> String {
    format!("lab# show routes {name}\nTable: {name}\n--------\n{body}--------\n")
}

#[test]
fn sandwiched_malformed_record_yields_two_records() {
    let input = table(
        "blue",
        "10.0.0.0/24 ISIS 18\n  10.1.1.1  10\n\
         10.0.1.0/24 EIGRP 90\n  10.1.1.2  10\n\
         10.0.2.0/24 Static 5\n  10.1.1.3  20\n",
    );
    let tables = process(&input, &LabGrammar);
    let routes = tables.routes("blue").expect("blue table");
    let prefixes: Vec<&str> = routes.iter().map(|r| r.prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["10.0.0.0/24", "10.0.2.0/24"]);
    assert_eq!(
        tables
            .findings()
            .iter()
            .filter(|f| f.code == "malformed-record")
            .count(),
        1
    );
}

#[test]
fn continuation_lines_become_multipath_records() {
    let input = table(
        "Base",
        "10.0.0.0/24 ISIS 18\n  10.1.1.1  10\n  10.1.1.2  10\n",
    );
    let tables = process(&input.replace("show routes Base", "show routes"), &LabGrammar);
    let routes = tables.routes("Base").expect("base table");
    assert_eq!(routes.len(), 2);
    assert!(routes.iter().all(|r| r.prefix == "10.0.0.0/24"));
    assert!(routes.iter().all(|r| r.preference == Some(18)));
    assert_ne!(routes[0].next_hop, routes[1].next_hop);
}

#[test]
fn title_mismatch_keeps_key_but_emits_nothing() {
    let input = "lab# show routes red\nTable: blue\n--------\n10.0.0.0/24 ISIS 18\n  10.1.1.1 10\n--------\n";
    let tables = process(input, &LabGrammar);
    assert_eq!(tables.routes("red"), Some(&[][..]));
    assert_eq!(tables.routes("blue"), None);
    assert_eq!(tables.findings()[0].code, "service-mismatch");
}

#[test]
fn truncated_record_does_not_swallow_next_record() {
    let input = table(
        "blue",
        "10.0.0.0/24 ISIS 18\n10.0.1.0/24 ISIS 18\n  10.1.1.2  10\n",
    );
    let tables = process(&input, &LabGrammar);
    let routes = tables.routes("blue").expect("blue table");
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].prefix, "10.0.1.0/24");
    assert_eq!(tables.findings()[0].code, "truncated-record");
}

#[test]
fn empty_table_is_registered_without_records() {
    let input = "lab# show routes green\nTable: green\n--------\n--------\n";
    let tables = process(input, &LabGrammar);
    assert_eq!(tables.routes("green"), Some(&[][..]));
    assert!(tables.findings().is_empty());
}

#[test]
fn headerless_records_use_default_service() {
    let tables = process_records("10.9.0.0/16 Static 5\n  Black Hole  1\n", &LabGrammar);
    let routes = tables.routes("Base").expect("default table");
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].next_hop, Some(NextHop::BlackHole));
    assert_eq!(routes[0].metric, Some(1));
    assert_eq!(routes[0].service.as_deref(), Some("Base"));
}

#[test]
fn transition_is_a_pure_function_of_state_and_cursor() {
    let input = "10.0.0.0/24 ISIS 18\n  10.1.1.1 10\n";
    let start = ParserState::RecordStart {
        table: TableContext::new("Base", None),
    };
    let one = transition(&LabGrammar, start.clone(), Cursor::new(input));
    let two = transition(&LabGrammar, start, Cursor::new(input));
    assert_eq!(one, two);
    assert!(matches!(one.state, ParserState::Field { index: 0, .. }));
}

#[test]
fn driving_transitions_by_hand_emits_one_record() {
    let input = "10.0.0.0/24 ISIS 18\n  10.1.1.1 10\n";
    let mut state = ParserState::RecordStart {
        table: TableContext::new("Base", None),
    };
    let mut cursor = Cursor::new(input);
    let mut emitted = Vec::new();
    while !matches!(state, ParserState::Done) {
        let step = transition(&LabGrammar, state, cursor);
        if let Some(StepOutput::Record { record, .. }) = step.output {
            emitted.push(record);
        }
        state = step.state;
        cursor = step.cursor;
    }
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].metric, Some(10));
}

#[test]
fn garbage_input_terminates_without_records() {
    let input = "lab# show routes x\nTable: x\n--------\n???\n!!!\n\n\n--------\nshow routes\n";
    let tables = process(input, &LabGrammar);
    assert_eq!(tables.record_count(), 0);
    assert!(tables.routes("x").is_some());
    assert!(tables.routes("Base").is_some());
}
