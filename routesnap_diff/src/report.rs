use routesnap_ir::RouteRecord;

use crate::model::{ChangeRecord, ComparisonResult};

const BANNER_WIDTH: usize = 80;

/// Header row of [`format_csv_report`].
pub const CSV_HEADER: &str = "status,hostname,service,route,route_protocol,next_hop,metric";

/// Format the plain-text change report for one hostname/service pair.
pub fn format_text_report(result: &ComparisonResult, left_label: &str, right_label: &str) -> String {
    let mut out = String::new();
    let banner = "#".repeat(BANNER_WIDTH);
    out.push_str(&banner);
    out.push('\n');
    if let Some((hostname, service)) = subject(result) {
        out.push_str(&format!("HOSTNAME: {hostname}\n"));
        out.push_str(&format!("SERVICE: {service}\n"));
    }
    out.push_str(&format!("FROM: {left_label}\n"));
    out.push_str(&format!("TO: {right_label}\n"));
    out.push_str(&banner);
    out.push_str("\n\n");

    if result.is_empty() {
        out.push_str("No changes detected.\n");
        return out;
    }

    if !result.added.is_empty() {
        out.push_str("Added routes:\n");
        for record in &result.added {
            out.push_str(&format!("+ {}\n", record.prefix));
        }
        out.push('\n');
    }

    if !result.deleted.is_empty() {
        out.push_str("Deleted routes:\n");
        for record in &result.deleted {
            out.push_str(&format!("- {}\n", record.prefix));
        }
        out.push('\n');
    }

    if !result.changed.is_empty() {
        out.push_str("Modified routes:\n");
        for change in &result.changed {
            describe_change(&mut out, change);
        }
        out.push('\n');
    }

    let stats = result.stats();
    out.push_str(&format!(
        "Summary: {} added, {} deleted, {} modified\n",
        stats.added, stats.deleted, stats.changed
    ));
    out
}

/// Format the comparison as CSV rows, one per added, deleted or changed path.
pub fn format_csv_report(result: &ComparisonResult) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');
    out.push_str(&format_csv_rows(result));
    out.push('\n');
    out
}

/// The rows of [`format_csv_report`] without header or trailing blank line,
/// for joining several comparisons under one header.
pub fn format_csv_rows(result: &ComparisonResult) -> String {
    let mut out = String::new();
    for record in &result.added {
        out.push_str(&csv_record_row("+added", record));
    }
    for record in &result.deleted {
        out.push_str(&csv_record_row("-deleted", record));
    }
    for change in &result.changed {
        out.push_str(&format!(
            "~modified,{},{},{},{} -> {},{} -> {},{} -> {}\n",
            change.hostname.as_deref().unwrap_or(""),
            change.service.as_deref().unwrap_or(""),
            change.route,
            show(change.route_protocol_before),
            show(change.route_protocol_after),
            show(change.next_hop_before.as_ref()),
            show(change.next_hop_after.as_ref()),
            show(change.metric_before),
            show(change.metric_after),
        ));
    }
    out
}

fn subject(result: &ComparisonResult) -> Option<(&str, &str)> {
    let from_records = result
        .added
        .iter()
        .chain(&result.deleted)
        .find_map(|r| Some((r.hostname.as_deref()?, r.service.as_deref()?)));
    from_records.or_else(|| {
        result
            .changed
            .iter()
            .find_map(|c| Some((c.hostname.as_deref()?, c.service.as_deref()?)))
    })
}

fn describe_change(out: &mut String, change: &ChangeRecord) {
    out.push_str(&format!("~ {}\n", change.route));
    if change.path_removed {
        out.push_str(&format!(
            "  Path removed: {}\n",
            show(change.next_hop_before.as_ref())
        ));
        return;
    }
    if change.next_hop_changed() {
        out.push_str(&format!(
            "  Next hop: {} -> {}\n",
            show(change.next_hop_before.as_ref()),
            show(change.next_hop_after.as_ref())
        ));
    }
    if change.metric_changed() {
        out.push_str(&format!(
            "  Metric: {} -> {}\n",
            show(change.metric_before),
            show(change.metric_after)
        ));
    }
    if change.protocol_changed() {
        out.push_str(&format!(
            "  Protocol: {} -> {}\n",
            show(change.route_protocol_before),
            show(change.route_protocol_after)
        ));
    }
}

fn csv_record_row(status: &str, record: &RouteRecord) -> String {
    format!(
        "{status},{},{},{},{},{},{}\n",
        record.hostname.as_deref().unwrap_or(""),
        record.service.as_deref().unwrap_or(""),
        record.prefix,
        show(record.route_protocol),
        show(record.next_hop.as_ref()),
        show(record.metric),
    )
}

fn show<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
