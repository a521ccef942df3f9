//! Line-based edits of container resource requests
//!
//! Works on the manifest text so comments and formatting survive. Only
//! `cpu:` / `memory:` lines inside a `requests:` block of the container
//! (or object) named after the resource are touched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{FixOperation, OperationKind};

static RE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(-\s+)?name:\s*["']?([^"'\s#]+)["']?\s*(?:#.*)?$"#).expect("valid regex")
});

static RE_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(\s*)(cpu|memory):\s*["']?([0-9]+(?:\.[0-9]+)?)([A-Za-z]*)["']?(\s*(?:#.*)?)$"#,
    )
    .expect("valid regex")
});

/// Result of editing one manifest's text
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Modified(String),
    Unchanged,
}

/// Request key (`cpu` / `memory`) addressed by a fix field
pub fn request_key(field: &str) -> Option<&'static str> {
    match field {
        "resources.requests.cpu" => Some("cpu"),
        "resources.requests.memory" => Some("memory"),
        _ => None,
    }
}

/// Render a set-to value in manifest units: milli-cores, or decimal `G`
/// since memory values are in GB
pub fn format_set_to(key: &str, value: f64) -> String {
    match key {
        "cpu" => format!("{:.0}m", value),
        _ => {
            let text = format!("{:.3}", value);
            format!("{}G", text.trim_end_matches('0').trim_end_matches('.'))
        }
    }
}

/// Scale a quantity string like `500m`, `1.5` or `512Mi`, keeping its suffix
pub fn scale_quantity(number: &str, suffix: &str, percent: f64) -> Option<String> {
    let value: f64 = number.parse().ok()?;
    let scaled = value * (1.0 + percent / 100.0);
    if !scaled.is_finite() || scaled <= 0.0 {
        return None;
    }
    Some(format!("{}{}", format_number(scaled), suffix))
}

fn format_number(value: f64) -> String {
    if value >= 10.0 {
        return format!("{:.0}", value);
    }
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Rewrite the request addressed by `op` for `resource`.
///
/// A missing request is created for `set_to`; a percentage needs an
/// existing value to scale and fails otherwise.
pub fn patch_manifest(content: &str, resource: &str, op: &FixOperation) -> Result<Patch, String> {
    let key = request_key(&op.field)
        .ok_or_else(|| format!("unsupported field '{}'", op.field))?;
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();

    let mut scope: Option<usize> = None;
    let mut container: Option<(usize, usize)> = None;
    let mut resources_block: Option<(usize, usize)> = None;
    let mut requests_block: Option<(usize, usize)> = None;
    let mut resources_line: Option<(usize, usize)> = None;
    let mut requests_line: Option<(usize, usize)> = None;
    let mut matched = false;
    let mut changed = false;

    for i in 0..lines.len() {
        let line = &lines[i];
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indent_of(line);

        if let Some(caps) = RE_NAME.captures(line) {
            if &caps[2] == resource {
                scope = Some(indent);
                resources_block = None;
                requests_block = None;
                if caps.get(1).is_some() && container.is_none() {
                    // keys of a list item sit after "- "
                    container = Some((i, indent + 2));
                }
                continue;
            }
        }

        let Some(scope_indent) = scope else {
            continue;
        };
        if indent <= scope_indent {
            scope = None;
            continue;
        }
        if requests_block.is_some_and(|(_, r)| indent <= r) {
            requests_block = None;
        }
        if resources_block.is_some_and(|(_, r)| indent <= r) {
            resources_block = None;
        }

        if trimmed.starts_with("resources:") {
            resources_block = Some((i, indent));
            resources_line.get_or_insert((i, indent));
            continue;
        }
        if trimmed.starts_with("requests:") && resources_block.is_some() {
            requests_block = Some((i, indent));
            requests_line.get_or_insert((i, indent));
            continue;
        }
        if requests_block.is_none() {
            continue;
        }

        let Some(caps) = RE_QUANTITY.captures(line) else {
            continue;
        };
        if &caps[2] != key {
            continue;
        }
        matched = true;

        let value = match op.operation {
            OperationKind::SetTo => format_set_to(key, op.value),
            OperationKind::ScaleByPercentage => scale_quantity(&caps[3], &caps[4], op.value)
                .ok_or_else(|| {
                    format!("cannot scale {} '{}{}' by {}%", key, &caps[3], &caps[4], op.value)
                })?,
        };
        let rewritten = format!("{}{}: \"{}\"{}", &caps[1], key, value, &caps[5]);
        if rewritten != lines[i] {
            lines[i] = rewritten;
            changed = true;
        }
    }

    if matched {
        return Ok(if changed {
            Patch::Modified(lines.join("\n"))
        } else {
            Patch::Unchanged
        });
    }

    let value = match op.operation {
        OperationKind::SetTo => format_set_to(key, op.value),
        OperationKind::ScaleByPercentage => {
            return Err(format!(
                "no existing {} request for '{}' to scale",
                key, resource
            ))
        }
    };

    let (at, insert) = if let Some((i, indent)) = requests_line {
        (i + 1, vec![format!("{}{}: \"{}\"", " ".repeat(indent + 2), key, value)])
    } else if let Some((i, indent)) = resources_line {
        (
            i + 1,
            vec![
                format!("{}requests:", " ".repeat(indent + 2)),
                format!("{}{}: \"{}\"", " ".repeat(indent + 4), key, value),
            ],
        )
    } else if let Some((i, indent)) = container {
        (
            i + 1,
            vec![
                format!("{}resources:", " ".repeat(indent)),
                format!("{}requests:", " ".repeat(indent + 2)),
                format!("{}{}: \"{}\"", " ".repeat(indent + 4), key, value),
            ],
        )
    } else {
        return Err(format!("no container named '{}' found", resource));
    };

    lines.splice(at..at, insert);
    Ok(Patch::Modified(lines.join("\n")))
}
