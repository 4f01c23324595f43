//! @ai:module:intent Parse `@sloth slos` directive groups into SLO declarations
//! @ai:module:layer domain
//! @ai:module:public_api eval_slos, parse_slo_group
//! @ai:module:depends_on lexer, tree, specification
//! @ai:module:stateless true

use super::lexer::{classify, DirectiveGroup, DirectiveKind};
use super::tree::{self, Entry, Node};
use super::DirectiveError;
use crate::specification::{
    AlertRule, Alerting, Labels, Sli, SloDeclaration, DEFAULT_WINDOW, WINDOW_LABEL,
};
use regex::Regex;
use std::sync::LazyLock;

static WINDOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+(?:ms|s|m|h|d|w|y))+$").expect("Invalid regex"));

/// @ai:intent Run the SLO grammar over one comment block, one result per SLO group
/// @ai:post empty when the block holds no SLO group
/// @ai:post a failing group drops only its own entries
/// @ai:effects pure
pub fn eval_slos(block: &str) -> Vec<Result<Vec<SloDeclaration>, DirectiveError>> {
    classify(block)
        .groups(DirectiveKind::Slo)
        .map(parse_slo_group)
        .collect()
}

/// @ai:intent Parse every entry of one SLO group
/// @ai:pre group.kind is Slo
/// @ai:post entries keep their written order
/// @ai:invariant a single invalid entry fails the whole group
/// @ai:effects pure
pub fn parse_slo_group(group: &DirectiveGroup<'_>) -> Result<Vec<SloDeclaration>, DirectiveError> {
    let marker_line = group.span.start;
    if let Some(argument) = group.argument {
        return Err(DirectiveError::malformed(
            marker_line,
            format!("unexpected text `{argument}` after SLO marker"),
        ));
    }

    let body = tree::parse(&group.body)?;
    match &body {
        Node::Empty => Err(DirectiveError::malformed(
            marker_line,
            "SLO directive has no entries",
        )),
        Node::Map(entries) => {
            let line = entries.first().map_or(marker_line, |e| e.line);
            Ok(vec![parse_entry(line, entries)?])
        }
        Node::List(items) => items
            .iter()
            .map(|item| match &item.value {
                Node::Map(entries) => parse_entry(item.line, entries),
                other => Err(DirectiveError::malformed(
                    item.line,
                    format!("SLO entry must be a `key: value` record, found a {}", other.kind_name()),
                )),
            })
            .collect(),
        Node::Scalar(_) => Err(DirectiveError::malformed(marker_line, "unexpected scalar")),
    }
}

/// @ai:intent Build one SLO from the fields of a list item
/// @ai:effects pure
fn parse_entry(line: usize, entries: &[Entry]) -> Result<SloDeclaration, DirectiveError> {
    let mut name = None;
    let mut objective = None;
    let mut description = None;
    let mut sli = None;
    let mut window = None;
    let mut labels = Labels::new();
    let mut alerting = None;

    for entry in entries {
        match entry.key.as_str() {
            "name" => name = entry.scalar()?.map(str::to_string),
            "objective" => {
                objective = entry
                    .scalar()?
                    .map(|raw| parse_objective(entry.line, raw))
                    .transpose()?;
            }
            "description" => description = entry.scalar()?.map(str::to_string),
            "sli" => sli = parse_sli(entry)?,
            "window" => {
                window = entry
                    .scalar()?
                    .map(|raw| parse_window(entry.line, raw))
                    .transpose()?;
            }
            "labels" => {
                labels = entry.value.to_string_map(entry.line, "labels")?;
                if labels.contains_key(WINDOW_LABEL) {
                    return Err(DirectiveError::malformed(
                        entry.line,
                        format!("label `{WINDOW_LABEL}` is reserved, use the `window` field"),
                    ));
                }
            }
            "alerting" => alerting = Some(parse_alerting(entry)?),
            other => tracing::debug!(key = other, "Ignoring unknown SLO field"),
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DirectiveError::missing(line, "name"))?;
    let objective = objective.ok_or_else(|| DirectiveError::missing(line, "objective"))?;

    Ok(SloDeclaration {
        name,
        objective,
        description,
        sli,
        window: window.unwrap_or_else(|| DEFAULT_WINDOW.to_string()),
        labels,
        alerting,
    })
}

/// @ai:intent Parse an objective percentage
/// @ai:post 0 < result <= 100
/// @ai:example (0, "99.9") -> Ok(99.9)
/// @ai:example (0, "99.5%") -> Ok(99.5)
/// @ai:example (0, "0") -> Err(OutOfRangeValue)
/// @ai:effects pure
pub fn parse_objective(line: usize, raw: &str) -> Result<f64, DirectiveError> {
    let number = raw.trim().trim_end_matches('%').trim_end();
    let value: f64 = number.parse().map_err(|_| {
        DirectiveError::malformed(line, format!("objective `{raw}` is not a number"))
    })?;

    if value > 0.0 && value <= 100.0 {
        Ok(value)
    } else {
        Err(DirectiveError::OutOfRangeValue {
            line,
            field: "objective".to_string(),
            value: raw.to_string(),
            detail: "objective must satisfy 0 < objective <= 100".to_string(),
        })
    }
}

fn parse_window(line: usize, raw: &str) -> Result<String, DirectiveError> {
    if WINDOW.is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(DirectiveError::malformed(
            line,
            format!("window `{raw}` is not a duration such as 30d or 1h30m"),
        ))
    }
}

/// @ai:intent Parse the indicator in scalar, flat or sloth-nested form
/// @ai:example ("sli: ratio_query") -> Raw
/// @ai:example ("sli:\n  error_query: e\n  total_query: t") -> Events
/// @ai:example ("sli:\n  plugin:\n    id: sloth-common/availability") -> Plugin
/// @ai:effects pure
fn parse_sli(entry: &Entry) -> Result<Option<Sli>, DirectiveError> {
    let entries = match &entry.value {
        Node::Empty => return Ok(None),
        Node::Scalar(query) => {
            return Ok(Some(Sli::Raw {
                error_ratio_query: query.clone(),
            }))
        }
        Node::Map(entries) => entries.as_slice(),
        Node::List(_) => {
            return Err(DirectiveError::malformed(
                entry.line,
                "`sli` must be a query or a map, found a list",
            ))
        }
    };

    if let Some(nested) = find(entries, "raw") {
        return raw_sli(nested.line, nested.value.entries(nested.line, "raw")?).map(Some);
    }
    if let Some(nested) = find(entries, "events") {
        return events_sli(nested.line, nested.value.entries(nested.line, "events")?).map(Some);
    }
    if let Some(nested) = find(entries, "plugin") {
        return plugin_sli(nested.line, nested.value.entries(nested.line, "plugin")?).map(Some);
    }

    if find(entries, "error_ratio_query").is_some() {
        raw_sli(entry.line, entries).map(Some)
    } else if find(entries, "error_query").is_some() || find(entries, "total_query").is_some() {
        events_sli(entry.line, entries).map(Some)
    } else {
        Err(DirectiveError::malformed(
            entry.line,
            "`sli` needs error_ratio_query, error_query/total_query or a plugin",
        ))
    }
}

fn raw_sli(line: usize, entries: &[Entry]) -> Result<Sli, DirectiveError> {
    Ok(Sli::Raw {
        error_ratio_query: required(line, entries, "error_ratio_query")?,
    })
}

fn events_sli(line: usize, entries: &[Entry]) -> Result<Sli, DirectiveError> {
    Ok(Sli::Events {
        error_query: required(line, entries, "error_query")?,
        total_query: required(line, entries, "total_query")?,
    })
}

fn plugin_sli(line: usize, entries: &[Entry]) -> Result<Sli, DirectiveError> {
    let options = match find(entries, "options") {
        Some(options) => options.value.to_string_map(options.line, "options")?,
        None => Labels::new(),
    };
    Ok(Sli::Plugin {
        id: required(line, entries, "id")?,
        options,
    })
}

fn parse_alerting(entry: &Entry) -> Result<Alerting, DirectiveError> {
    let mut alerting = Alerting::default();

    for field in entry.value.entries(entry.line, "alerting")? {
        match field.key.as_str() {
            "name" => alerting.name = field.scalar()?.map(str::to_string),
            "labels" => alerting.labels = field.value.to_string_map(field.line, "labels")?,
            "annotations" => {
                alerting.annotations = field.value.to_string_map(field.line, "annotations")?
            }
            "page_alert" => alerting.page_alert = Some(parse_alert_rule(field)?),
            "ticket_alert" => alerting.ticket_alert = Some(parse_alert_rule(field)?),
            other => tracing::debug!(key = other, "Ignoring unknown alerting field"),
        }
    }

    Ok(alerting)
}

fn parse_alert_rule(entry: &Entry) -> Result<AlertRule, DirectiveError> {
    let mut rule = AlertRule::default();

    for field in entry.value.entries(entry.line, &entry.key)? {
        match field.key.as_str() {
            "disable" => {
                rule.disable = match field.scalar()? {
                    Some("true") => true,
                    Some("false") | None => false,
                    Some(other) => {
                        return Err(DirectiveError::malformed(
                            field.line,
                            format!("`disable` must be true or false, found `{other}`"),
                        ))
                    }
                }
            }
            "labels" => rule.labels = field.value.to_string_map(field.line, "labels")?,
            "annotations" => {
                rule.annotations = field.value.to_string_map(field.line, "annotations")?
            }
            other => tracing::debug!(key = other, "Ignoring unknown alert field"),
        }
    }

    Ok(rule)
}

fn find<'n>(entries: &'n [Entry], key: &str) -> Option<&'n Entry> {
    entries.iter().find(|e| e.key == key)
}

fn required(line: usize, entries: &[Entry], key: &str) -> Result<String, DirectiveError> {
    match find(entries, key) {
        Some(entry) => entry
            .scalar()?
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| DirectiveError::missing(entry.line, key)),
        None => Err(DirectiveError::missing(line, key)),
    }
}
