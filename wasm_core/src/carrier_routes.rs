//! Canned INSERT statements for carrier route configuration.
//!
//! Routes are pasted one per line as `origin, destination[, service level]`.
//! Blank lines and `#` comments are skipped. Codes are upper-cased and limited
//! to letters, digits, `-` and `_`, so they are emitted as plain SQL literals.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::{ToolkitError, ToolkitResult};

pub const DEFAULT_ROUTE_TABLE: &str = "carrier_routes";
pub const DEFAULT_SERVICE_LEVEL: &str = "STANDARD";

const ROUTE_COLUMNS: [&str; 6] = [
    "carrier_code",
    "origin",
    "destination",
    "service_level",
    "priority",
    "active",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_service_level")]
    pub default_service_level: String,
    #[serde(default = "default_first_priority")]
    pub first_priority: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_table() -> String {
    DEFAULT_ROUTE_TABLE.to_string()
}

fn default_service_level() -> String {
    DEFAULT_SERVICE_LEVEL.to_string()
}

fn default_first_priority() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            table: default_table(),
            default_service_level: default_service_level(),
            first_priority: default_first_priority(),
            active: default_active(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLine {
    pub origin: String,
    pub destination: String,
    /// `None` means the configured default service level.
    pub service_level: Option<String>,
}

fn route_err(msg: impl Into<String>) -> ToolkitError {
    ToolkitError::InvalidRoute(msg.into())
}

fn is_code(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

fn code(value: &str, what: &str) -> ToolkitResult<String> {
    let upper = value.trim().to_ascii_uppercase();
    if is_code(&upper) {
        Ok(upper)
    } else {
        Err(route_err(format!("{what} '{}' is not a valid code", value.trim())))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Quotes `schema.table` as `` `schema`.`table` ``.
fn quoted_table(table: &str) -> ToolkitResult<String> {
    let segments: Vec<&str> = table.trim().split('.').collect();
    if !segments.iter().all(|segment| is_identifier(segment)) {
        return Err(route_err(format!("'{}' is not a valid table name", table.trim())));
    }
    Ok(segments
        .iter()
        .map(|segment| format!("`{segment}`"))
        .collect::<Vec<_>>()
        .join("."))
}

pub fn parse_route_lines(text: &str) -> ToolkitResult<Vec<RouteLine>> {
    let mut routes = Vec::new();
    let mut seen = BTreeSet::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|ch: char| ch == ',' || ch == ';' || ch == '\t')
            .map(str::trim)
            .collect();
        if !(2..=3).contains(&fields.len()) {
            return Err(route_err(format!(
                "line {line_no}: expected origin, destination and an optional service level"
            )));
        }
        let at_line = |err: ToolkitError| route_err(format!("line {line_no}: {}", err.reason()));
        let origin = code(fields[0], "origin").map_err(at_line)?;
        let destination = code(fields[1], "destination").map_err(at_line)?;
        let service_level = match fields.get(2) {
            Some(level) if !level.is_empty() => {
                Some(code(level, "service level").map_err(at_line)?)
            }
            _ => None,
        };
        let key = (origin.clone(), destination.clone(), service_level.clone());
        if !seen.insert(key) {
            return Err(route_err(format!(
                "line {line_no} repeats route {origin} to {destination}"
            )));
        }
        routes.push(RouteLine {
            origin,
            destination,
            service_level,
        });
    }
    if routes.is_empty() {
        return Err(route_err("no routes given"));
    }
    Ok(routes)
}

/// One INSERT per route; priorities count up from `first_priority` in input order.
pub fn carrier_route_inserts(
    carrier: &str,
    routes: &str,
    options: &RouteOptions,
) -> ToolkitResult<Vec<String>> {
    let carrier = code(carrier, "carrier")?;
    let table = quoted_table(&options.table)?;
    let default_level = code(&options.default_service_level, "default service level")?;
    let lines = parse_route_lines(routes)?;
    let columns = ROUTE_COLUMNS
        .iter()
        .map(|col| format!("`{col}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let active = u8::from(options.active);
    let mut statements = Vec::with_capacity(lines.len());
    for (idx, route) in lines.iter().enumerate() {
        let priority = u32::try_from(idx)
            .ok()
            .and_then(|offset| options.first_priority.checked_add(offset))
            .ok_or_else(|| route_err("route priority exceeds the supported range"))?;
        let level = route.service_level.as_deref().unwrap_or(&default_level);
        statements.push(format!(
            "INSERT INTO {table} ({columns}) VALUES ('{carrier}', '{}', '{}', '{level}', {priority}, {active});",
            route.origin, route.destination
        ));
    }
    log::debug!("generated {} route INSERTs for {carrier}", statements.len());
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &str =
        "(`carrier_code`, `origin`, `destination`, `service_level`, `priority`, `active`)";

    #[test]
    fn builds_one_insert_per_route() {
        let routes = "# hub lanes\nord, lax\n\nORD;JFK;express\n";
        let inserts = carrier_route_inserts(" ups ", routes, &RouteOptions::default()).unwrap();
        assert_eq!(
            inserts,
            vec![
                format!(
                    "INSERT INTO `carrier_routes` {COLUMNS} VALUES ('UPS', 'ORD', 'LAX', 'STANDARD', 1, 1);"
                ),
                format!(
                    "INSERT INTO `carrier_routes` {COLUMNS} VALUES ('UPS', 'ORD', 'JFK', 'EXPRESS', 2, 1);"
                ),
            ]
        );
    }

    #[test]
    fn options_change_table_priority_and_flags() {
        let options = RouteOptions {
            table: "ops.routes".into(),
            default_service_level: "ground".into(),
            first_priority: 10,
            active: false,
        };
        let inserts = carrier_route_inserts("DHL", "MEM\tATL", &options).unwrap();
        assert_eq!(
            inserts,
            vec![format!(
                "INSERT INTO `ops`.`routes` {COLUMNS} VALUES ('DHL', 'MEM', 'ATL', 'GROUND', 10, 0);"
            )]
        );
    }

    #[test]
    fn options_fill_missing_fields_from_defaults() {
        let options: RouteOptions = serde_json::from_str(r#"{"firstPriority":5}"#).unwrap();
        assert_eq!(options.table, DEFAULT_ROUTE_TABLE);
        assert_eq!(options.first_priority, 5);
        assert!(options.active);
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = parse_route_lines("ORD, LAX\nORD").unwrap_err();
        assert!(err.reason().starts_with("line 2:"), "{err}");
        let err = parse_route_lines("ORD, L'AX").unwrap_err();
        assert!(err.reason().contains("destination 'L'AX'"), "{err}");
        assert!(parse_route_lines("a, b, c, d").is_err());
        assert_eq!(
            parse_route_lines("# only comments\n\n").unwrap_err(),
            ToolkitError::InvalidRoute("no routes given".into())
        );
    }

    #[test]
    fn rejects_duplicate_routes() {
        let err = parse_route_lines("ord, lax\nORD, LAX, \n").unwrap_err();
        assert!(err.reason().contains("line 2 repeats route ORD to LAX"), "{err}");
        assert_eq!(parse_route_lines("ORD, LAX\nORD, LAX, AIR").unwrap().len(), 2);
    }

    #[test]
    fn rejects_bad_carrier_and_table() {
        let routes = "ORD, LAX";
        assert!(carrier_route_inserts("", routes, &RouteOptions::default()).is_err());
        let options = RouteOptions {
            table: "routes; DROP TABLE x".into(),
            ..RouteOptions::default()
        };
        let err = carrier_route_inserts("UPS", routes, &options).unwrap_err();
        assert!(err.reason().contains("not a valid table name"), "{err}");
    }

    #[test]
    fn priority_overflow_is_reported() {
        let options = RouteOptions {
            first_priority: u32::MAX,
            ..RouteOptions::default()
        };
        let err = carrier_route_inserts("UPS", "ORD, LAX\nORD, JFK", &options).unwrap_err();
        assert!(err.reason().contains("priority"), "{err}");
    }
}
