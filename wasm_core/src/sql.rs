//! Range jump: turns pasted INSERT statements into UPDATEs that shift numeric
//! columns by a fixed offset.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ToolkitError, ToolkitResult};

static INSERT_HEADER: OnceLock<Regex> = OnceLock::new();

fn insert_header() -> &'static Regex {
    INSERT_HEADER.get_or_init(|| {
        Regex::new(r"(?is)\bINSERT\s+INTO\s+([^\s(]+)\s*\(([^)]*)\)\s*VALUES\s*")
            .expect("static INSERT pattern")
    })
}

fn parse_err(msg: impl Into<String>) -> ToolkitError {
    ToolkitError::Parse(msg.into())
}

/// One row of an INSERT, with identifiers and literals kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRow {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

/// Strips backticks, double quotes or brackets around an identifier.
pub fn bare_identifier(ident: &str) -> &str {
    let trimmed = ident.trim();
    for (open, close) in [('`', '`'), ('"', '"'), ('[', ']')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    trimmed
}

/// Reads one parenthesised value tuple starting at `pos` (leading whitespace allowed).
/// Returns the trimmed values and the byte offset just past the closing parenthesis.
fn read_tuple(sql: &str, pos: usize) -> ToolkitResult<(Vec<String>, usize)> {
    let bytes = sql.as_bytes();
    let mut idx = pos;
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    if bytes.get(idx) != Some(&b'(') {
        return Err(parse_err("expected '(' after VALUES"));
    }
    idx += 1;
    let mut values = Vec::new();
    let mut current_start = idx;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    while idx < bytes.len() {
        let byte = bytes[idx];
        match quote {
            Some(q) if byte == q => {
                // A doubled quote is an escaped quote inside the literal.
                if bytes.get(idx + 1) == Some(&q) {
                    idx += 1;
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None => match byte {
                b'\'' | b'"' => quote = Some(byte),
                b'(' => depth += 1,
                b')' if depth > 0 => depth -= 1,
                b')' => {
                    values.push(sql[current_start..idx].trim().to_string());
                    return Ok((values, idx + 1));
                }
                b',' if depth == 0 => {
                    values.push(sql[current_start..idx].trim().to_string());
                    current_start = idx + 1;
                }
                _ => {}
            },
        }
        idx += 1;
    }
    Err(parse_err("unterminated VALUES tuple"))
}

/// Parses every INSERT statement in `sql`, expanding multi-row VALUES lists.
pub fn parse_inserts(sql: &str) -> ToolkitResult<Vec<InsertRow>> {
    let mut rows = Vec::new();
    let mut search_from = 0;
    while let Some(caps) = insert_header().captures_at(sql, search_from) {
        let whole = caps.get(0).ok_or_else(|| parse_err("malformed INSERT"))?;
        let table = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let columns: Vec<String> = caps
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split(',')
            .map(|col| col.trim().to_string())
            .filter(|col| !col.is_empty())
            .collect();
        if columns.is_empty() {
            return Err(parse_err(format!("INSERT into {table} lists no columns")));
        }
        let mut pos = whole.end();
        loop {
            let (values, end) = read_tuple(sql, pos)?;
            if values.len() != columns.len() {
                return Err(parse_err(format!(
                    "INSERT into {table} has {} columns but a row with {} values",
                    columns.len(),
                    values.len()
                )));
            }
            rows.push(InsertRow {
                table: table.clone(),
                columns: columns.clone(),
                values,
            });
            let rest = &sql[end..];
            let trimmed = rest.trim_start();
            if let Some(after_comma) = trimmed.strip_prefix(',') {
                pos = sql.len() - after_comma.len();
            } else {
                pos = end;
                break;
            }
        }
        search_from = pos;
    }
    if rows.is_empty() {
        return Err(parse_err("no INSERT INTO ... VALUES statement found"));
    }
    Ok(rows)
}

/// An integer literal, optionally single-quoted; the quote is kept on output.
fn shift_integer(literal: &str, offset: i64) -> Option<ToolkitResult<String>> {
    let (inner, quoted) = match literal
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) => (inner, true),
        None => (literal, false),
    };
    let digits = inner.strip_prefix(&['-', '+'][..]).unwrap_or(inner);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let shifted = inner
        .parse::<i64>()
        .ok()
        .and_then(|value| value.checked_add(offset))
        .ok_or_else(|| parse_err(format!("{literal} + {offset} is out of range")));
    Some(shifted.map(|value| {
        if quoted {
            format!("'{value}'")
        } else {
            value.to_string()
        }
    }))
}

fn find_column(row: &InsertRow, name: &str) -> Option<usize> {
    let wanted = bare_identifier(name);
    row.columns
        .iter()
        .position(|col| bare_identifier(col).eq_ignore_ascii_case(wanted))
}

/// Rewrites each INSERT row into an UPDATE keyed on `key_column`.
///
/// With an empty `columns` list every integer column other than the key is shifted.
pub fn rewrite_range_jump(
    sql: &str,
    key_column: &str,
    columns: &[String],
    offset: i64,
) -> ToolkitResult<Vec<String>> {
    if bare_identifier(key_column).is_empty() {
        return Err(parse_err("a key column is required"));
    }
    let rows = parse_inserts(sql)?;
    let mut statements = Vec::with_capacity(rows.len());
    for row in &rows {
        let key_idx = find_column(row, key_column).ok_or_else(|| {
            parse_err(format!("key column {key_column} not found in {}", row.table))
        })?;
        let targets: Vec<usize> = if columns.is_empty() {
            (0..row.columns.len())
                .filter(|&idx| idx != key_idx && shift_integer(&row.values[idx], 0).is_some())
                .collect()
        } else {
            columns
                .iter()
                .map(|name| {
                    find_column(row, name).ok_or_else(|| {
                        parse_err(format!("column {name} not found in {}", row.table))
                    })
                })
                .collect::<ToolkitResult<_>>()?
        };
        if targets.is_empty() {
            return Err(parse_err(format!(
                "row keyed {} has no numeric columns to shift",
                row.values[key_idx]
            )));
        }
        let mut assignments = Vec::with_capacity(targets.len());
        for idx in targets {
            let value = &row.values[idx];
            let shifted = shift_integer(value, offset).ok_or_else(|| {
                parse_err(format!(
                    "column {} holds {value}, not an integer",
                    row.columns[idx]
                ))
            })??;
            assignments.push(format!("{} = {}", row.columns[idx], shifted));
        }
        statements.push(format!(
            "UPDATE {} SET {} WHERE {} = {};",
            row.table,
            assignments.join(", "),
            row.columns[key_idx],
            row.values[key_idx]
        ));
    }
    log::debug!("rewrote {} INSERT rows into UPDATEs", statements.len());
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "INSERT INTO tracking_ranges (id, carrier, range_start, range_end) \
                          VALUES (7, 'UPS, Inc (ground)', 1000, 1999);\n\
                          insert into tracking_ranges (id, carrier, range_start, range_end) \
                          values (8, 'O''Neil', '2000', 2999), (9, 'DHL', 3000, 3999);";

    #[test]
    fn parses_quoted_and_multi_row_inserts() {
        let rows = parse_inserts(SAMPLE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].values[1], "'UPS, Inc (ground)'");
        assert_eq!(rows[1].values[1], "'O''Neil'");
        assert_eq!(rows[2].values, vec!["9", "'DHL'", "3000", "3999"]);
        assert_eq!(rows[2].table, "tracking_ranges");
    }

    #[test]
    fn shifts_all_numeric_columns_by_default() {
        let updates = rewrite_range_jump(SAMPLE, "id", &[], 500).unwrap();
        assert_eq!(
            updates,
            vec![
                "UPDATE tracking_ranges SET range_start = 1500, range_end = 2499 WHERE id = 7;",
                "UPDATE tracking_ranges SET range_start = '2500', range_end = 3499 WHERE id = 8;",
                "UPDATE tracking_ranges SET range_start = 3500, range_end = 4499 WHERE id = 9;",
            ]
        );
    }

    #[test]
    fn shifts_only_requested_columns() {
        let sql = "INSERT INTO `r` (`id`, `lo`, `hi`) VALUES (1, 10, 20);";
        let updates = rewrite_range_jump(sql, "ID", &["hi".to_string()], -5).unwrap();
        assert_eq!(updates, vec!["UPDATE `r` SET `hi` = 15 WHERE `id` = 1;"]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            rewrite_range_jump("SELECT 1;", "id", &[], 1),
            Err(ToolkitError::Parse(_))
        ));
        let short_row = "INSERT INTO t (a, b) VALUES (1);";
        assert!(rewrite_range_jump(short_row, "a", &[], 1).is_err());
        let unterminated = "INSERT INTO t (a, b) VALUES (1, 2";
        assert!(rewrite_range_jump(unterminated, "a", &[], 1).is_err());
    }

    #[test]
    fn rejects_non_integer_targets_and_missing_key() {
        let sql = "INSERT INTO t (id, name) VALUES (1, 'x');";
        let err = rewrite_range_jump(sql, "id", &["name".to_string()], 1).unwrap_err();
        assert!(err.to_string().contains("not an integer"));
        assert!(rewrite_range_jump(sql, "missing", &[], 1).is_err());
        assert!(rewrite_range_jump(sql, "id", &[], 1).is_err());
    }

    #[test]
    fn reports_overflow() {
        let sql = format!("INSERT INTO t (id, n) VALUES (1, {});", i64::MAX);
        let err = rewrite_range_jump(&sql, "id", &[], 1).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
