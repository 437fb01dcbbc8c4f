use std::time::Duration;

use crate::consistency::{Consistency, SerialConsistency};
use crate::errors::CassError;
use crate::types::Value;

/// Per-request options carried from the query builder to the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub consistency: Consistency,
    pub serial_consistency: Option<SerialConsistency>,
    /// Client-side write timestamp in microseconds.
    pub timestamp: Option<i64>,
    pub request_timeout: Option<Duration>,
    pub idempotent: bool,
}

/// A statement ready for transmission: text, bound values and options.
///
/// Dropping the statement releases it; nothing outlives the execution it
/// was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    markers: BindMarkers,
    values: Vec<Value>,
    options: QueryOptions,
}

impl Statement {
    /// Create an unbound statement. The expected parameter count is taken
    /// from the `?` and `:name` bind markers found in `text`.
    pub fn new(text: impl Into<String>, options: QueryOptions) -> Self {
        let text = text.into();
        let markers = scan_bind_markers(&text);
        Self {
            text,
            markers,
            values: Vec::new(),
            options,
        }
    }

    /// Bind values in marker order. Fails without touching the driver when
    /// the number of values differs from the number of bind markers, or when
    /// the text mixes `?` and `:name` markers.
    pub fn bind(&mut self, values: Vec<Value>) -> Result<(), CassError> {
        if self.markers.is_mixed() {
            return Err(CassError::MixedBindMarkers);
        }
        if values.len() != self.param_count() {
            return Err(CassError::Bind {
                expected: self.param_count(),
                supplied: values.len(),
            });
        }
        self.values = values;
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn param_count(&self) -> usize {
        self.markers.total()
    }

    pub fn markers(&self) -> BindMarkers {
        self.markers
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn consistency(&self) -> Consistency {
        self.options.consistency
    }
}

/// Bind markers found in a statement, by style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindMarkers {
    pub positional: usize,
    pub named: usize,
}

impl BindMarkers {
    pub fn total(&self) -> usize {
        self.positional + self.named
    }

    pub fn is_mixed(&self) -> bool {
        self.positional > 0 && self.named > 0
    }
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
    DollarQuoted,
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    matches!(
        (bytes.get(idx), bytes.get(idx + 1)),
        (Some(b'-'), Some(b'-')) | (Some(b'/'), Some(b'/'))
    )
}

fn pair_at(bytes: &[u8], idx: usize, first: u8, second: u8) -> bool {
    bytes.get(idx) == Some(&first) && bytes.get(idx + 1) == Some(&second)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// A `:name` marker starts at a colon that does not follow an identifier
/// character or another colon, and is directly followed by an identifier.
/// Map and UDT literals (`{'k': 1}`) put a space or a quote after the colon.
fn named_marker_at(bytes: &[u8], idx: usize) -> Option<usize> {
    if bytes[idx] != b':' {
        return None;
    }
    if idx > 0 && (is_ident_char(bytes[idx - 1]) || bytes[idx - 1] == b':') {
        return None;
    }
    match bytes.get(idx + 1) {
        Some(&b) if is_ident_start(b) => {}
        _ => return None,
    }
    let mut end = idx + 1;
    while end < bytes.len() && is_ident_char(bytes[end]) {
        end += 1;
    }
    Some(end)
}

/// Count all bind markers, positional and named.
pub fn count_bind_markers(text: &str) -> usize {
    scan_bind_markers(text).total()
}

/// Find positional `?` and named `:name` bind markers, skipping string
/// literals, quoted identifiers, `$$` strings and comments.
pub fn scan_bind_markers(text: &str) -> BindMarkers {
    let bytes = text.as_bytes();
    let mut state = State::Normal;
    let mut markers = BindMarkers::default();
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'?' => markers.positional += 1,
                b':' => {
                    if let Some(end) = named_marker_at(bytes, idx) {
                        markers.named += 1;
                        idx = end;
                        continue;
                    }
                }
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if pair_at(bytes, idx, b'/', b'*') => {
                    state = State::BlockComment;
                    idx += 1;
                }
                _ if pair_at(bytes, idx, b'$', b'$') => {
                    state = State::DollarQuoted;
                    idx += 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    // '' is an escaped quote inside a literal
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if pair_at(bytes, idx, b'*', b'/') {
                    state = State::Normal;
                    idx += 1;
                }
            }
            State::DollarQuoted => {
                if pair_at(bytes, idx, b'$', b'$') {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_plain_markers() {
        assert_eq!(count_bind_markers("SELECT a FROM t"), 0);
        assert_eq!(count_bind_markers("SELECT a FROM t WHERE id = ?"), 1);
        assert_eq!(
            count_bind_markers("INSERT INTO ks.t (a, b, c) VALUES (?, ?, ?)"),
            3
        );
    }

    #[test]
    fn test_markers_inside_literals_are_ignored() {
        assert_eq!(count_bind_markers("SELECT * FROM t WHERE s = '?' AND id = ?"), 1);
        assert_eq!(count_bind_markers("SELECT * FROM t WHERE s = 'it''s ?'"), 0);
        assert_eq!(count_bind_markers("SELECT \"what?\" FROM t"), 0);
        assert_eq!(count_bind_markers("SELECT $$ ? $$ FROM t WHERE a = ?"), 1);
    }

    #[test]
    fn test_markers_inside_comments_are_ignored() {
        assert_eq!(count_bind_markers("SELECT a FROM t -- id = ?\nWHERE b = ?"), 1);
        assert_eq!(count_bind_markers("SELECT a FROM t // ?"), 0);
        assert_eq!(count_bind_markers("SELECT a /* ? ? */ FROM t WHERE b = ?"), 1);
    }

    #[test]
    fn test_count_named_markers() {
        assert_eq!(
            scan_bind_markers("SELECT a FROM t WHERE id = :id"),
            BindMarkers { positional: 0, named: 1 }
        );
        assert_eq!(
            scan_bind_markers("UPDATE t SET a = :a, b = :b_2 WHERE id = :id"),
            BindMarkers { positional: 0, named: 3 }
        );
        assert_eq!(count_bind_markers("SELECT a FROM t WHERE s = ':id' AND k = :k"), 1);
        assert_eq!(count_bind_markers("SELECT a FROM t /* :id */ WHERE k = :k"), 1);
        assert_eq!(count_bind_markers("INSERT INTO t (id, m) VALUES (?, {'a': 1, 'b':2})"), 1);
        assert_eq!(count_bind_markers("SELECT a FROM t WHERE id = :1"), 0);
    }

    #[test]
    fn test_bind_named_marker() {
        let mut stmt = Statement::new("SELECT a FROM t WHERE id = :id", QueryOptions::default());
        assert_eq!(stmt.param_count(), 1);

        stmt.bind(vec![Value::Int(5)]).unwrap();
        assert_eq!(stmt.values(), &[Value::Int(5)]);
    }

    #[test]
    fn test_mixed_markers_rejected() {
        let mut stmt = Statement::new(
            "SELECT a FROM t WHERE id = ? AND b = :b",
            QueryOptions::default(),
        );
        assert!(stmt.markers().is_mixed());

        let err = stmt.bind(vec![Value::Int(1), Value::Int(2)]).unwrap_err();
        assert_eq!(err, CassError::MixedBindMarkers);
        assert!(stmt.values().is_empty());
    }

    #[test]
    fn test_bind_arity() {
        let mut stmt = Statement::new("SELECT a FROM t WHERE id = ?", QueryOptions::default());
        assert_eq!(stmt.param_count(), 1);

        let err = stmt.bind(Vec::new()).unwrap_err();
        assert_eq!(err, CassError::Bind { expected: 1, supplied: 0 });
        assert!(stmt.values().is_empty());

        stmt.bind(vec![Value::Int(7)]).unwrap();
        assert_eq!(stmt.values(), &[Value::Int(7)]);
    }

    #[test]
    fn test_options_carried() {
        let options = QueryOptions {
            consistency: Consistency::QUORUM,
            ..Default::default()
        };
        let stmt = Statement::new("SELECT a FROM t", options);
        assert_eq!(stmt.consistency(), Consistency::QUORUM);
        assert_eq!(stmt.text(), "SELECT a FROM t");
    }
}
