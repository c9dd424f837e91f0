//! Row ceiling enforcement for read statements.
//!
//! Matching is lexical: a statement is a read if it starts with `SELECT`
//! followed by whitespace, and only a `LIMIT <digits>` clause at the very
//! end of the text is recognized. Ceilings inside subqueries or `UNION`
//! branches are not seen.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::{LimitAction, LimitedStatement, StatementKind};

static LEADING_SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^SELECT\s").expect("valid regex"));

static TRAILING_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\s*;?\s*$").expect("valid regex"));

/// Classifies a trimmed statement.
pub fn classify_statement(sql: &str) -> StatementKind {
    if LEADING_SELECT.is_match(sql.trim()) {
        StatementKind::Read
    } else {
        StatementKind::Other
    }
}

/// Bounds a statement to at most `row_limit` rows.
///
/// - Non-read statements are returned trimmed and otherwise untouched.
/// - A read without a trailing `LIMIT` gets ` LIMIT <row_limit>` appended;
///   a trailing `;` is dropped first and not re-added.
/// - A trailing `LIMIT` above `row_limit` has its value replaced in place,
///   so any `;` after it is kept.
/// - A trailing `LIMIT` at or below `row_limit` is left alone.
pub fn enforce_limit(sql: &str, row_limit: usize) -> LimitedStatement {
    let trimmed = sql.trim();

    if classify_statement(trimmed) == StatementKind::Other {
        debug!("Statement is not a SELECT; submitting unchanged");
        return LimitedStatement {
            sql: trimmed.to_string(),
            kind: StatementKind::Other,
            action: LimitAction::Unchanged,
        };
    }

    let Some(digits) = TRAILING_LIMIT.captures(trimmed).and_then(|c| c.get(1)) else {
        let base = trimmed.trim_end_matches(';').trim_end();
        info!("No LIMIT clause found; enforcing LIMIT {}", row_limit);
        return LimitedStatement {
            sql: format!("{base} LIMIT {row_limit}"),
            kind: StatementKind::Read,
            action: LimitAction::Appended,
        };
    };

    // A literal too large for u64 is certainly above the ceiling.
    let existing = digits.as_str().parse::<u64>().ok();
    let within = existing.is_some_and(|v| v <= row_limit as u64);

    if within {
        debug!("Existing LIMIT {} is within the row limit", digits.as_str());
        return LimitedStatement {
            sql: trimmed.to_string(),
            kind: StatementKind::Read,
            action: LimitAction::Unchanged,
        };
    }

    warn!(
        "LIMIT {} exceeds the row limit; reducing to LIMIT {}",
        digits.as_str(),
        row_limit
    );
    let mut limited = String::with_capacity(trimmed.len());
    limited.push_str(&trimmed[..digits.start()]);
    limited.push_str(&row_limit.to_string());
    limited.push_str(&trimmed[digits.end()..]);

    LimitedStatement {
        sql: limited,
        kind: StatementKind::Read,
        action: LimitAction::Reduced {
            original: digits.as_str().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn limited(sql: &str, row_limit: usize) -> String {
        enforce_limit(sql, row_limit).sql
    }

    #[test]
    fn test_select_gets_limit_appended() {
        let result = enforce_limit("SELECT * FROM t", 100);
        assert_eq!(result.sql, "SELECT * FROM t LIMIT 100");
        assert_eq!(result.kind, StatementKind::Read);
        assert_eq!(result.action, LimitAction::Appended);
    }

    #[test]
    fn test_append_drops_terminator() {
        assert_eq!(limited("SELECT * FROM t;", 100), "SELECT * FROM t LIMIT 100");
        assert_eq!(limited("SELECT * FROM t ;  ", 100), "SELECT * FROM t LIMIT 100");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(
            limited("  \n SELECT id FROM users \n", 10),
            "SELECT id FROM users LIMIT 10"
        );
    }

    #[test]
    fn test_lowercase_select_is_read() {
        assert_eq!(limited("select a from b", 5), "select a from b LIMIT 5");
        assert_eq!(limited("SeLeCt\ta from b", 5), "SeLeCt\ta from b LIMIT 5");
    }

    #[test]
    fn test_larger_limit_is_reduced_in_place() {
        let result = enforce_limit("SELECT * FROM t LIMIT 5000;", 1000);
        assert_eq!(result.sql, "SELECT * FROM t LIMIT 1000;");
        assert_eq!(
            result.action,
            LimitAction::Reduced {
                original: "5000".to_string()
            }
        );
    }

    #[test]
    fn test_reduce_preserves_keyword_case_and_spacing() {
        assert_eq!(
            limited("select * from t limit   500", 20),
            "select * from t limit   20"
        );
    }

    #[test]
    fn test_smaller_limit_is_unchanged() {
        let result = enforce_limit("SELECT * FROM t LIMIT 10", 1000);
        assert_eq!(result.sql, "SELECT * FROM t LIMIT 10");
        assert_eq!(result.action, LimitAction::Unchanged);
    }

    #[test]
    fn test_equal_limit_is_unchanged() {
        let result = enforce_limit("SELECT * FROM t LIMIT 1000;", 1000);
        assert_eq!(result.sql, "SELECT * FROM t LIMIT 1000;");
        assert_eq!(result.action, LimitAction::Unchanged);
    }

    #[test]
    fn test_huge_limit_literal_is_reduced() {
        assert_eq!(
            limited("SELECT 1 LIMIT 99999999999999999999999", 10),
            "SELECT 1 LIMIT 10"
        );
    }

    #[test]
    fn test_non_select_is_unchanged() {
        for sql in [
            "CREATE TABLE x AS SELECT * FROM y",
            "DROP TABLE x",
            "INSERT INTO x SELECT * FROM y",
            "WITH a AS (SELECT 1) SELECT * FROM a",
            "SHOW TABLES",
        ] {
            let result = enforce_limit(sql, 10);
            assert_eq!(result.sql, sql);
            assert_eq!(result.kind, StatementKind::Other);
            assert_eq!(result.action, LimitAction::Unchanged);
        }
    }

    #[test]
    fn test_non_select_is_trimmed() {
        assert_eq!(limited("  DROP TABLE x;  ", 10), "DROP TABLE x;");
    }

    #[test]
    fn test_empty_and_whitespace_are_other() {
        assert_eq!(enforce_limit("", 10).kind, StatementKind::Other);
        assert_eq!(limited("", 10), "");
        assert_eq!(limited("   \n\t", 10), "");
    }

    #[test]
    fn test_select_without_whitespace_is_other() {
        assert_eq!(classify_statement("SELECT"), StatementKind::Other);
        assert_eq!(classify_statement("SELECT*FROM t"), StatementKind::Other);
        assert_eq!(classify_statement("SELECTED"), StatementKind::Other);
    }

    #[test]
    fn test_inner_limit_is_not_recognized() {
        assert_eq!(
            limited("SELECT * FROM (SELECT * FROM t LIMIT 5) s", 100),
            "SELECT * FROM (SELECT * FROM t LIMIT 5) s LIMIT 100"
        );
    }

    #[test]
    fn test_only_trailing_limit_is_reduced() {
        assert_eq!(
            limited("SELECT * FROM t LIMIT 5000 UNION SELECT * FROM u LIMIT 7000", 100),
            "SELECT * FROM t LIMIT 5000 UNION SELECT * FROM u LIMIT 100"
        );
    }

    #[test]
    fn test_limit_word_inside_identifier_is_not_a_clause() {
        assert_eq!(
            limited("SELECT * FROM t WHERE x = rate_limit 5", 10),
            "SELECT * FROM t WHERE x = rate_limit 5 LIMIT 10"
        );
    }

    #[test]
    fn test_appended_limit_round_trips() {
        let sql = "SELECT a, b FROM t WHERE c > 1";
        let result = limited(sql, 42);
        assert_eq!(result.strip_suffix(" LIMIT 42"), Some(sql));
    }

    #[test]
    fn test_enforce_is_idempotent() {
        for sql in [
            "SELECT * FROM t",
            "SELECT * FROM t;",
            "SELECT * FROM t LIMIT 5000;",
            "SELECT * FROM t LIMIT 3",
            "CREATE TABLE x AS SELECT 1",
            "  ",
        ] {
            let once = limited(sql, 100);
            let twice = limited(&once, 100);
            assert_eq!(once, twice, "not idempotent for {sql:?}");
        }
    }
}
