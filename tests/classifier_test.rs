//! Black-box tests for the read-only statement classifier.
//!
//! Besides fixed cases, random statements are generated to check that the
//! classifier never panics and that every write verb is caught wherever the
//! matching rule says it should be.

use mssql_mcp_server::DbError;
use mssql_mcp_server::tools::classifier::{
    WRITE_OPERATIONS, is_show_tables, matched_write_operation,
};
use mssql_mcp_server::tools::{is_allowed, is_write_operation, validate_readonly};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Random casing so matching is exercised case-insensitively.
fn random_case(word: &str) -> String {
    let mut rng = rand::thread_rng();
    word.chars()
        .map(|c| {
            if rng.gen_bool(0.5) {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

#[test]
fn test_plain_reads_are_allowed() {
    for sql in [
        "SELECT * FROM users",
        "select name from sys.tables",
        "  SELECT 1",
        "WITH x AS (SELECT 1 AS n) SELECT n FROM x",
        "SELECT COUNT(*) FROM orders WHERE status = 'open'",
        "SHOW TABLES",
    ] {
        assert!(is_allowed(sql), "expected allowed: {sql}");
        assert!(validate_readonly(sql).is_ok());
    }
}

#[test]
fn test_leading_write_verbs_are_denied() {
    for sql in [
        "INSERT INTO t VALUES (1)",
        "update t set x = 1",
        "Delete FROM t",
        "DROP TABLE t",
        "CREATE TABLE t (id INT)",
        "ALTER TABLE t ADD c INT",
        "TRUNCATE TABLE t",
        "MERGE INTO t USING s ON 1 = 1 WHEN MATCHED THEN DELETE;",
        "GRANT SELECT ON t TO bob",
        "REVOKE SELECT ON t FROM bob",
        "EXEC sp_who",
        "EXECUTE sp_who",
        "   \n\tdelete from t",
    ] {
        assert!(is_write_operation(sql), "expected denied: {sql}");
        let err = validate_readonly(sql).unwrap_err();
        assert!(matches!(err, DbError::PolicyDenied));
    }
}

#[test]
fn test_embedded_write_verbs_are_denied() {
    assert_eq!(
        matched_write_operation("SELECT 1; DROP TABLE users"),
        Some("DROP")
    );
    assert_eq!(
        matched_write_operation("WITH x AS (SELECT 1) DELETE FROM t"),
        Some("DELETE")
    );
}

#[test]
fn test_substring_rule_false_positives_are_preserved() {
    // Column names beginning with a verb still match the prefix rule
    assert!(is_write_operation("UPDATED_AT"));
    // Quoted literals are not parsed out
    assert!(is_write_operation("SELECT * FROM t WHERE note = ' delete '"));
}

#[test]
fn test_substring_rule_gaps_are_preserved() {
    // Verbs adjacent to punctuation or newlines are not caught
    assert!(is_allowed("SELECT 1;DROP TABLE t"));
    assert!(is_allowed("SELECT 1\nDELETE FROM t"));
    assert!(is_allowed("SELECT * FROM (DELETE)"));
}

#[test]
fn test_show_tables_detection() {
    assert!(is_show_tables("SHOW TABLES"));
    assert!(is_show_tables("  show   tables  "));
    assert!(is_show_tables("Show\tTables"));
    assert!(!is_show_tables("SHOW TABLES;"));
    assert!(!is_show_tables("SHOW TABLES FROM db"));
    assert!(!is_show_tables("SHOW"));
    assert!(!is_show_tables("SELECT 'SHOW TABLES'"));
}

#[test]
fn test_random_prefixed_verbs_are_denied() {
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let verb = WRITE_OPERATIONS.choose(&mut rng).unwrap();
        let sql = format!("{} {}", random_case(verb), random_string(rng.gen_range(0..40)));
        assert!(is_write_operation(&sql), "expected denied: {sql}");
    }
}

#[test]
fn test_random_space_delimited_verbs_are_denied() {
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let verb = WRITE_OPERATIONS.choose(&mut rng).unwrap();
        let sql = format!(
            "SELECT {} {} {}",
            random_string(rng.gen_range(1..20)),
            random_case(verb),
            random_string(rng.gen_range(1..20))
        );
        assert!(matched_write_operation(&sql).is_some(), "{sql}");
    }
}

#[test]
fn test_random_input_never_panics() {
    let mut rng = rand::thread_rng();
    let edge_cases = [
        String::new(),
        " ".to_string(),
        "\n\r\t".to_string(),
        "\0".to_string(),
        "ééé".repeat(100),
        "'; DROP TABLE users--".to_string(),
        "a".repeat(100_000),
        "\u{0000}\u{FFFF}".to_string(),
    ];
    for sql in edge_cases.iter() {
        let _ = matched_write_operation(sql);
        let _ = is_show_tables(sql);
    }
    for _ in 0..1000 {
        let sql = random_string(rng.gen_range(0..200));
        let _ = matched_write_operation(&sql);
        let _ = is_show_tables(&sql);
    }
}
