//! Schema verification runs.

use hosted_db_core::config::{ANON_KEY_VAR, ENDPOINT_URL_VAR};
use hosted_db_core::manifest::{EXPECTED_TABLES, EXPECTED_VIEW};
use hosted_db_core::verify::{self, TableStatus};
use hosted_db_core::{CountMode, OpsError, Outcome};

use super::helpers::{env, output, StubReader, ANON_KEY, HOSTED_URL};

const MISSING: [&str; 2] = ["user_challenges", "point_transactions"];

/// Every expected table present except [`MISSING`], view present.
fn partially_deployed() -> StubReader {
    EXPECTED_TABLES
        .iter()
        .enumerate()
        .filter(|(_, table)| !MISSING.contains(*table))
        .fold(StubReader::new(), |stub, (index, table)| {
            stub.present(table, (index as u64 + 1) * 10)
        })
        .present(EXPECTED_VIEW, 4)
}

fn fully_deployed() -> StubReader {
    MISSING
        .iter()
        .fold(partially_deployed(), |stub, table| stub.present(table, 0))
}

fn table_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| line.starts_with("  ✅ ") || line.starts_with("  ❌ "))
        .filter(|line| {
            EXPECTED_TABLES
                .iter()
                .any(|table| line[6..].starts_with(&format!("{:<25}", table)))
        })
        .collect()
}

#[tokio::test]
async fn test_missing_tables_do_not_stop_the_scan() {
    let stub = partially_deployed();
    let vars = env(&[(ENDPOINT_URL_VAR, HOSTED_URL), (ANON_KEY_VAR, ANON_KEY)]);
    let mut out = Vec::new();

    let outcome = verify::run(&vars, |_| Ok(&stub), &mut out).await.unwrap();
    let text = output(out);

    let lines = table_lines(&text);
    assert_eq!(lines.len(), 11, "{}", text);
    assert_eq!(lines.iter().filter(|l| l.ends_with(" rows)")).count(), 9);
    assert_eq!(lines.iter().filter(|l| l.ends_with("NOT FOUND")).count(), 2);
    assert!(text.contains(&format!("  ✅ {:<25} (10 rows)", "users")));
    assert!(text.contains(&format!("  ❌ {:<25} NOT FOUND", "point_transactions")));
    assert!(text.contains("⚠️  2 of 11 tables missing"));
    assert!(!text.contains("Schema deployed successfully!"));
    assert!(text.contains("Verification Complete!"));
    assert_eq!(outcome, Outcome::Success);
    assert_eq!(outcome.code(), 0);

    let calls = stub.calls();
    assert_eq!(calls.len(), 12);
    let queried: Vec<&str> = calls.iter().take(11).map(|(t, _)| t.as_str()).collect();
    assert_eq!(queried, EXPECTED_TABLES.to_vec());
    assert_eq!(calls[11].0, EXPECTED_VIEW);
    assert!(calls.iter().all(|(_, mode)| *mode == CountMode::Head));
}

#[tokio::test]
async fn test_complete_schema_succeeds() {
    let stub = fully_deployed();
    let vars = env(&[(ANON_KEY_VAR, ANON_KEY)]);
    let mut out = Vec::new();

    let outcome = verify::run(&vars, |_| Ok(&stub), &mut out).await.unwrap();
    let text = output(out);

    assert_eq!(outcome, Outcome::Success);
    assert!(text.contains("✓ Project: http://localhost:54321"));
    assert!(text.contains("  ✅ neighborhood_feed accessible"));
    assert!(text.contains("RLS policies are not checked automatically"));
    assert!(text.contains("✅ Schema deployed successfully!"));
    assert!(!text.contains(ANON_KEY));
}

#[tokio::test]
async fn test_rejected_key_aborts_scan() {
    let stub = fully_deployed().failing(
        "users",
        OpsError::Authentication("Invalid API key".to_string()),
    );
    let vars = env(&[(ANON_KEY_VAR, ANON_KEY)]);
    let mut out = Vec::new();

    let outcome = verify::run(&vars, |_| Ok(&stub), &mut out).await.unwrap();
    let text = output(out);

    assert_eq!(outcome, Outcome::Failure);
    assert_eq!(stub.calls().len(), 1);
    assert!(text.contains("❌ Verification aborted: Authentication error: Invalid API key"));
    assert!(!text.contains("Verification Complete!"));
}

#[tokio::test]
async fn test_absence_errors_are_reported_as_not_found() {
    let stub = MISSING.iter().fold(partially_deployed(), |stub, table| {
        stub.failing(
            table,
            OpsError::SchemaAbsence {
                relation: table.to_string(),
            },
        )
    });
    let vars = env(&[(ANON_KEY_VAR, ANON_KEY)]);
    let mut out = Vec::new();

    let outcome = verify::run(&vars, |_| Ok(&stub), &mut out).await.unwrap();
    let text = output(out);

    let lines = table_lines(&text);
    assert_eq!(lines.len(), 11, "{}", text);
    assert_eq!(lines.iter().filter(|l| l.ends_with(" rows)")).count(), 9);
    assert_eq!(lines.iter().filter(|l| l.ends_with("NOT FOUND")).count(), 2);
    assert!(!text.contains("UNREADABLE"));
    assert!(text.contains("⚠️  2 of 11 tables missing"));
    assert_eq!(outcome, Outcome::Success);
}

#[tokio::test]
async fn test_unreachable_endpoint_aborts_scan() {
    let stub = fully_deployed().failing(
        "users",
        OpsError::Connectivity("error sending request: Connection refused".to_string()),
    );
    let vars = env(&[(ENDPOINT_URL_VAR, HOSTED_URL), (ANON_KEY_VAR, ANON_KEY)]);
    let mut out = Vec::new();

    let outcome = verify::run(&vars, |_| Ok(&stub), &mut out).await.unwrap();
    let text = output(out);

    assert_eq!(outcome, Outcome::Failure);
    assert_eq!(stub.calls().len(), 1);
    assert!(text.contains("❌ Verification aborted: Connectivity error: error sending request"));
    assert!(!text.contains("Checking views"));
    assert!(!text.contains("Verification Complete!"));
}

#[tokio::test]
async fn test_unreadable_view_is_reported() {
    let stub = fully_deployed().failing(
        EXPECTED_VIEW,
        OpsError::PermissionDenied {
            relation: EXPECTED_VIEW.to_string(),
            message: "permission denied for view neighborhood_feed".to_string(),
        },
    );
    let vars = env(&[(ANON_KEY_VAR, ANON_KEY)]);
    let mut out = Vec::new();

    let outcome = verify::run(&vars, |_| Ok(&stub), &mut out).await.unwrap();
    let text = output(out);

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(stub.calls().len(), 12);
    assert!(text.contains("  ⚠️  neighborhood_feed UNREADABLE (Permission denied on 'neighborhood_feed'"));
    assert!(text.contains("⚠️  View neighborhood_feed unreadable"));
    assert!(!text.contains("Schema deployed successfully!"));
}

#[tokio::test]
async fn test_permission_denied_is_isolated() {
    let stub = fully_deployed().failing(
        "badges",
        OpsError::PermissionDenied {
            relation: "badges".to_string(),
            message: "permission denied for table badges".to_string(),
        },
    );

    let report = verify::verify_schema(&stub, &EXPECTED_TABLES, EXPECTED_VIEW)
        .await
        .unwrap();

    assert_eq!(report.tables.len(), 11);
    assert_eq!(report.missing_tables(), 0);
    assert_eq!(report.unreadable_tables(), 1);
    assert_eq!(report.summary(), "1 of 11 tables unreadable");
    let badges = report
        .tables
        .iter()
        .find(|t| t.table_name == "badges")
        .unwrap();
    assert!(matches!(badges.status, TableStatus::Unreadable(ref reason) if reason.contains("permission denied")));
    assert!(report.view.is_found());
    assert_eq!(stub.calls().len(), 12);
}

#[tokio::test]
async fn test_missing_anon_key_makes_no_request() {
    let stub = fully_deployed();
    let vars = env(&[(ENDPOINT_URL_VAR, HOSTED_URL)]);
    let mut connects = 0;
    let mut out = Vec::new();

    let outcome = verify::run(
        &vars,
        |_| {
            connects += 1;
            Ok(&stub)
        },
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(outcome.code(), 1);
    assert_eq!(connects, 0);
    assert!(stub.calls().is_empty());
    assert!(!output(out).contains("Checking tables"));
}

#[tokio::test]
async fn test_repeated_scans_classify_identically() {
    let stub = partially_deployed();

    let first = verify::verify_schema(&stub, &EXPECTED_TABLES, EXPECTED_VIEW)
        .await
        .unwrap();
    let second = verify::verify_schema(&stub, &EXPECTED_TABLES, EXPECTED_VIEW)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.missing_tables(), 2);
}
