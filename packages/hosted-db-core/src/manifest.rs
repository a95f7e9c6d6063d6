//! What the deployed schema is expected to contain.
//!
//! Maintained by hand alongside `backend/supabase/schema.sql`; nothing here
//! is derived from parsing the file.

/// Tables checked by the verifier, in report order.
pub const EXPECTED_TABLES: [&str; 11] = [
    "users",
    "broadcasts",
    "tasks",
    "messages",
    "reviews",
    "badges",
    "challenges",
    "leaderboards",
    "user_badges",
    "user_challenges",
    "point_transactions",
];

/// View checked for accessibility after the tables.
pub const EXPECTED_VIEW: &str = "neighborhood_feed";

/// Table read by the connection test.
pub const PROBE_TABLE: &str = "users";

/// Structural summary printed by the deployment advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaManifest {
    pub tables: &'static [&'static str],
    pub policy_count: usize,
    pub views: &'static [&'static str],
    pub functions: &'static [&'static str],
}

impl SchemaManifest {
    pub const CURRENT: SchemaManifest = SchemaManifest {
        tables: &[
            "users",
            "broadcasts",
            "tasks",
            "messages",
            "reviews",
            "badges",
            "challenges",
            "leaderboards",
        ],
        policy_count: 17,
        views: &[EXPECTED_VIEW],
        functions: &["award_points", "update_user_level"],
    };
}
