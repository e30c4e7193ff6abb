//! Diesel schema definitions for BugAI server.

diesel::table! {
    history (row_id) {
        row_id -> Int4,
        id -> Text,
        language -> Text,
        timestamp -> Text,
        explanation -> Text,
        bug_count -> Int4,
        full_data -> Text,
        created_at -> Timestamp,
    }
}
