// Decisio schema - decision, context and evaluation tables for Diesel ORM

diesel::table! {
    schema_versions (id) {
        id -> Integer,
        version -> Text,
        name -> Text,
        features -> Text,
        introduced_at -> Text,
    }
}

diesel::table! {
    decisions (seq) {
        seq -> Integer,
        id -> Text,                      // UUID - public identifier
        title -> Text,
        description -> Text,
        decision_type -> Text,           // 'architecture', 'technology', 'process'
        confidence_level -> Text,        // 'low', 'medium', 'high'
        created_at -> Text,
        updated_at -> Text,
    }
}

// Singleton row: slot is always 1
diesel::table! {
    project_context (slot) {
        slot -> Integer,
        id -> Text,
        team_size -> Integer,
        expected_users -> Integer,
        timeline_months -> Integer,
        constraints -> Nullable<Text>,
        updated_at -> Text,
    }
}

diesel::table! {
    decision_context_snapshots (seq) {
        seq -> Integer,
        id -> Text,
        decision_id -> Text,             // FK to decisions.id
        team_size_at_decision -> Integer,
        expected_users_at_decision -> Integer,
        timeline_at_decision -> Integer,
        assumptions -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    decision_evaluations (seq) {
        seq -> Integer,
        id -> Text,
        decision_id -> Text,             // FK to decisions.id
        drift_score -> Integer,          // 0-100
        risk_level -> Text,              // 'low', 'medium', 'high'
        explanation -> Text,
        evaluated_at -> Text,
    }
}
