table! {
    guild_settings (guild_id) {
        guild_id -> BigInt,
        suggestion_channel_id -> Nullable<BigInt>,
        reviewer_role_id -> Nullable<BigInt>,
        blocked_role_id -> Nullable<BigInt>,
    }
}

table! {
    suggestions (suggestion_id) {
        suggestion_id -> Text,
        guild_id -> BigInt,
        user_id -> BigInt,
        message_id -> BigInt,
        thread_id -> Nullable<BigInt>,
        title -> Text,
        description -> Text,
        pros -> Text,
        cons -> Text,
        image_url -> Nullable<Text>,
        status -> Text,
        created_at -> Text,
        decision_reason -> Nullable<Text>,
        decided_anonymously -> Bool,
    }
}

table! {
    votes (suggestion_id, user_id) {
        suggestion_id -> Text,
        user_id -> BigInt,
        vote_type -> Text,
    }
}

table! {
    schema_migrations (version) {
        version -> Integer,
        name -> Text,
        applied_at -> Text,
    }
}

allow_tables_to_appear_in_same_query!(guild_settings, suggestions, votes, schema_migrations,);
