diesel::table! {
    users (id) {
        id -> Text,
        email -> Text,
        password_hash -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    sessions (id) {
        id -> Text,
        user_id -> Text,
        token -> Text,
        expires_at -> Text,
        created_at -> Text,
        ip_address -> Nullable<Text>,
        user_agent -> Nullable<Text>,
    }
}

diesel::table! {
    translation_notes (id) {
        id -> Text,
        user_id -> Text,
        source_text -> Text,
        translated_text -> Text,
        source_lang -> Text,
        target_lang -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(sessions -> users (user_id));
diesel::joinable!(translation_notes -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, sessions, translation_notes);
