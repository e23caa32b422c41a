use diesel::prelude::*;
use serde::Serialize;

/// A saved translation. Created and deleted explicitly by its owner, never
/// updated in place.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = crate::schema::translation_notes)]
pub struct TranslationNote {
    pub id: String,
    pub user_id: String,
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::translation_notes)]
pub struct NewNote<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub source_text: &'a str,
    pub translated_text: &'a str,
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    pub created_at: &'a str,
}
