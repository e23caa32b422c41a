pub mod auth;
pub mod notes;
pub mod oauth;
pub mod translate;
