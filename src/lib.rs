pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repos;
pub mod schema;
pub mod security;
pub mod translate;
pub mod web;
