//! Natural-medicine survey service: form intake, reporting and paginated
//! PDF questionnaires.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
