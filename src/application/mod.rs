//! Application services: intake, reporting and document rendering.

pub mod dashboard;
pub mod documents;
pub mod error;
pub mod export;
pub mod intake;
pub mod render;
pub mod repos;
pub mod responses;
