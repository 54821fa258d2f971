//! Paginated questionnaire rendering.
//!
//! The pipeline is pure: a [`Document`](crate::domain::document::Document)
//! goes through [`render_document`] into positioned pages, then [`finalize`]
//! serializes those pages into PDF bytes. Nothing here touches the
//! filesystem or shared state; callers decide where the bytes go.

mod adapter;
mod layout;
mod pdf;

pub use adapter::{RecordEntry, record_document, record_entries};
pub use layout::{
    A4_HEIGHT, A4_WIDTH, AVERAGE_ADVANCE, BODY_FONT_SIZE, CM, LayoutConfig, LayoutError,
    LineMetrics, Page, Primitive, TextStyle, min_space_to_fit, render_document,
};
pub use pdf::{DocumentInfo, RenderError, finalize};
