#![allow(dead_code)]

use axum::{body::Body, http::Response};
use questionnaire::application::repos::memory::MemoryResponses;
use questionnaire::domain::entities::ResponseDraft;
use time::macros::datetime;

/// A store holding `count` copies of [`sample_draft`] with ids `1..=count`.
pub fn seeded_store(count: i64) -> MemoryResponses {
    MemoryResponses::with_records(
        (1..=count)
            .map(|id| sample_draft().into_record(id, datetime!(2025-03-14 09:30:00 UTC)))
            .collect(),
    )
}

pub fn sample_draft() -> ResponseDraft {
    ResponseDraft {
        name: "Awa Diop".to_string(),
        age: Some(34),
        sex: "Femme".to_string(),
        city: "Thiès".to_string(),
        knows_natural_medicine: true,
        plant_usage: "Parfois".to_string(),
        budget: "5000-10000".to_string(),
        ..ResponseDraft::default()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable")
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("body should be utf-8")
}
