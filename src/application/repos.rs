//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ResponseDraft, ResponseRecord};
use crate::domain::schema::ChoiceField;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Response count and mean respondent age.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResponseStats {
    pub total: i64,
    /// `None` when no response carries an age.
    pub average_age: Option<f64>,
}

/// Number of responses sharing one stored value of a choice field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceCount {
    pub value: String,
    pub count: i64,
}

#[async_trait]
pub trait ResponsesRepo: Send + Sync {
    /// Append a response; the store assigns `id` and `created_at`.
    async fn insert_response(&self, draft: ResponseDraft) -> Result<ResponseRecord, RepoError>;

    async fn find_response(&self, id: i64) -> Result<Option<ResponseRecord>, RepoError>;

    /// Every response, newest first.
    async fn list_responses(&self) -> Result<Vec<ResponseRecord>, RepoError>;

    async fn response_stats(&self) -> Result<ResponseStats, RepoError>;

    /// Counts per distinct value, most frequent first, ties by value.
    async fn count_by_choice(&self, field: ChoiceField) -> Result<Vec<ChoiceCount>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}

/// Vec-backed [`ResponsesRepo`] used by the service and router tests.
pub mod memory {
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use time::OffsetDateTime;

    use super::*;

    #[derive(Default)]
    pub struct MemoryResponses {
        records: Mutex<Vec<ResponseRecord>>,
        fail: bool,
    }

    impl MemoryResponses {
        pub fn with_records(records: Vec<ResponseRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                fail: false,
            }
        }

        /// A store whose every call times out.
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn len(&self) -> usize {
            self.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.lock().is_empty()
        }

        /// Stored records in insertion order.
        pub fn records(&self) -> Vec<ResponseRecord> {
            self.lock().clone()
        }

        fn lock(&self) -> MutexGuard<'_, Vec<ResponseRecord>> {
            self.records.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn check(&self) -> Result<(), RepoError> {
            if self.fail {
                Err(RepoError::Timeout)
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ResponsesRepo for MemoryResponses {
        async fn insert_response(
            &self,
            draft: ResponseDraft,
        ) -> Result<ResponseRecord, RepoError> {
            self.check()?;
            let mut records = self.lock();
            let id = records.iter().map(|record| record.id).max().unwrap_or(0) + 1;
            let record = draft.into_record(id, OffsetDateTime::now_utc());
            records.push(record.clone());
            Ok(record)
        }

        async fn find_response(&self, id: i64) -> Result<Option<ResponseRecord>, RepoError> {
            self.check()?;
            Ok(self.lock().iter().find(|record| record.id == id).cloned())
        }

        async fn list_responses(&self) -> Result<Vec<ResponseRecord>, RepoError> {
            self.check()?;
            let mut records = self.records();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(records)
        }

        async fn response_stats(&self) -> Result<ResponseStats, RepoError> {
            self.check()?;
            let records = self.lock();
            let ages: Vec<f64> = records
                .iter()
                .filter_map(|record| record.age.map(f64::from))
                .collect();
            let average_age =
                (!ages.is_empty()).then(|| ages.iter().sum::<f64>() / ages.len() as f64);
            Ok(ResponseStats {
                total: records.len() as i64,
                average_age,
            })
        }

        async fn count_by_choice(
            &self,
            field: ChoiceField,
        ) -> Result<Vec<ChoiceCount>, RepoError> {
            self.check()?;
            let mut counts: BTreeMap<String, i64> = BTreeMap::new();
            for record in self.lock().iter() {
                let value = record
                    .field_value(field.column())
                    .map(|value| value.to_string())
                    .unwrap_or_default();
                *counts.entry(value).or_default() += 1;
            }
            let mut counts: Vec<ChoiceCount> = counts
                .into_iter()
                .map(|(value, count)| ChoiceCount { value, count })
                .collect();
            counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
            Ok(counts)
        }

        async fn health_check(&self) -> Result<(), RepoError> {
            self.check()
        }
    }
}
