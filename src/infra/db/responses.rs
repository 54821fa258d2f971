use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ChoiceCount, RepoError, ResponseStats, ResponsesRepo},
    domain::entities::{ResponseDraft, ResponseRecord},
    domain::schema::ChoiceField,
};

use super::{PostgresRepositories, map_sqlx_error};

const RESPONSE_COLUMNS: &str = "id, name, age, sex, city, occupation, knows_natural_medicine, \
     plant_usage, care_types, frequency, purchase_places, product_type, motivations, \
     purchase_criteria, service_interests, budget, suggestions, comments, created_at";

#[derive(sqlx::FromRow)]
struct ResponseRow {
    id: i64,
    name: String,
    age: Option<i32>,
    sex: String,
    city: String,
    occupation: String,
    knows_natural_medicine: bool,
    plant_usage: String,
    care_types: String,
    frequency: String,
    purchase_places: String,
    product_type: String,
    motivations: String,
    purchase_criteria: String,
    service_interests: String,
    budget: String,
    suggestions: String,
    comments: String,
    created_at: OffsetDateTime,
}

impl From<ResponseRow> for ResponseRecord {
    fn from(row: ResponseRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            age: row.age,
            sex: row.sex,
            city: row.city,
            occupation: row.occupation,
            knows_natural_medicine: row.knows_natural_medicine,
            plant_usage: row.plant_usage,
            care_types: row.care_types,
            frequency: row.frequency,
            purchase_places: row.purchase_places,
            product_type: row.product_type,
            motivations: row.motivations,
            purchase_criteria: row.purchase_criteria,
            service_interests: row.service_interests,
            budget: row.budget,
            suggestions: row.suggestions,
            comments: row.comments,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    average_age: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct ChoiceCountRow {
    value: String,
    count: i64,
}

#[async_trait]
impl ResponsesRepo for PostgresRepositories {
    async fn insert_response(&self, draft: ResponseDraft) -> Result<ResponseRecord, RepoError> {
        let sql = format!(
            r#"
            INSERT INTO survey_responses (
                name, age, sex, city, occupation, knows_natural_medicine, plant_usage,
                care_types, frequency, purchase_places, product_type, motivations,
                purchase_criteria, service_interests, budget, suggestions, comments
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {RESPONSE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(draft.name)
            .bind(draft.age)
            .bind(draft.sex)
            .bind(draft.city)
            .bind(draft.occupation)
            .bind(draft.knows_natural_medicine)
            .bind(draft.plant_usage)
            .bind(draft.care_types)
            .bind(draft.frequency)
            .bind(draft.purchase_places)
            .bind(draft.product_type)
            .bind(draft.motivations)
            .bind(draft.purchase_criteria)
            .bind(draft.service_interests)
            .bind(draft.budget)
            .bind(draft.suggestions)
            .bind(draft.comments)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_response(&self, id: i64) -> Result<Option<ResponseRecord>, RepoError> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM survey_responses WHERE id = $1");

        let row = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ResponseRecord::from))
    }

    async fn list_responses(&self) -> Result<Vec<ResponseRecord>, RepoError> {
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM survey_responses ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, ResponseRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ResponseRecord::from).collect())
    }

    async fn response_stats(&self) -> Result<ResponseStats, RepoError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT COUNT(*) AS total, AVG(age)::float8 AS average_age
            FROM survey_responses
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ResponseStats {
            total: row.total,
            average_age: row.average_age,
        })
    }

    async fn count_by_choice(&self, field: ChoiceField) -> Result<Vec<ChoiceCount>, RepoError> {
        // Column names come from a closed enum, never from input.
        let column = field.column();
        let sql = format!(
            r#"
            SELECT {column} AS value, COUNT(*) AS count
            FROM survey_responses
            GROUP BY {column}
            ORDER BY count DESC, value COLLATE "C" ASC
            "#
        );

        let rows = sqlx::query_as::<_, ChoiceCountRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| ChoiceCount {
                value: row.value,
                count: row.count,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
