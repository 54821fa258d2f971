use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use crate::application::error::HttpError;
use crate::application::repos::{ChoiceCount, RepoError, ResponsesRepo, ResponseStats};
use crate::domain::schema::ChoiceField;
use crate::presentation::views::{DashboardView, DistributionRowView, DistributionView};

const SOURCE: &str = "application::dashboard::DashboardService";

#[derive(Clone)]
pub struct DashboardService {
    responses: Arc<dyn ResponsesRepo>,
}

impl DashboardService {
    pub fn new(responses: Arc<dyn ResponsesRepo>) -> Self {
        Self { responses }
    }

    pub async fn dashboard_view(&self) -> Result<DashboardView, HttpError> {
        let stats = self
            .responses
            .response_stats()
            .await
            .map_err(|err| repo_failure("response_stats", err))?;

        let mut distributions = Vec::with_capacity(ChoiceField::ALL.len());
        for field in ChoiceField::ALL {
            let counts = self
                .responses
                .count_by_choice(field)
                .await
                .map_err(|err| repo_failure("count_by_choice", err))?;
            distributions.push(distribution_view(field, &counts, stats.total));
        }

        Ok(DashboardView {
            total: stats.total,
            average_age: format_average_age(&stats),
            distributions,
        })
    }
}

/// Mean age with one decimal; `0.0` when no response carries an age.
pub fn format_average_age(stats: &ResponseStats) -> String {
    format!("{:.1}", stats.average_age.unwrap_or(0.0))
}

fn distribution_view(field: ChoiceField, counts: &[ChoiceCount], total: i64) -> DistributionView {
    let rows: Vec<DistributionRowView> = counts
        .iter()
        .map(|entry| DistributionRowView {
            label: field.display_label(&entry.value),
            count: entry.count,
            percent: percent(entry.count, total),
        })
        .collect();

    let chart_json = json!({
        "labels": rows.iter().map(|row| row.label.as_str()).collect::<Vec<_>>(),
        "data": rows.iter().map(|row| row.count).collect::<Vec<_>>(),
    })
    .to_string();

    DistributionView {
        title: field.title(),
        rows,
        chart_json,
    }
}

fn percent(count: i64, total: i64) -> String {
    if total <= 0 {
        return "0".to_string();
    }
    format!("{:.0}", count as f64 * 100.0 / total as f64)
}

fn repo_failure(operation: &'static str, err: RepoError) -> HttpError {
    HttpError::new(
        SOURCE,
        StatusCode::SERVICE_UNAVAILABLE,
        "Le tableau de bord est temporairement indisponible.",
        format!("{operation} failed: {err}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::memory::MemoryResponses;
    use crate::domain::entities::fixtures::sample_record;

    #[tokio::test]
    async fn empty_store_reports_zero() {
        let service = DashboardService::new(Arc::new(MemoryResponses::default()));
        let view = service.dashboard_view().await.expect("dashboard");

        assert_eq!(view.total, 0);
        assert_eq!(view.average_age, "0.0");
        assert_eq!(view.distributions.len(), ChoiceField::ALL.len());
        assert!(view.distributions.iter().all(|d| !d.has_rows()));
    }

    #[tokio::test]
    async fn aggregates_ages_and_choices() {
        let mut second = sample_record();
        second.id = 8;
        second.age = Some(41);
        second.sex = "Homme".to_string();
        let mut third = sample_record();
        third.id = 9;
        third.age = None;
        third.sex = String::new();
        let repo = MemoryResponses::with_records(vec![sample_record(), second, third]);
        let service = DashboardService::new(Arc::new(repo));

        let view = service.dashboard_view().await.expect("dashboard");

        assert_eq!(view.total, 3);
        assert_eq!(view.average_age, "37.5");

        let by_sex = &view.distributions[0];
        assert_eq!(by_sex.title, "Répartition par sexe");
        let rows: Vec<_> = by_sex
            .rows
            .iter()
            .map(|row| (row.label.as_str(), row.count, row.percent.as_str()))
            .collect();
        assert_eq!(
            rows,
            [("Non renseigné", 1, "33"), ("Femme", 1, "33"), ("Homme", 1, "33")]
        );
        let chart: serde_json::Value =
            serde_json::from_str(&by_sex.chart_json).expect("chart json");
        assert_eq!(
            chart,
            json!({"labels": ["Non renseigné", "Femme", "Homme"], "data": [1, 1, 1]})
        );

        let budget = view
            .distributions
            .iter()
            .find(|d| d.title == "Budget envisagé")
            .expect("budget distribution");
        assert_eq!(budget.rows[0].label, "5 000 – 10 000 FCFA");
        assert_eq!(budget.rows[0].percent, "100");
    }

    #[test]
    fn average_age_rounds_to_one_decimal() {
        let stats = ResponseStats {
            total: 3,
            average_age: Some(33.333),
        };
        assert_eq!(format_average_age(&stats), "33.3");
    }
}
