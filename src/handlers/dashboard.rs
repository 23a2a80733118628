use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::MoneyFormat;
use crate::models::Dataset;
use crate::services::dashboard::{render, MetricColumn, RenderSpec};
use crate::state::AppState;
use crate::VERSION;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub month: Option<String>,
    pub category: Option<String>,
}

impl DashboardParams {
    pub fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(month) = self.month.as_deref().filter(|m| !m.is_empty()) {
            parts.push(format!("month={}", urlencoding::encode(month)));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            parts.push(format!("category={}", urlencoding::encode(category)));
        }
        parts.join("&")
    }
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

fn select_options(values: Vec<String>, selected: Option<&str>) -> Vec<SelectOption> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| SelectOption {
            selected: match selected {
                Some(s) => s == value,
                None => i == 0,
            },
            value,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub title: String,
    pub version: &'static str,
    pub error: Option<String>,
    pub month_options: Vec<SelectOption>,
    pub category_options: Vec<SelectOption>,
    pub metric_columns: Vec<MetricColumn>,
    pub category_focus: String,
    pub charts_json: String,
    pub api_link: String,
}

impl DashboardTemplate {
    fn from_spec(spec: RenderSpec, money: &MoneyFormat, params: &DashboardParams) -> AppResult<Self> {
        let charts_json = serde_json::to_string(&spec.charts)
            .map_err(|e| AppError::Internal(format!("Chart serialization error: {}", e)))?
            .replace("</", "<\\/");

        let focus = &spec.category_focus;
        let category_focus = format!(
            "{} items in {} purchases, {} in total",
            focus.rows,
            focus.purchases,
            money.cents(focus.total_spend_cents)
        );

        Ok(Self {
            title: "Spending Dashboard".into(),
            version: VERSION,
            error: None,
            month_options: select_options(spec.months, Some(&spec.selection.month)),
            category_options: select_options(spec.categories, Some(&spec.selection.category)),
            metric_columns: spec.metric_columns,
            category_focus,
            charts_json,
            api_link: api_link(params),
        })
    }

    /// Error-only page. Selectors are kept when the dataset itself loaded so
    /// another month can be picked.
    fn from_error(error: &AppError, dataset: Option<&Dataset>, params: &DashboardParams) -> Self {
        let (month_options, category_options) = match dataset {
            Some(dataset) => (
                select_options(
                    dataset.months().iter().map(|m| m.to_string()).collect(),
                    params.month.as_deref(),
                ),
                select_options(dataset.categories(), params.category.as_deref()),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            title: "Spending Dashboard".into(),
            version: VERSION,
            error: Some(error.to_string()),
            month_options,
            category_options,
            metric_columns: Vec::new(),
            category_focus: String::new(),
            charts_json: "[]".into(),
            api_link: api_link(params),
        }
    }
}

fn api_link(params: &DashboardParams) -> String {
    let query = params.query_string();
    if query.is_empty() {
        "/api/dashboard".into()
    } else {
        format!("/api/dashboard?{}", query)
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> AppResult<Html<String>> {
    debug!("Loading dashboard");
    let money = state.config.money_format();

    let template = match state.load_dataset() {
        Ok(dataset) => match render(
            &dataset,
            params.month.as_deref(),
            params.category.as_deref(),
            &money,
        ) {
            Ok(spec) => DashboardTemplate::from_spec(spec, &money, &params)?,
            Err(e) => {
                warn!(error = %e, "Dashboard render failed");
                DashboardTemplate::from_error(&e, Some(&dataset), &params)
            }
        },
        Err(e) => {
            warn!(error = %e, "Dataset unavailable");
            DashboardTemplate::from_error(&e, None, &params)
        }
    };

    template.render_html()
}
