use serde::Serialize;
use tracing::debug;

use crate::date_utils::YearMonth;
use crate::error::{AppError, AppResult};
use crate::filters::MoneyFormat;
use crate::models::Dataset;
use crate::services::charts::{build_charts, ChartSpec};
use crate::services::metrics::{CategoryFocus, MonthMetrics, OverallMetrics};

/// The month and category the dashboard is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub month: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricColumn {
    pub cards: Vec<MetricCard>,
}

/// Everything the presentation layer needs to draw one dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSpec {
    pub months: Vec<String>,
    pub categories: Vec<String>,
    pub selection: Selection,
    pub overall: OverallMetrics,
    pub selected_month: MonthMetrics,
    pub category_focus: CategoryFocus,
    pub metric_columns: Vec<MetricColumn>,
    pub charts: Vec<ChartSpec>,
}

impl RenderSpec {
    pub fn metric_count(&self) -> usize {
        self.metric_columns.iter().map(|c| c.cards.len()).sum()
    }
}

/// Resolve the requested month and category against the dataset.
///
/// Missing values default to the earliest month and the first category.
/// A month that is not `YYYY-MM` is rejected; a well-formed month without
/// data is accepted and fails later when its metrics are computed.
pub fn resolve_selection(
    dataset: &Dataset,
    month: Option<&str>,
    category: Option<&str>,
) -> AppResult<(YearMonth, String)> {
    let month = match month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(raw) => raw.parse::<YearMonth>().map_err(AppError::Validation)?,
        None => dataset
            .months()
            .first()
            .copied()
            .ok_or_else(|| AppError::EmptyDataset("the dataset has no rows".into()))?,
    };

    let category = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => c.to_string(),
        None => dataset
            .categories()
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EmptyDataset("the dataset has no rows".into()))?,
    };

    Ok((month, category))
}

/// Compute every metric and chart for one selection.
///
/// Any failure aborts the whole render so no partially computed dashboard is
/// ever produced.
pub fn render(
    dataset: &Dataset,
    month: Option<&str>,
    category: Option<&str>,
    money: &MoneyFormat,
) -> AppResult<RenderSpec> {
    if dataset.is_empty() {
        return Err(AppError::EmptyDataset("the dataset has no rows".into()));
    }

    let (month, category) = resolve_selection(dataset, month, category)?;
    debug!(%month, %category, rows = dataset.len(), "Rendering dashboard");

    let overall = OverallMetrics::compute(dataset)?;
    let selected_month = MonthMetrics::compute(dataset, month)?;
    let category_focus = CategoryFocus::compute(dataset, &category);
    let metric_columns = metric_columns(&overall, &selected_month, money);
    let charts = build_charts(dataset);

    Ok(RenderSpec {
        months: dataset.months().iter().map(|m| m.to_string()).collect(),
        categories: dataset.categories(),
        selection: Selection {
            month: month.to_string(),
            category,
        },
        overall,
        selected_month,
        category_focus,
        metric_columns,
        charts,
    })
}

fn metric_columns(
    overall: &OverallMetrics,
    selected: &MonthMetrics,
    money: &MoneyFormat,
) -> Vec<MetricColumn> {
    let card = |label, value| MetricCard { label, value };

    vec![
        MetricColumn {
            cards: vec![
                card("Total Spend", money.cents(overall.total_spend_cents)),
                card(
                    "Average Spend per Purchase",
                    money.average_cents(overall.average_spend_per_purchase_cents),
                ),
                card("Total Purchases", overall.total_purchases.to_string()),
                card("Distinct Items", overall.distinct_items.to_string()),
            ],
        },
        MetricColumn {
            cards: vec![
                card("Top Category", overall.top_category.clone()),
                card(
                    "Average Monthly Spend",
                    money.average_cents(overall.average_monthly_spend_cents),
                ),
                card(
                    "Tickets per Month",
                    money.decimal(overall.average_tickets_per_month),
                ),
            ],
        },
        MetricColumn {
            cards: vec![
                card(
                    "Spend in Selected Month",
                    money.cents(selected.total_spend_cents),
                ),
                card(
                    "Purchases in Selected Month",
                    selected.purchases.to_string(),
                ),
                card(
                    "Top Category in Selected Month",
                    selected.top_category.clone(),
                ),
            ],
        },
    ]
}
