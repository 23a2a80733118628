//! Chart data preparation.
//!
//! Every chart is a declarative [`ChartSpec`]: kind, title, axis labels and a
//! small data table. Drawing happens in the browser.

use std::collections::HashMap;

use serde::Serialize;

use crate::date_utils::WEEKDAY_LABELS;
use crate::models::Dataset;
use crate::services::metrics::{category_totals, daily_totals, monthly_totals};

pub const TOP_ITEMS_LIMIT: usize = 10;
pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Heatmap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub label: String,
    pub value: f64,
}

/// Dense hour x weekday grid. `cells[hour][weekday]`, weekday 0 = Monday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapMatrix {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    Series { points: Vec<DataPoint> },
    Matrix(HeatmapMatrix),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: &'static str,
    pub kind: ChartKind,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub data: ChartData,
}

impl ChartSpec {
    fn series(
        id: &'static str,
        kind: ChartKind,
        title: &'static str,
        (x_label, y_label): (&'static str, &'static str),
        points: Vec<DataPoint>,
    ) -> Self {
        Self {
            id,
            kind,
            title,
            x_label,
            y_label,
            data: ChartData::Series { points },
        }
    }

    pub fn points(&self) -> Option<&[DataPoint]> {
        match &self.data {
            ChartData::Series { points } => Some(points),
            ChartData::Matrix(_) => None,
        }
    }
}

/// The six dashboard charts, in display order.
pub fn build_charts(dataset: &Dataset) -> Vec<ChartSpec> {
    vec![
        ChartSpec::series(
            "category_share",
            ChartKind::Pie,
            "Spend by Category",
            ("Category", "Spend"),
            cents_points(spend_by_category(dataset)),
        ),
        ChartSpec::series(
            "monthly_spend",
            ChartKind::Bar,
            "Monthly Spend",
            ("Month", "Spend"),
            cents_points(spend_by_month(dataset)),
        ),
        ChartSpec::series(
            "category_average",
            ChartKind::Bar,
            "Average Price per Category",
            ("Category", "Average Price"),
            average_price_by_category(dataset)
                .into_iter()
                .map(|(label, cents)| DataPoint {
                    label,
                    value: cents / 100.0,
                })
                .collect(),
        ),
        ChartSpec::series(
            "daily_spend",
            ChartKind::Line,
            "Daily Spend",
            ("Date", "Spend"),
            cents_points(spend_by_day(dataset)),
        ),
        ChartSpec::series(
            "top_items",
            ChartKind::Bar,
            "Top 10 Items",
            ("Item", "Spend"),
            cents_points(top_items(dataset, TOP_ITEMS_LIMIT)),
        ),
        ChartSpec {
            id: "weekly_heatmap",
            kind: ChartKind::Heatmap,
            title: "Spend by Day and Hour",
            x_label: "Day of Week",
            y_label: "Hour of Day",
            data: ChartData::Matrix(heatmap_matrix(dataset)),
        },
    ]
}

fn cents_points(rows: Vec<(String, i64)>) -> Vec<DataPoint> {
    rows.into_iter()
        .map(|(label, cents)| DataPoint {
            label,
            value: cents as f64 / 100.0,
        })
        .collect()
}

/// Category -> summed price, lexical order.
pub fn spend_by_category(dataset: &Dataset) -> Vec<(String, i64)> {
    category_totals(dataset)
        .into_iter()
        .map(|(category, cents)| (category.to_string(), cents))
        .collect()
}

/// `YYYY-MM` -> summed price, one row per month from first to last.
pub fn spend_by_month(dataset: &Dataset) -> Vec<(String, i64)> {
    monthly_totals(dataset)
        .into_iter()
        .map(|(month, cents)| (month.to_string(), cents))
        .collect()
}

/// `YYYY-MM-DD` -> summed price, one row per day from first to last.
pub fn spend_by_day(dataset: &Dataset) -> Vec<(String, i64)> {
    daily_totals(dataset)
        .into_iter()
        .map(|(day, cents)| (day.format("%Y-%m-%d").to_string(), cents))
        .collect()
}

/// Category -> mean price per item row, highest first.
pub fn average_price_by_category(dataset: &Dataset) -> Vec<(String, f64)> {
    let mut sums: HashMap<&str, (i64, usize)> = HashMap::new();
    for item in dataset {
        let entry = sums.entry(item.category.as_str()).or_insert((0, 0));
        entry.0 += item.price_cents;
        entry.1 += 1;
    }

    let mut result: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(category, (total, count))| (category.to_string(), total as f64 / count as f64))
        .collect();

    result.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    result
}

/// Items with the highest summed price. Equal totals keep the order in which
/// the items first appear in the dataset.
pub fn top_items(dataset: &Dataset, limit: usize) -> Vec<(String, i64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(String, i64)> = Vec::new();

    for item in dataset {
        match index.get(item.item.as_str()) {
            Some(&i) => totals[i].1 += item.price_cents,
            None => {
                index.insert(item.item.as_str(), totals.len());
                totals.push((item.item.clone(), item.price_cents));
            }
        }
    }

    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals.truncate(limit);
    totals
}

/// Summed price per (hour, weekday). Always 24 x 7, missing cells are zero.
pub fn heatmap_cells(dataset: &Dataset) -> [[i64; DAYS_PER_WEEK]; HOURS_PER_DAY] {
    let mut cells = [[0i64; DAYS_PER_WEEK]; HOURS_PER_DAY];
    for item in dataset {
        cells[item.hour_of_day()][item.day_of_week()] += item.price_cents;
    }
    cells
}

pub fn heatmap_matrix(dataset: &Dataset) -> HeatmapMatrix {
    HeatmapMatrix {
        x_labels: WEEKDAY_LABELS.iter().map(|d| d.to_string()).collect(),
        y_labels: (0..HOURS_PER_DAY).map(|h| h.to_string()).collect(),
        cells: heatmap_cells(dataset)
            .iter()
            .map(|row| row.iter().map(|cents| *cents as f64 / 100.0).collect())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_utils::parse_timestamp;
    use crate::models::TicketLineItem;

    fn line(ts: &str, ticket: &str, item: &str, category: &str, price_cents: i64) -> TicketLineItem {
        TicketLineItem {
            timestamp: parse_timestamp(ts).unwrap(),
            ticket_id: ticket.into(),
            location: None,
            item: item.into(),
            category: category.into(),
            price_cents,
        }
    }

    fn scenario() -> Dataset {
        Dataset::new(vec![
            line("01/01/2024 10:00", "1", "A", "Food", 1000),
            line("01/01/2024 10:05", "1", "B", "Food", 500),
            line("02/01/2024 09:00", "2", "C", "Drinks", 300),
        ])
    }

    #[test]
    fn test_spend_by_category() {
        assert_eq!(
            spend_by_category(&scenario()),
            vec![("Drinks".to_string(), 300), ("Food".to_string(), 1500)]
        );
    }

    #[test]
    fn test_average_price_sorted_descending() {
        let averages = average_price_by_category(&scenario());
        assert_eq!(averages[0].0, "Food");
        assert!((averages[0].1 - 750.0).abs() < 1e-9);
        assert_eq!(averages[1].0, "Drinks");
    }

    #[test]
    fn test_top_items_limit_and_order() {
        let mut items = Vec::new();
        for i in 0..15 {
            items.push(line(
                "01/01/2024 10:00",
                "1",
                &format!("item-{i:02}"),
                "Food",
                100 + i,
            ));
        }
        let dataset = Dataset::new(items);
        let top = top_items(&dataset, TOP_ITEMS_LIMIT);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].0, "item-14");
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_top_items_ties_keep_input_order() {
        let dataset = Dataset::new(vec![
            line("01/01/2024 10:00", "1", "Zanahoria", "Food", 200),
            line("01/01/2024 10:01", "1", "Arroz", "Food", 200),
            line("01/01/2024 10:02", "1", "Pan", "Food", 300),
        ]);
        let names: Vec<String> = top_items(&dataset, 10).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Pan", "Zanahoria", "Arroz"]);
    }

    #[test]
    fn test_top_items_sums_repeated_items() {
        let dataset = Dataset::new(vec![
            line("01/01/2024 10:00", "1", "Pan", "Food", 100),
            line("08/01/2024 10:00", "2", "Pan", "Food", 100),
            line("08/01/2024 10:00", "2", "Queso", "Food", 150),
        ]);
        assert_eq!(top_items(&dataset, 10)[0], ("Pan".to_string(), 200));
    }

    #[test]
    fn test_heatmap_shape_and_cells() {
        let matrix = heatmap_matrix(&scenario());
        assert_eq!(matrix.cells.len(), 24);
        assert!(matrix.cells.iter().all(|row| row.len() == 7));
        assert_eq!(matrix.x_labels[0], "Monday");
        assert_eq!(matrix.y_labels.len(), 24);

        // 01/01/2024 is a Monday, 02/01/2024 a Tuesday
        assert!((matrix.cells[10][0] - 15.0).abs() < 1e-9);
        assert!((matrix.cells[9][1] - 3.0).abs() < 1e-9);
        let total: f64 = matrix.cells.iter().flatten().sum();
        assert!((total - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_heatmap_empty_dataset_is_zero_filled() {
        let cells = heatmap_cells(&Dataset::default());
        assert!(cells.iter().flatten().all(|c| *c == 0));
    }

    #[test]
    fn test_build_charts_kinds() {
        let charts = build_charts(&scenario());
        let kinds: Vec<ChartKind> = charts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChartKind::Pie,
                ChartKind::Bar,
                ChartKind::Bar,
                ChartKind::Line,
                ChartKind::Bar,
                ChartKind::Heatmap
            ]
        );
        let daily = charts[3].points().unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].label, "2024-01-01");
        assert!((daily[0].value - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_chart_spec_json_shape() {
        let charts = build_charts(&scenario());
        let json = serde_json::to_value(&charts[0]).unwrap();
        assert_eq!(json["kind"], "pie");
        assert_eq!(json["data"]["type"], "series");
        assert_eq!(json["data"]["points"][1]["label"], "Food");

        let heatmap = serde_json::to_value(&charts[5]).unwrap();
        assert_eq!(heatmap["data"]["type"], "matrix");
        assert_eq!(heatmap["data"]["cells"].as_array().unwrap().len(), 24);
    }
}
