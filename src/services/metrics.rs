use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::date_utils::{days_inclusive, YearMonth};
use crate::error::{AppError, AppResult};
use crate::models::Dataset;

/// Statistics over the whole dataset.
#[derive(Debug, Clone, Serialize)]
pub struct OverallMetrics {
    pub total_spend_cents: i64,
    pub total_purchases: usize,
    pub average_spend_per_purchase_cents: f64,
    pub top_category: String,
    pub distinct_items: usize,
    pub average_monthly_spend_cents: f64,
    pub average_tickets_per_month: f64,
}

impl OverallMetrics {
    pub fn compute(dataset: &Dataset) -> AppResult<Self> {
        Ok(Self {
            total_spend_cents: total_spend(dataset),
            total_purchases: total_purchases(dataset),
            average_spend_per_purchase_cents: average_spend_per_purchase(dataset)?,
            top_category: top_category(dataset)?,
            distinct_items: distinct_items(dataset),
            average_monthly_spend_cents: average_monthly_spend(dataset)?,
            average_tickets_per_month: average_tickets_per_month(dataset)?,
        })
    }
}

/// Statistics restricted to one calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthMetrics {
    pub month: String,
    pub total_spend_cents: i64,
    pub purchases: usize,
    pub top_category: String,
}

impl MonthMetrics {
    pub fn compute(dataset: &Dataset, month: YearMonth) -> AppResult<Self> {
        let subset = dataset.filter_month(month);
        if subset.is_empty() {
            return Err(AppError::EmptyDataset(format!(
                "no purchases in the selected month {}",
                month
            )));
        }

        Ok(Self {
            month: month.to_string(),
            total_spend_cents: total_spend(&subset),
            purchases: total_purchases(&subset),
            top_category: top_category(&subset)?,
        })
    }
}

/// Summary of the rows in one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryFocus {
    pub category: String,
    pub rows: usize,
    pub total_spend_cents: i64,
    pub purchases: usize,
}

impl CategoryFocus {
    pub fn compute(dataset: &Dataset, category: &str) -> Self {
        let subset = dataset.filter_category(category);
        Self {
            category: category.to_string(),
            rows: subset.len(),
            total_spend_cents: total_spend(&subset),
            purchases: total_purchases(&subset),
        }
    }
}

pub fn total_spend(dataset: &Dataset) -> i64 {
    dataset.iter().map(|item| item.price_cents).sum()
}

pub fn total_purchases(dataset: &Dataset) -> usize {
    dataset
        .iter()
        .map(|item| item.ticket_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn distinct_items(dataset: &Dataset) -> usize {
    dataset
        .iter()
        .map(|item| item.item.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Sum per ticket, then mean across tickets.
pub fn average_spend_per_purchase(dataset: &Dataset) -> AppResult<f64> {
    let mut per_ticket: HashMap<&str, i64> = HashMap::new();
    for item in dataset {
        *per_ticket.entry(item.ticket_id.as_str()).or_insert(0) += item.price_cents;
    }
    mean(per_ticket.values().map(|cents| *cents as f64))
        .ok_or_else(|| empty("average spend per purchase"))
}

/// Category with the highest summed price. Among equal totals the
/// lexically smallest category name wins.
pub fn top_category(dataset: &Dataset) -> AppResult<String> {
    let totals = category_totals(dataset);

    let mut best: Option<(&str, i64)> = None;
    for (category, total) in &totals {
        match best {
            Some((_, best_total)) if *total <= best_total => {}
            _ => best = Some((*category, *total)),
        }
    }

    best.map(|(category, _)| category.to_string())
        .ok_or_else(|| empty("category with highest spend"))
}

/// Summed price per category, keyed in lexical order.
pub fn category_totals(dataset: &Dataset) -> BTreeMap<&str, i64> {
    let mut totals = BTreeMap::new();
    for item in dataset {
        *totals.entry(item.category.as_str()).or_insert(0) += item.price_cents;
    }
    totals
}

/// Summed price per calendar month, resampled from the first to the last
/// month present. Months without purchases are zero.
pub fn monthly_totals(dataset: &Dataset) -> Vec<(YearMonth, i64)> {
    let mut sums: BTreeMap<YearMonth, i64> = BTreeMap::new();
    for item in dataset {
        *sums.entry(item.month()).or_insert(0) += item.price_cents;
    }

    let (Some(first), Some(last)) = (sums.keys().next(), sums.keys().next_back()) else {
        return Vec::new();
    };

    YearMonth::range_inclusive(*first, *last)
        .into_iter()
        .map(|month| (month, sums.get(&month).copied().unwrap_or(0)))
        .collect()
}

/// Summed price per calendar day, resampled from the first to the last day
/// present. Days without purchases are zero.
pub fn daily_totals(dataset: &Dataset) -> Vec<(NaiveDate, i64)> {
    let mut sums: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for item in dataset {
        *sums.entry(item.date()).or_insert(0) += item.price_cents;
    }

    let (Some(first), Some(last)) = (sums.keys().next(), sums.keys().next_back()) else {
        return Vec::new();
    };

    days_inclusive(*first, *last)
        .into_iter()
        .map(|day| (day, sums.get(&day).copied().unwrap_or(0)))
        .collect()
}

pub fn average_monthly_spend(dataset: &Dataset) -> AppResult<f64> {
    mean(monthly_totals(dataset).iter().map(|(_, cents)| *cents as f64))
        .ok_or_else(|| empty("average monthly spend"))
}

/// Mean of distinct tickets per month, over months that have purchases.
pub fn average_tickets_per_month(dataset: &Dataset) -> AppResult<f64> {
    let mut tickets: BTreeMap<YearMonth, HashSet<&str>> = BTreeMap::new();
    for item in dataset {
        tickets
            .entry(item.month())
            .or_default()
            .insert(item.ticket_id.as_str());
    }
    mean(tickets.values().map(|set| set.len() as f64))
        .ok_or_else(|| empty("average tickets per month"))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn empty(what: &str) -> AppError {
    AppError::EmptyDataset(format!("{} needs at least one row", what))
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
    fn test_scenario_metrics() {
        let metrics = OverallMetrics::compute(&scenario()).unwrap();
        assert_eq!(metrics.total_spend_cents, 1800);
        assert_eq!(metrics.total_purchases, 2);
        assert!((metrics.average_spend_per_purchase_cents - 900.0).abs() < 1e-9);
        assert_eq!(metrics.top_category, "Food");
        assert_eq!(metrics.distinct_items, 3);
        assert!((metrics.average_monthly_spend_cents - 1800.0).abs() < 1e-9);
        assert!((metrics.average_tickets_per_month - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_category_tie_prefers_lexical_order() {
        let dataset = Dataset::new(vec![
            line("01/01/2024 10:00", "1", "A", "Zumos", 500),
            line("01/01/2024 10:05", "1", "B", "Aceites", 500),
        ]);
        assert_eq!(top_category(&dataset).unwrap(), "Aceites");
    }

    #[test]
    fn test_top_category_empty_is_error() {
        let err = top_category(&Dataset::default()).unwrap_err();
        assert!(matches!(err, AppError::EmptyDataset(_)));
    }

    #[test]
    fn test_averages_on_empty_dataset_are_errors() {
        let dataset = Dataset::default();
        assert!(average_spend_per_purchase(&dataset).is_err());
        assert!(average_monthly_spend(&dataset).is_err());
        assert!(average_tickets_per_month(&dataset).is_err());
        assert!(OverallMetrics::compute(&dataset).is_err());
    }

    #[test]
    fn test_monthly_totals_zero_fill_gaps() {
        let dataset = Dataset::new(vec![
            line("10/01/2024 10:00", "1", "A", "Food", 1000),
            line("10/03/2024 10:00", "2", "A", "Food", 2000),
        ]);
        let totals = monthly_totals(&dataset);
        let labels: Vec<String> = totals.iter().map(|(m, _)| m.to_string()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(totals[1].1, 0);
        // The empty February counts towards the monthly average
        assert!((average_monthly_spend(&dataset).unwrap() - 1000.0).abs() < 1e-9);
        // but not towards tickets per month
        assert!((average_tickets_per_month(&dataset).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_equals_sum_of_months() {
        let dataset = Dataset::new(vec![
            line("31/01/2024 23:59", "1", "A", "Food", 199),
            line("01/02/2024 00:00", "2", "B", "Food", 250),
            line("15/05/2024 12:00", "3", "C", "Drinks", 1234),
            line("16/05/2024 12:00", "3", "D", "Drinks", 66),
        ]);
        let monthly: i64 = monthly_totals(&dataset).iter().map(|(_, c)| c).sum();
        assert_eq!(monthly, total_spend(&dataset));
    }

    #[test]
    fn test_daily_totals_zero_fill_gaps() {
        let dataset = Dataset::new(vec![
            line("30/01/2024 10:00", "1", "A", "Food", 100),
            line("30/01/2024 18:00", "2", "B", "Food", 50),
            line("02/02/2024 10:00", "3", "A", "Food", 200),
        ]);
        let totals = daily_totals(&dataset);
        assert_eq!(totals.len(), 4);
        assert_eq!(totals[0].1, 150);
        assert_eq!(totals[1].1, 0);
        assert_eq!(totals[3].1, 200);
    }

    #[test]
    fn test_month_metrics() {
        let dataset = Dataset::new(vec![
            line("10/01/2024 10:00", "1", "A", "Food", 1000),
            line("10/02/2024 10:00", "2", "B", "Drinks", 300),
            line("11/02/2024 10:00", "3", "C", "Drinks", 200),
            line("11/02/2024 10:00", "3", "D", "Food", 400),
        ]);
        let february = MonthMetrics::compute(&dataset, YearMonth::new(2024, 2).unwrap()).unwrap();
        assert_eq!(february.month, "2024-02");
        assert_eq!(february.total_spend_cents, 900);
        assert_eq!(february.purchases, 2);
        assert_eq!(february.top_category, "Drinks");
        assert!(february.purchases <= total_purchases(&dataset));
    }

    #[test]
    fn test_month_metrics_empty_month() {
        let err = MonthMetrics::compute(&scenario(), YearMonth::new(2024, 6).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::EmptyDataset(_)));
    }

    #[test]
    fn test_filtered_purchases_never_exceed_total() {
        let dataset = Dataset::new(vec![
            line("10/01/2024 10:00", "1", "A", "Food", 1000),
            line("10/02/2024 10:00", "1", "B", "Food", 300),
            line("11/02/2024 10:00", "2", "C", "Drinks", 200),
            line("01/03/2024 10:00", "3", "D", "Food", 400),
        ]);
        let all = total_purchases(&dataset);
        for month in dataset.months() {
            assert!(total_purchases(&dataset.filter_month(month)) <= all);
        }
    }

    #[test]
    fn test_category_focus() {
        let focus = CategoryFocus::compute(&scenario(), "Food");
        assert_eq!(focus.rows, 2);
        assert_eq!(focus.total_spend_cents, 1500);
        assert_eq!(focus.purchases, 1);

        let unknown = CategoryFocus::compute(&scenario(), "Toys");
        assert_eq!(unknown.rows, 0);
        assert_eq!(unknown.total_spend_cents, 0);
    }
}
