use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::date_utils::{format_timestamp, YearMonth};

/// One purchased item on one receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketLineItem {
    pub timestamp: NaiveDateTime,
    pub ticket_id: String,
    pub location: Option<String>,
    pub item: String,
    pub category: String,
    pub price_cents: i64,
}

impl TicketLineItem {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.timestamp.date())
    }

    /// 0 = Monday .. 6 = Sunday.
    pub fn day_of_week(&self) -> usize {
        self.timestamp.weekday().num_days_from_monday() as usize
    }

    pub fn hour_of_day(&self) -> usize {
        self.timestamp.hour() as usize
    }

    pub fn timestamp_display(&self) -> String {
        format_timestamp(&self.timestamp)
    }

    pub fn price_display(&self) -> String {
        let abs_cents = self.price_cents.abs();
        let sign = if self.price_cents < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
    }
}
