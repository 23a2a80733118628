use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use tracing::{debug, trace, warn};

use crate::date_utils::parse_timestamp;
use crate::error::{AppError, AppResult, LoadError};
use crate::models::{Dataset, TicketLineItem};

const TIMESTAMP_HEADERS: &[&str] = &["timestamp", "fecha"];
const TICKET_HEADERS: &[&str] = &["ticket_id", "ticket", "identificativo de ticket"];
const ITEM_HEADERS: &[&str] = &["item"];
const CATEGORY_HEADERS: &[&str] = &["category", "categoría", "categoria"];
const PRICE_HEADERS: &[&str] = &["price", "precio"];
const LOCATION_HEADERS: &[&str] = &["location", "ubicación", "ubicacion"];

/// Load the ticket CSV at `path`.
///
/// A missing file is [`AppError::NotFound`]; anything wrong with the content
/// is [`AppError::Load`].
pub fn load_csv(path: &Path) -> AppResult<Dataset> {
    if !path.exists() {
        warn!(path = %path.display(), "CSV file not found");
        return Err(AppError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read(path)?;
    let dataset = parse_csv(&content).inspect_err(|e| {
        warn!(path = %path.display(), error = %e, "Failed to load CSV");
    })?;

    debug!(path = %path.display(), rows = dataset.len(), "Loaded dataset");
    Ok(dataset)
}

/// Parse ticket rows from CSV bytes. The first failing row aborts the parse.
pub fn parse_csv(content: &[u8]) -> Result<Dataset, LoadError> {
    trace!(content_size = content.len(), "Starting CSV parsing");

    let content_str = std::str::from_utf8(content)?;
    let content_str = content_str.strip_prefix('\u{feff}').unwrap_or(content_str);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content_str.as_bytes());

    let headers = reader.headers()?.clone();
    debug!(column_count = headers.len(), "CSV headers parsed");

    let timestamp_col =
        find_column(&headers, TIMESTAMP_HEADERS).ok_or(LoadError::MissingColumn("timestamp"))?;
    let ticket_col =
        find_column(&headers, TICKET_HEADERS).ok_or(LoadError::MissingColumn("ticket"))?;
    let item_col = find_column(&headers, ITEM_HEADERS).ok_or(LoadError::MissingColumn("item"))?;
    let category_col =
        find_column(&headers, CATEGORY_HEADERS).ok_or(LoadError::MissingColumn("category"))?;
    let price_col =
        find_column(&headers, PRICE_HEADERS).ok_or(LoadError::MissingColumn("price"))?;
    let location_col = find_column(&headers, LOCATION_HEADERS);

    let mut items = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 2;
        let record = result?;

        let timestamp_raw = required_field(&record, timestamp_col, row, "timestamp")?;
        let timestamp = parse_timestamp(timestamp_raw).map_err(|source| LoadError::Timestamp {
            row,
            value: timestamp_raw.to_string(),
            source,
        })?;

        let ticket_id = required_field(&record, ticket_col, row, "ticket")?.to_string();
        let item = required_field(&record, item_col, row, "item")?.to_string();
        let category = required_field(&record, category_col, row, "category")?.to_string();

        let price_raw = required_field(&record, price_col, row, "price")?;
        let price_cents = parse_price_cents(price_raw).ok_or_else(|| LoadError::Price {
            row,
            value: price_raw.to_string(),
        })?;

        let location = location_col
            .and_then(|col| record.get(col))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        items.push(TicketLineItem {
            timestamp,
            ticket_id,
            location,
            item,
            category,
            price_cents,
        });
    }

    debug!(row_count = items.len(), "CSV parsing completed");
    Ok(Dataset::new(items))
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim().trim_start_matches('\u{feff}').to_lowercase();
        names.iter().any(|name| header == *name)
    })
}

fn required_field<'r>(
    record: &'r csv::StringRecord,
    col: usize,
    row: usize,
    field: &'static str,
) -> Result<&'r str, LoadError> {
    record
        .get(col)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(LoadError::MissingField { row, field })
}

/// Largest absolute price accepted for one line, in cents. Keeps every
/// aggregate comfortably inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

const CURRENCY_SYMBOLS: &[&str] = &["EUR", "€", "$", "£"];

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])?(\d+)(?:[.,](\d{1,2}))?$").expect("valid regex"));

/// Parse a decimal price into cents.
///
/// The whole field must be a number: optional sign, digits, and at most one
/// `.` or `,` followed by one or two decimals. A single currency symbol may
/// lead or trail the number. Anything else, or a magnitude above
/// [`MAX_PRICE_CENTS`], is rejected.
pub fn parse_price_cents(raw: &str) -> Option<i64> {
    let number = strip_currency(raw.trim());
    let caps = PRICE_RE.captures(number)?;

    let units: i64 = caps[2].parse().ok()?;
    let fraction = match caps.get(3).map(|m| m.as_str()) {
        Some(d) if d.len() == 1 => d.parse::<i64>().ok()? * 10,
        Some(d) => d.parse::<i64>().ok()?,
        None => 0,
    };

    let cents = units.checked_mul(100)?.checked_add(fraction)?;
    if cents > MAX_PRICE_CENTS {
        return None;
    }

    match caps.get(1).map(|m| m.as_str()) {
        Some("-") => Some(-cents),
        _ => Some(cents),
    }
}

fn strip_currency(value: &str) -> &str {
    for symbol in CURRENCY_SYMBOLS {
        if let Some(rest) = value.strip_prefix(symbol) {
            return rest.trim_start();
        }
        if let Some(rest) = value.strip_suffix(symbol) {
            return rest.trim_end();
        }
    }
    value
}
