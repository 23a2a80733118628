//! Turns the text of a supermarket receipt into ticket line items.
//!
//! Input is the plain text extracted from a receipt PDF. The parser looks for
//! the purchase timestamp, the simplified-invoice number, the store address
//! and every `NAME  1,23` product line.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::date_utils::{format_timestamp, parse_timestamp};
use crate::error::{AppError, AppResult};
use crate::models::TicketLineItem;
use crate::services::csv_loader::parse_price_cents;

pub const DEFAULT_CATEGORY: &str = "otros";

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}").expect("valid regex"));

static TICKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FACTURA SIMPLIFICADA:\s+([0-9\-]+)").expect("valid regex"));

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)MERCADONA,\s+S\.A\.[^\n]*\n(.*?)TEL[ÉE]FONO:").expect("valid regex")
});

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Z0-9ÁÉÍÓÚÑÜ][A-Z0-9ÁÉÍÓÚÑÜ /.%]*?)(?:\s+\d+,\d{2})?\s+(\d+,\d{2})\s*$")
        .expect("valid regex")
});

static NON_PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(TARJETA BANCARIA|TOTAL|SUBTOTAL|CREDITO)").expect("valid regex")
});

/// Keyword table, checked in order. The first category with a keyword
/// contained in the item name wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "fruta",
        &[
            "aguacate",
            "fresón",
            "nectarina",
            "paraguayo",
            "tomate",
            "pera rocha",
            "ciruela roja",
            "banana",
            "pera conferencia",
            "mezcla de frutos rojos",
        ],
    ),
    (
        "frutos secos",
        &["almendra", "anacardo", "nuez", "pasas sultanas", "cacahuete"],
    ),
    (
        "snacks",
        &[
            "patatas",
            "chocolate",
            "chicles",
            "cereales rellenos",
            "patatas lisas",
            "patatas chili lima",
            "nachos",
            "varitas frambuesa",
        ],
    ),
    (
        "panadería",
        &[
            "panecillo",
            "barra de pan",
            "barra rústica",
            "croqueta",
            "tortillas mexicanas",
            "chapata cristal",
            "pan m. 55% centeno",
            "pan viena redondo",
        ],
    ),
    (
        "lácteos",
        &[
            "leche",
            "yogur",
            "mantequilla",
            "queso",
            "cremoso",
            "stracciatella",
            "griego",
            "nata",
        ],
    ),
    (
        "bebidas y caldos",
        &[
            "caldo de pollo",
            "salsa de soja",
            "agua mineral",
            "soja calcio brick",
        ],
    ),
    (
        "verduras y legumbres",
        &[
            "garbanzo",
            "maíz",
            "ensalada",
            "cebolla",
            "pimiento",
            "champiñón",
            "calabacín",
            "zanahoria",
            "ajo",
            "brotes tiernos",
        ],
    ),
    (
        "carne",
        &[
            "jamoncitos",
            "burger",
            "chuleta",
            "lomo",
            "cuarto trasero",
            "pavo",
            "albóndigas",
            "longaniza",
            "gallina",
            "tacos",
            "paleta",
            "loncha",
        ],
    ),
    (
        "condimentos y salsas",
        &["ketchup", "azúcar", "harina", "sabor", "para freir"],
    ),
    (
        "despensa",
        &[
            "arroz",
            "macarrón",
            "mezcla de semillas",
            "harina",
            "pasta",
            "avena crunchy",
            "arroz largo",
        ],
    ),
    (
        "conservas",
        &["atún", "tomate triturado", "aceitunas", "pepinillo"],
    ),
    (
        "platos preparados",
        &["hummus", "preparado andaluz", "ensaladilla rusa"],
    ),
    (
        "otros",
        &[
            "huevos frescos",
            "estropajo",
            "toall.bebe",
            "dermo",
            "gamuza atrapapolvo",
            "rollo hogar doble",
            "lavavajillas",
            "colg. triple",
            "gel crema",
        ],
    ),
];

/// A parsed receipt: header fields plus its product lines.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub timestamp: String,
    pub ticket_id: String,
    pub location: Option<String>,
    pub items: Vec<TicketLineItem>,
}

/// Pick a category for an item name from the keyword table.
pub fn categorize_item(item: &str) -> &'static str {
    let normalized = normalize_item_name(item);

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Lowercase and keep only letters, whitespace and the punctuation used by
/// the keyword table.
///
/// Accented letters are kept on purpose so keywords such as `fresón` or
/// `champiñón` match; stripping them to ASCII would send those items to
/// [`DEFAULT_CATEGORY`].
fn normalize_item_name(item: &str) -> String {
    item.chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '.' | '%'))
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Store address between the company line and the phone number.
pub fn extract_location(text: &str) -> Option<String> {
    LOCATION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
}

pub fn parse_receipt(text: &str) -> AppResult<Receipt> {
    trace!(text_len = text.len(), "Parsing receipt text");

    let timestamp_raw = TIMESTAMP_RE
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| AppError::Validation("No purchase date found in receipt".into()))?;
    let timestamp = parse_timestamp(timestamp_raw).map_err(|e| {
        AppError::Validation(format!("Invalid receipt date '{}': {}", timestamp_raw, e))
    })?;

    let ticket_id = TICKET_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AppError::Validation("No ticket identifier found in receipt".into()))?;

    let location = extract_location(text);

    let mut items = Vec::new();
    for line in text.lines().filter(|l| !NON_PRODUCT_RE.is_match(l)) {
        let Some(caps) = ITEM_RE.captures(line) else {
            continue;
        };
        let name = caps[1].trim().to_string();
        let Some(price_cents) = parse_price_cents(&caps[2]) else {
            continue;
        };

        items.push(TicketLineItem {
            timestamp,
            ticket_id: ticket_id.clone(),
            location: location.clone(),
            category: categorize_item(&name).to_string(),
            item: name,
            price_cents,
        });
    }

    debug!(ticket_id = %ticket_id, item_count = items.len(), "Receipt parsed");

    Ok(Receipt {
        timestamp: format_timestamp(&timestamp),
        ticket_id,
        location,
        items,
    })
}

/// Write line items as a CSV the loader accepts.
pub fn write_csv<W: std::io::Write>(items: &[TicketLineItem], writer: W) -> AppResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let to_internal = |e: csv::Error| AppError::Internal(format!("CSV write error: {}", e));

    csv_writer
        .write_record(["timestamp", "ticket_id", "location", "item", "category", "price"])
        .map_err(to_internal)?;

    for item in items {
        csv_writer
            .write_record([
                item.timestamp_display().as_str(),
                item.ticket_id.as_str(),
                item.location.as_deref().unwrap_or(""),
                item.item.as_str(),
                item.category.as_str(),
                item.price_display().as_str(),
            ])
            .map_err(to_internal)?;
    }

    csv_writer.flush()?;
    Ok(())
}
