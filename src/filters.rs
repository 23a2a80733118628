//! Money formatting for metric cards.
//!
//! Format: optional minus sign + currency symbol + number with thousands
//! separator and two decimals. Positive amounts carry no sign.

/// Currency and locale used to display amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    currency: String,
    locale: String,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self::new("EUR", "en-US")
    }
}

impl MoneyFormat {
    pub fn new(currency: &str, locale: &str) -> Self {
        Self {
            currency: currency.to_string(),
            locale: locale.to_string(),
        }
    }

    /// Format an amount in cents, e.g. `1800` -> `€18.00`.
    pub fn cents(&self, cents: i64) -> String {
        format_money(cents, &self.currency, &self.locale)
    }

    /// Format a fractional amount of cents (averages), rounded to the cent.
    pub fn average_cents(&self, cents: f64) -> String {
        self.cents(cents.round() as i64)
    }

    /// Format a plain number with two decimals using the locale's decimal separator.
    pub fn decimal(&self, value: f64) -> String {
        let (_, decimal_sep) = locale_separators(&self.locale);
        format!("{:.2}", value).replace('.', &decimal_sep.to_string())
    }
}

pub fn format_money(cents: i64, currency: &str, locale: &str) -> String {
    let is_negative = cents < 0;
    let abs_cents = cents.abs();
    let whole = abs_cents / 100;
    let fractional = abs_cents % 100;

    let (thousands_sep, decimal_sep) = locale_separators(locale);
    let whole_str = format_with_thousands(whole, thousands_sep);
    let symbol = currency_symbol(currency);

    let sign = if is_negative { "-" } else { "" };
    format!("{}{}{}{}{:02}", sign, symbol, whole_str, decimal_sep, fractional)
}

/// Get thousands and decimal separators based on locale.
fn locale_separators(locale: &str) -> (char, char) {
    match locale {
        "de-DE" | "de-AT" | "de-CH" | "fr-FR" | "fr-BE" | "fr-CA" | "es-ES" | "es-AR" | "it-IT"
        | "pt-BR" | "pt-PT" | "nl-NL" | "nl-BE" | "pl-PL" | "ru-RU" | "tr-TR" | "da-DK"
        | "nb-NO" | "sv-SE" | "fi-FI" => ('.', ','),
        _ => (',', '.'),
    }
}

fn format_with_thousands(n: i64, sep: char) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let s = n.to_string();
    let chars: Vec<char> = s.chars().rev().collect();
    let mut result = Vec::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(sep);
        }
        result.push(*c);
    }

    result.iter().rev().collect()
}

fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "EUR" => "\u{20ac}",
        "USD" => "$",
        "GBP" => "\u{00a3}",
        "JPY" => "\u{00a5}",
        "CHF" => "CHF\u{00a0}",
        "SEK" | "NOK" | "DKK" => "kr\u{00a0}",
        "PLN" => "z\u{0142}\u{00a0}",
        "MXN" => "MX$",
        "ARS" => "AR$",
        "BRL" => "R$",
        _ => "\u{20ac}",
    }
}
