use std::env;
use std::path::PathBuf;

use crate::filters::MoneyFormat;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub csv_path: PathBuf,
    pub currency: String,
    pub locale: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: env::var("MERCADATA_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("MERCADATA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8501),
            csv_path: env::var("MERCADATA_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/mercadata.csv")),
            currency: env::var("MERCADATA_CURRENCY")
                .ok()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "EUR".into()),
            locale: env::var("MERCADATA_LOCALE")
                .ok()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| "en-US".into()),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat::new(&self.currency, &self.locale)
    }
}
