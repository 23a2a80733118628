pub mod charts;
pub mod csv_loader;
pub mod dashboard;
pub mod metrics;
pub mod receipt_parser;
