#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::ConvertConfig;

/// Columns required by the TurboTax custom CSV template, in template order.
pub const TURBOTAX_COLUMNS: [&str; 13] = [
    "Date",
    "Type",
    "Sent Asset",
    "Sent Amount",
    "Received Asset",
    "Received Amount",
    "Fee Asset",
    "Fee Amount",
    "Market Value Currency",
    "Market Value",
    "Description",
    "Transaction Hash",
    "Transaction ID",
];

// Field names used in diagnostics, matching the TOML keys.
pub const SOURCE_CSV_FIELD: &str = "paths.source_csv";
pub const TEMPLATE_CSV_FIELD: &str = "paths.template_csv";
pub const OUTPUT_CSV_FIELD: &str = "paths.output_csv";
