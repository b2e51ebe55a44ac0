pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use config::ConvertConfig;
pub use crate::core::{
    etl::EtlEngine,
    loader::{load_header, load_source},
    pipeline::TemplatePipeline,
    transformer::transform,
    writer::write_output,
};
pub use domain::model::{Column, ColumnType, Dataset, Value};
pub use utils::error::{ConvertError, Result};
