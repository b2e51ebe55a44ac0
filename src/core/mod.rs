pub mod etl;
pub mod loader;
pub mod pipeline;
pub mod transformer;
pub mod writer;

pub use crate::domain::model::{Column, ColumnType, Dataset, Value};
pub use crate::domain::ports::{ConfigProvider, Pipeline};
pub use crate::utils::error::Result;
