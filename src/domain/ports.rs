use crate::domain::model::Dataset;
use crate::utils::error::Result;
use std::collections::HashMap;

/// Read-only view of the run configuration, handed to every stage.
pub trait ConfigProvider {
    fn source_csv_path(&self) -> &str;
    fn template_csv_path(&self) -> &str;
    fn output_csv_path(&self) -> &str;
    fn required_columns(&self) -> &[String];
    /// Source columns to load; `None` loads everything.
    fn source_subset(&self) -> Option<&[String]>;
    fn column_map(&self) -> &HashMap<String, String>;
    fn type_map(&self) -> &HashMap<String, String>;
    fn date_format(&self) -> &str;
    fn conform_to_template(&self) -> bool;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Dataset>;
    fn transform(&self, data: Dataset) -> Result<Dataset>;
    /// Returns the path the output was written to.
    fn load(&self, data: Dataset) -> Result<String>;
}
