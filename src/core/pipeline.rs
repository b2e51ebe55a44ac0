use crate::core::loader::{load_header, load_source};
use crate::core::transformer;
use crate::core::writer::write_output;
use crate::core::{ConfigProvider, Dataset, Pipeline};
use crate::utils::error::Result;

/// Source CSV in, TurboTax-template-shaped CSV out.
pub struct TemplatePipeline<C: ConfigProvider> {
    config: C,
}

impl<C: ConfigProvider> TemplatePipeline<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Template header, falling back to the configured required columns when
    /// the template file has no header at all.
    fn output_schema(&self) -> Result<Vec<String>> {
        let header = load_header(self.config.template_csv_path())?;
        let required = self.config.required_columns();

        if header.is_empty() {
            tracing::warn!(
                "Template '{}' has no header row, using columns.required instead",
                self.config.template_csv_path()
            );
            return Ok(required.to_vec());
        }

        if header != required {
            tracing::warn!(
                "Template header differs from columns.required; the template wins. Template: [{}]",
                header.join(", ")
            );
        }

        Ok(header)
    }
}

impl<C: ConfigProvider> Pipeline for TemplatePipeline<C> {
    fn extract(&self) -> Result<Dataset> {
        tracing::debug!("Reading source CSV: {}", self.config.source_csv_path());
        load_source(self.config.source_csv_path(), self.config.source_subset())
    }

    fn transform(&self, data: Dataset) -> Result<Dataset> {
        transformer::transform(data, &self.config)
    }

    fn load(&self, data: Dataset) -> Result<String> {
        let schema = self.output_schema()?;
        let output_path = self.config.output_csv_path();

        let data = if self.config.conform_to_template() {
            let missing = data.missing_columns(&schema);
            if !missing.is_empty() {
                tracing::warn!(
                    "No source data for template columns (left empty): {}",
                    missing.join(", ")
                );
            }
            let dropped: Vec<&str> = data
                .column_names()
                .into_iter()
                .filter(|c| !schema.iter().any(|s| s == c))
                .collect();
            if !dropped.is_empty() {
                tracing::debug!("Columns not in template, dropped: {}", dropped.join(", "));
            }
            data.conform_to(&schema)?
        } else {
            tracing::debug!("output.conform_to_template is off, writing columns as-is");
            data
        };

        write_output(&data, output_path)?;
        Ok(output_path.to_string())
    }
}
