use crate::core::Pipeline;
use crate::utils::error::{ConvertError, Result};

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Extract, transform and load once. The first error aborts the run.
    pub fn run(&self) -> Result<String> {
        tracing::info!("Starting conversion...");

        // Extract
        tracing::info!("Loading source data...");
        let raw_data = self.pipeline.extract()?;
        let extracted = raw_data.row_count();
        tracing::info!("Loaded {} rows", extracted);

        // Transform
        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data)?;
        if transformed.row_count() != extracted {
            return Err(ConvertError::ProcessingError {
                message: format!(
                    "transform changed the row count from {} to {}",
                    extracted,
                    transformed.row_count()
                ),
            });
        }
        tracing::info!("Transformed {} rows", transformed.row_count());

        // Load
        tracing::info!("Writing output...");
        let output_path = self.pipeline.load(transformed)?;

        Ok(output_path)
    }
}
