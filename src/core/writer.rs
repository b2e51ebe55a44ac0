use crate::core::Dataset;
use crate::utils::error::{ConvertError, Result};
use anyhow::Context;
use csv::WriterBuilder;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `data` as comma-separated UTF-8 CSV with a header row and no BOM,
/// creating parent directories first. Columns are written in dataset order.
///
/// The rows go to a temporary file next to `path`, which then replaces
/// `path` in one rename; a failed run leaves any previous output untouched.
pub fn write_output<P: AsRef<Path>>(data: &Dataset, path: P) -> Result<()> {
    let path = path.as_ref();

    match write_csv(data, path) {
        Ok(()) => {
            tracing::info!("Output CSV successfully written to '{}'.", path.display());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Error writing output CSV to '{}': {:#}", path.display(), e);
            Err(ConvertError::WriteFailure {
                path: path.display().to_string(),
                message: format!("{:#}", e),
            })
        }
    }
}

fn write_csv(data: &Dataset, path: &Path) -> anyhow::Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory '{}'", parent.display()))?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in '{}'", dir.display()))?;

    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());

        writer.write_record(data.column_names())?;
        for row in data.rows() {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush().context("flushing output file")?;
    }

    // 暫存檔在 persist 失敗時會自動刪除
    tmp.persist(path).context("replacing output file")?;
    Ok(())
}
