use crate::config::ConvertConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "coinvert")]
#[command(about = "Convert an exchange transaction export into a TurboTax custom CSV")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override paths.source_csv
    #[arg(long)]
    pub source: Option<String>,

    /// Override paths.template_csv
    #[arg(long)]
    pub template: Option<String>,

    /// Override paths.output_csv
    #[arg(long)]
    pub output: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,

    /// Dry run - show what would be converted without touching any file
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub const DEFAULT_CONFIG: &str = "coinvert.toml";

    /// 應用命令列覆蓋設定
    pub fn apply_overrides(&self, config: &mut ConvertConfig) {
        if let Some(source) = &self.source {
            config.paths.source_csv = source.clone();
        }
        if let Some(template) = &self.template {
            config.paths.template_csv = template.clone();
        }
        if let Some(output) = &self.output {
            config.paths.output_csv = output.clone();
        }
    }
}
