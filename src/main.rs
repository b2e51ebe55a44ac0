use clap::Parser;
use coinvert::core::ConfigProvider;
use coinvert::utils::{logger, validation::Validate};
use coinvert::{CliArgs, ConvertConfig, EtlEngine, TemplatePipeline};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting coinvert");

    // 載入 TOML 配置
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    args.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be read or written");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let engine = EtlEngine::new(TemplatePipeline::new(config));

    match engine.run() {
        Ok(output_path) => {
            tracing::info!("✅ Conversion completed successfully!");
            println!("✅ Conversion completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}

/// An explicit `--config` must load; the default file is optional.
fn load_config(args: &CliArgs) -> coinvert::Result<ConvertConfig> {
    match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            ConvertConfig::from_file(path)
        }
        None if Path::new(CliArgs::DEFAULT_CONFIG).exists() => {
            tracing::info!(
                "📁 Loading configuration from: {}",
                CliArgs::DEFAULT_CONFIG
            );
            ConvertConfig::from_file(CliArgs::DEFAULT_CONFIG)
        }
        None => {
            tracing::warn!(
                "⚠️ {} not found, using built-in defaults",
                CliArgs::DEFAULT_CONFIG
            );
            Ok(ConvertConfig::default())
        }
    }
}

fn display_config_summary(config: &ConvertConfig, args: &CliArgs) {
    println!("📋 Configuration Summary:");
    println!("  Source: {}", config.source_csv_path());
    println!("  Template: {}", config.template_csv_path());
    println!("  Output: {}", config.output_csv_path());
    println!(
        "  Date format: {}",
        if config.date_format().is_empty() {
            "(inferred)"
        } else {
            config.date_format()
        }
    );
    println!(
        "  Column renames: {}, type mappings: {}",
        config.column_map().len(),
        config.type_map().len()
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &ConvertConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("🔄 Column Mapping:");
    let mut renames: Vec<_> = config.column_map().iter().collect();
    renames.sort();
    for (from, to) in renames {
        println!("  {} -> {}", from, to);
    }

    println!();
    println!("🏷️ Type Mapping (unmapped -> Unknown):");
    let mut types: Vec<_> = config.type_map().iter().collect();
    types.sort();
    for (from, to) in types {
        println!("  {} -> {}", from, to);
    }

    println!();
    println!("💾 Required Output Columns:");
    println!("  {}", config.required_columns().join(", "));
    if let Some(subset) = config.source_subset() {
        println!("  Source columns loaded: {}", subset.join(", "));
    }
    println!("  Conform to template: {}", config.conform_to_template());

    println!();
    println!("📝 Effective configuration:");
    println!("{}", config.to_toml_string()?);

    println!("✅ Dry run analysis complete.");
    Ok(())
}
