use clap::Parser;
use row_nest::config::CliArgs;
use row_nest::core::ConfigProvider;
use row_nest::utils::error::ErrorSeverity;
use row_nest::utils::{logger, validation::Validate};
use row_nest::{FilePipeline, LocalStorage, MappingDefinition, NestConfig, NestEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose, args.log_format);

    tracing::info!("🚀 Starting row-nest");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match NestConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    args.apply_to(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        display_config_summary(&config)?;
        return Ok(());
    }

    let storage = LocalStorage::new(".".to_string());
    let pipeline = FilePipeline::new(storage, config)?;
    let engine = NestEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Conversion completed successfully!");
            println!("✅ Output saved to: {}", output_path);
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
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &NestConfig) -> anyhow::Result<()> {
    println!("🔍 DRY RUN - nothing will be converted");
    println!("  input:  {} ({})", config.input_path(), config.input_format().as_str());
    println!("  output: {}", config.output_path());
    println!(
        "  strict collection: {}",
        config.convert_options().strict_collection
    );
    let depth = config
        .mappings()
        .iter()
        .map(MappingDefinition::depth)
        .max()
        .unwrap_or(0);
    println!("  mappings ({} levels deep):", depth);
    println!("{}", serde_json::to_string_pretty(config.mappings())?);
    Ok(())
}
