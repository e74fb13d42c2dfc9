use anyhow::Context;
use clap::Parser;
use person_month_alloc::core::loader::load_records;
use person_month_alloc::core::{ConfigProvider, Pipeline};
use person_month_alloc::utils::error::ErrorSeverity;
use person_month_alloc::utils::{logger, validation::Validate};
use person_month_alloc::{AllocationEngine, AllocationPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-alloc")]
#[command(about = "Person-month allocation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "allocation.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override the yearly capacity from config
    #[arg(long)]
    capacity: Option<u32>,

    /// Override the ZIP bundling setting from config
    #[arg(long)]
    zip: Option<bool>,

    /// Dry run - parse the input and show what would be allocated without writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based allocation");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 套用命令列覆蓋設定
    if let Some(capacity) = args.capacity {
        config.allocation.capacity_per_year = Some(capacity);
        tracing::info!("🔧 Capacity overridden to: {}", capacity);
    }
    if let Some(zip) = args.zip {
        let compression = config
            .output
            .compression
            .get_or_insert(person_month_alloc::config::toml_config::CompressionConfig {
                enabled: zip,
                filename: None,
            });
        compression.enabled = zip;
        tracing::info!("🔧 ZIP bundling overridden to: {}", zip);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    let storage = LocalStorage::new(config.output_path().to_string());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        let pipeline = AllocationPipeline::new(storage, config);
        perform_dry_run(&pipeline).await?;
        return Ok(());
    }

    let pipeline = AllocationPipeline::new(storage, config);
    let engine = AllocationEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Allocation completed successfully!");
            println!("{}", outcome.summary);
            println!("📁 Output saved to: {}", outcome.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Allocation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Allocation: {}", config.name());
    println!("  Input: {}", config.input_path());
    println!(
        "  Columns: {} / {}",
        config.period_column(),
        config.units_column()
    );
    println!("  Capacity per year: {}", config.capacity_per_year());

    let committed = config.committed_units();
    if !committed.is_empty() {
        for (year, units) in &committed {
            println!("  Committed {}: {}", year, units);
        }
    }

    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    if let Some(filename) = config.compression_filename() {
        println!("  Compression: {} (ZIP)", filename);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run<P: Pipeline>(pipeline: &P) -> anyhow::Result<()> {
    let rows = pipeline
        .extract()
        .await
        .context("failed to read the input table")?;
    let loaded = load_records(&rows).context("failed to load records")?;

    println!("🔍 Dry Run Analysis:");
    println!("  Rows read: {}", rows.len());
    println!("  Records: {}", loaded.records.len());
    println!("  Skipped rows: {}", loaded.skipped.len());
    for skipped in &loaded.skipped {
        println!("    row {}: {}", skipped.row_number, skipped.reason);
    }

    if let (Some(first), Some(last)) = (loaded.months.first(), loaded.months.last()) {
        println!("  Months referenced: {} ({} .. {})", loaded.months.len(), first, last);
    }

    println!();
    println!("  Allocation order (narrowest window first):");
    let mut order: Vec<_> = loaded.records.iter().collect();
    order.sort_by_key(|record| record.eligible_months.len());
    for record in order {
        println!(
            "    Project {}: {} -> {} units over {} months ({:.2}/month)",
            record.id,
            record.period_label,
            record.requested_units,
            record.eligible_months.len(),
            record.units_per_month_ratio
        );
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
