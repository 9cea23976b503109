use anyhow::Context;
use clap::Parser;
use profile_scraper::adapters::read_messages;
use profile_scraper::domain::model::IncomingProfile;
use profile_scraper::utils::{logger, validation::Validate};
use profile_scraper::{
    CliArgs, HttpPageFetcher, JsonlPublisher, OpenAiCompletionClient, ProfileExtractor,
    ProfileProcessor, ScraperConfig, ScraperEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting profile-scraper");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let mut config = match ScraperConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration '{}': {}", args.config, e);
            eprintln!("❌ {}", e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = Some(max_attempts);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let messages = read_messages(&args.input)
        .with_context(|| format!("failed to read input messages from '{}'", args.input))?;
    tracing::info!("📥 Read {} message(s)", messages.len());

    if args.dry_run {
        print_dry_run(&config, &messages);
        return Ok(());
    }

    let fetcher = HttpPageFetcher::from_config(&config).context("failed to build page fetcher")?;
    let backend =
        OpenAiCompletionClient::from_config(&config).context("failed to build completion client")?;
    let publisher = JsonlPublisher::new(config.output_path());
    let extractor = ProfileExtractor::new(backend, config.extractor_settings());
    let processor = ProfileProcessor::new(fetcher, extractor, publisher, config.processor_settings())
        .context("failed to build profile processor")?;

    let engine = ScraperEngine::new(processor, config.concurrent_messages());
    let summary = engine.run(messages).await;

    println!("✅ Processed {} message(s) in {:?}", summary.total(), summary.elapsed);
    println!("   👤 reviewers:           {}", summary.reviewers);
    println!("   📝 manual intervention: {}", summary.manual_interventions);
    println!("   💀 dead-lettered:       {}", summary.dead_lettered);
    println!("📁 Output saved to: {}", config.output_path());

    if summary.failed > 0 {
        eprintln!("❌ {} message(s) could not be published anywhere", summary.failed);
        std::process::exit(2);
    }

    Ok(())
}

fn print_dry_run(config: &ScraperConfig, messages: &[String]) {
    let decoded: Vec<IncomingProfile> = messages
        .iter()
        .filter_map(|raw| serde_json::from_str(raw).ok())
        .collect();
    let with_source = decoded.iter().filter(|profile| profile.has_source()).count();
    let sinks = config.sink_names();
    let retry = config.retry_policy();

    println!("🔍 Dry run: configuration is valid");
    println!("   completion model:   {}", config.completion.model);
    println!(
        "   retry:              {} attempt(s), {:?} backoff",
        retry.max_attempts, retry.backoff
    );
    println!(
        "   sinks:              {}, {}, {}",
        sinks.reviewers, sinks.manual_intervention, sinks.dead_letter
    );
    println!("   messages:           {}", messages.len());
    println!("   decodable:          {}", decoded.len());
    println!("   with url or html:   {}", with_source);
}
