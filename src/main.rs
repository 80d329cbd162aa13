use anyhow::Context;
use clap::Parser;
use sitecheck::app::{prompt, scheduler};
use sitecheck::utils::{logger, validation::Validate};
use sitecheck::{CliConfig, LogFormat, ProbeEngine, ProbeSettings, SiteChecker, SystemNetwork};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    match config.log_format {
        LogFormat::Text => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(config.verbose),
    }

    tracing::info!("Starting sitecheck");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let settings = match &config.config {
        Some(path) => ProbeSettings::from_file(path)
            .with_context(|| format!("failed to load settings from '{}'", path))?,
        None => ProbeSettings::default(),
    };
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Probe settings are invalid: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 命令列沒提供的值改用互動提示
    let answers = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        prompt::collect(
            &mut input,
            &mut output,
            config.file.clone(),
            config.ignore_errors,
            config.yield_errors,
        )
        .context("failed to read interactive answers")?
    };
    tracing::info!(
        "Worker created for {} (ignore errors: {}, print errors: {})",
        answers.filename,
        answers.policy.ignore_errors,
        answers.policy.yield_errors
    );

    let network = SystemNetwork::new(&settings).context("failed to build network clients")?;
    let engine = ProbeEngine::new(network, &settings);
    let checker = SiteChecker::new(&answers.filename, answers.policy, engine);

    if config.once {
        let report = scheduler::run_and_report(&checker, config.log_format).await;
        let code = scheduler::exit_code(&report);
        if code > 0 {
            std::process::exit(code);
        }
        return Ok(());
    }

    match scheduler::run_every(&checker, Duration::from_secs(config.interval_secs), config.log_format).await {
        scheduler::ScheduleEnd::Interrupted => Ok(()),
        scheduler::ScheduleEnd::Terminated(code) => std::process::exit(code),
    }
}
