use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use engine_logging::{engine_error, engine_info, engine_warn};
use wiper_core::{RunParams, RunState, StrategyKind};
use wiper_engine::{
    wait_for_login, write_report, ChannelProgressSink, ChromeSession, MessageLocator, Page,
    RunController, RunReport, Scope, SelectorResolver, SnapshotPage,
};

use super::config::{self, AppConfig};
use super::logging;
use super::progress;
use super::prompt::{self, Prompter};
use crate::cli::Cli;

const GRACE_PERIOD: Duration = Duration::from_secs(10);

enum Completion {
    Declined,
    Finished,
}

pub async fn run_app(cli: Cli) -> anyhow::Result<()> {
    let mut config = config::load_config(cli.config.as_deref())?;
    if cli.headless {
        config.headless = true;
    }
    if cli.dump_config {
        print!("{}", config::dump_config(&config)?);
        return Ok(());
    }

    logging::initialize(cli.log.into(), cli.verbose);
    let resolver = SelectorResolver::new(config.selectors.clone());

    if let Some(snapshot) = &cli.snapshot {
        return rehearse(snapshot, resolver).await;
    }

    let session = ChromeSession::launch(&config.launch_settings())
        .await
        .context("failed to start the browser")?;

    let result = drive(&cli, &config, resolver, session.page()).await;
    match &result {
        Ok(Completion::Finished) if !config.headless => {
            println!(
                "Browser will remain open for {} seconds...",
                GRACE_PERIOD.as_secs()
            );
            tokio::time::sleep(GRACE_PERIOD).await;
        }
        Ok(_) => {}
        Err(err) => engine_error!("Run failed: {:#}", err),
    }
    session.close().await;
    result.map(|_| ())
}

async fn drive(
    cli: &Cli,
    config: &AppConfig,
    resolver: SelectorResolver,
    page: &dyn Page,
) -> anyhow::Result<Completion> {
    println!("Log in to Discord in the browser window if you are not logged in yet.");
    wait_for_login(page, &resolver, config.login_wait(), &config.settle).await?;

    let mut prompter = prompt::stdio();
    let params = gather_params(cli, &mut prompter)?;
    let controller = RunController::from_params(&params, resolver, config.settle)?;

    if !params.auto_confirm
        && !prompter.confirm("This will WIPE and DELETE your messages. Continue?")?
    {
        println!("Cancelled.");
        return Ok(Completion::Declined);
    }

    let (tx, rx) = mpsc::channel();
    let renderer = progress::spawn_renderer(rx, params.limit());
    let outcome = {
        let sink = ChannelProgressSink::new(tx);
        controller.run(page, &sink).await
    };
    finish_renderer(renderer);
    let outcome = outcome?;

    if let Some(path) = &cli.report {
        let report = RunReport {
            generated_utc: Utc::now().to_rfc3339(),
            summary: outcome.summary,
            messages: &outcome.reports,
        };
        let written = write_report(path, &report)?;
        engine_info!("Report written to {:?}", written);
    }

    println!(
        "Complete! Processed {} messages ({} failed).",
        outcome.summary.processed, outcome.summary.failed
    );
    Ok(Completion::Finished)
}

/// Wait for the progress line to finish drawing. Returns false if it panicked.
fn finish_renderer(renderer: JoinHandle<()>) -> bool {
    match renderer.join() {
        Ok(()) => true,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            engine_warn!("Progress renderer panicked: {}", reason);
            false
        }
    }
}

/// Fill in what the command line left out. `--yes` disables every prompt.
fn gather_params<R: BufRead, W: Write>(
    cli: &Cli,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<RunParams> {
    let mut params = RunParams {
        mode: cli.mode.into(),
        target: cli.channel.clone(),
        server: cli.server.clone(),
        author: cli.author.clone(),
        limit: cli.limit.unwrap_or(0),
        auto_confirm: cli.yes,
        max_attempts: cli.max_attempts,
    };
    if cli.yes {
        params.validate()?;
        return Ok(params);
    }

    match params.mode {
        StrategyKind::Scan => {
            if params.target.is_none() {
                params.target = prompter
                    .ask_optional("Enter channel URL (or press Enter to use current page):")?;
            }
        }
        StrategyKind::Search => {
            if params.server.is_none() {
                params.server = prompter.ask_optional("Enter server URL:")?;
            }
            if params.author.is_none() {
                params.author = prompter.ask_optional("Author to search for:")?;
            }
        }
    }
    if cli.limit.is_none() {
        params.limit = prompter.ask_count("Max messages to delete (0 for unlimited):")?;
    }
    params.validate()?;
    Ok(params)
}

/// Run the Locator once against a saved page and list what it would process.
async fn rehearse(path: &Path, resolver: SelectorResolver) -> anyhow::Result<()> {
    let page = SnapshotPage::from_file(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let run = RunState::new(StrategyKind::Scan, 0, 0);
    let candidates = MessageLocator::new(resolver)
        .find_candidates(&page, Scope::Document, &run)
        .await?;

    println!(
        "{} candidate message(s) in {}",
        candidates.len(),
        path.display()
    );
    for candidate in &candidates {
        println!("  {}", candidate.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use wiper_core::ParamsError;

    use super::*;

    fn params_for(args: &[&str], answers: &str) -> anyhow::Result<RunParams> {
        let cli = Cli::try_parse_from(std::iter::once("wiper").chain(args.iter().copied()))?;
        let mut prompter = Prompter::new(answers.as_bytes(), Vec::new());
        gather_params(&cli, &mut prompter)
    }

    #[test]
    fn scan_prompts_for_channel_and_limit() {
        let params = params_for(&[], "https://discord.com/channels/1/2\n5\n").unwrap();
        assert_eq!(params.target.as_deref(), Some("https://discord.com/channels/1/2"));
        assert_eq!(params.limit, 5);
        assert!(!params.auto_confirm);
    }

    #[test]
    fn blank_channel_keeps_the_current_page() {
        let params = params_for(&["--limit", "0"], "\n").unwrap();
        assert_eq!(params.target, None);
        assert_eq!(params.limit(), None);
    }

    #[test]
    fn yes_skips_prompts() {
        let params = params_for(&["--yes"], "").unwrap();
        assert_eq!(params.target, None);
        assert_eq!(params.limit, 0);
        assert!(params.auto_confirm);
    }

    #[test]
    fn search_without_author_is_rejected() {
        let err = params_for(
            &["--mode", "search", "--server", "https://discord.com/channels/1", "--yes"],
            "",
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ParamsError>(),
            Some(&ParamsError::MissingAuthor)
        );
    }

    #[test]
    fn renderer_panic_is_reported() {
        let panicked = std::thread::spawn(|| panic!("terminal went away"));
        assert!(!finish_renderer(panicked));
        assert!(finish_renderer(std::thread::spawn(|| {})));
    }

    #[tokio::test]
    async fn rehearsal_reads_a_saved_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<li id="chat-messages-9"><div class="buttonContainer-x"></div></li>"#
        )
        .unwrap();
        let resolver = SelectorResolver::new(AppConfig::default().selectors);
        rehearse(file.path(), resolver).await.unwrap();
    }
}
