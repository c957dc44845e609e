use crate::cli::args::RunArgs;
use crate::exit_codes;
use checkjudge_core::config::RunConfig;
use checkjudge_core::engine::Orchestrator;
use checkjudge_core::report::console::{console_progress_sink, print_summary};
use checkjudge_core::report::summary::{write_summary, RunSummary, SUMMARY_FILE};
use checkjudge_core::{ConfigError, DatasetError};
use tracing::{info, warn};

fn resolve_config(args: &RunArgs) -> Result<RunConfig, ConfigError> {
    let mut cfg = RunConfig::load(args.config.as_deref())?;
    args.apply(&mut cfg)?;
    cfg.validate()?;
    Ok(cfg)
}

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = match resolve_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config error: {e}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let orchestrator = match Orchestrator::from_config(&cfg) {
        Ok(o) => o.with_progress(console_progress_sink(&cfg)),
        Err(e) => {
            eprintln!("config error: {e}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    info!(
        input = %cfg.input_folder.display(),
        output = %cfg.output_folder.display(),
        checklist = %cfg.checklist_file.display(),
        provider = ?cfg.judge.provider,
        model = %orchestrator.model_name(),
        max_concurrent_requests = cfg.max_concurrent_requests,
        request_timeout_secs = cfg.request_timeout_secs,
        max_retries = cfg.max_retries,
        "starting evaluation run"
    );

    let stats = match orchestrator.run(&cfg).await {
        Ok(stats) => stats,
        Err(e) if e.downcast_ref::<DatasetError>().is_some() => {
            eprintln!("config error: {e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::NO_FILES_PROCESSED);
        }
    };

    print_summary(&stats);
    let summary = RunSummary::finished_now(&stats, orchestrator.model_name());
    let summary_path = cfg.output_folder.join(SUMMARY_FILE);
    if let Err(e) = write_summary(&summary, &summary_path) {
        warn!(path = %summary_path.display(), error = %format!("{e:#}"), "could not write run summary");
    }

    if stats.files_processed == 0 {
        eprintln!("no input files were processed");
        return Ok(exit_codes::NO_FILES_PROCESSED);
    }
    Ok(exit_codes::SUCCESS)
}
