use checkjudge_core::config::{JudgeProvider, RunConfig};
use checkjudge_core::ConfigError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "checkjudge",
    version,
    about = "Checklist evaluation of generated articles with an LLM judge"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate every input file against its checklist (resumes unfinished work)
    Run(RunArgs),
    /// Re-aggregate statistics from existing result files without calling the judge
    Stats(StatsArgs),
}

#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// YAML config file; flags override its values
    #[arg(long, env = "CHECKJUDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub input_folder: Option<PathBuf>,

    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    #[arg(long)]
    pub checklist_file: Option<PathBuf>,

    /// Upper bound on in-flight judge calls across the whole run
    #[arg(long)]
    pub max_concurrent_requests: Option<usize>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Retries after the first attempt
    #[arg(long)]
    pub max_retries: Option<u32>,

    #[arg(long)]
    pub backoff_base_ms: Option<u64>,

    /// Randomize backoff delays by ±10%
    #[arg(long)]
    pub jitter: bool,

    /// judge provider (openai|fake)
    #[arg(long)]
    pub judge: Option<String>,

    /// Verdict answered by the fake judge
    #[arg(long, value_parser = ["yes", "no"])]
    pub fake_verdict: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,
}

impl RunArgs {
    /// Overlay explicitly given flags on a loaded config.
    pub fn apply(&self, cfg: &mut RunConfig) -> Result<(), ConfigError> {
        if let Some(v) = &self.input_folder {
            cfg.input_folder = v.clone();
        }
        if let Some(v) = &self.output_folder {
            cfg.output_folder = v.clone();
        }
        if let Some(v) = &self.checklist_file {
            cfg.checklist_file = v.clone();
        }
        if let Some(v) = self.max_concurrent_requests {
            cfg.max_concurrent_requests = v;
        }
        if let Some(v) = self.request_timeout {
            cfg.request_timeout_secs = v;
        }
        if let Some(v) = self.max_retries {
            cfg.max_retries = v;
        }
        if let Some(v) = self.backoff_base_ms {
            cfg.backoff_base_ms = v;
        }
        if self.jitter {
            cfg.jitter = true;
        }
        if let Some(v) = &self.judge {
            cfg.judge.provider = JudgeProvider::parse(v)?;
        }
        if let Some(v) = &self.fake_verdict {
            cfg.judge.fake_verdict = v == "yes";
        }
        if let Some(v) = &self.model {
            cfg.judge.model = v.clone();
        }
        if let Some(v) = &self.api_key {
            cfg.judge.api_key = Some(v.clone());
        }
        if let Some(v) = &self.base_url {
            cfg.judge.base_url = v.clone();
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, default_value = "./evaluation_checklist_results")]
    pub output_folder: PathBuf,

    /// File name prefix of result files
    #[arg(long, default_value = "eval_")]
    pub prefix: String,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::try_parse_from([
            "checkjudge",
            "run",
            "--max-concurrent-requests",
            "3",
            "--request-timeout",
            "30",
            "--judge",
            "fake",
            "--fake-verdict",
            "no",
        ])
        .unwrap();
        let Command::Run(args) = cli.cmd else {
            panic!("expected run");
        };
        let mut cfg = RunConfig {
            max_retries: 7,
            ..Default::default()
        };
        args.apply(&mut cfg).unwrap();
        assert_eq!(cfg.max_concurrent_requests, 3);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.max_retries, 7, "unset flags leave config alone");
        assert_eq!(cfg.judge.provider, JudgeProvider::Fake);
        assert!(!cfg.judge.fake_verdict);
    }

    #[test]
    fn unknown_judge_is_a_config_error() {
        let args = RunArgs {
            judge: Some("claude".into()),
            ..Default::default()
        };
        let err = args.apply(&mut RunConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(_)));
    }
}
