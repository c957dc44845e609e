use crate::cli::args::StatsArgs;
use crate::exit_codes;
use checkjudge_core::report::console::print_summary;
use checkjudge_core::report::summary::{collect_statistics, RunSummary};

pub async fn run(args: StatsArgs) -> anyhow::Result<i32> {
    let stats = match collect_statistics(&args.output_folder, &args.prefix).await {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::NO_FILES_PROCESSED);
        }
    };

    if args.json {
        let summary = RunSummary::finished_now(&stats, "");
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&stats);
    }

    if stats.files_processed == 0 {
        eprintln!(
            "no result files matching {}*.jsonl in {}",
            args.prefix,
            args.output_folder.display()
        );
        return Ok(exit_codes::NO_FILES_PROCESSED);
    }
    Ok(exit_codes::SUCCESS)
}
