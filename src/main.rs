mod app_config;
mod cli;
mod error;
mod file_proc;
mod logging;
mod model;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use console::Term;
use dotenv::dotenv;
use tracing::error;

use app_config::AppConfig;
use cli::{Cli, Commands, ConsolidateArgs, DupesArgs, ExtractArgs, OrganizeArgs, SchemaArgs};
use file_proc::hash::HashAlgorithm;
use file_proc::{classify, dupes, schema, JobLog, Orchestrator};
use model::{
    ConsolidateOptions, DuplicateOptions, ExtractOptions, FileRecord, JobOutcome, JobRequest,
    JobSummary, OrganizeOptions, ScanJob,
};

const STATS_CSV_PATH: &str = "sweeper_stats.csv";

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let term = Term::stdout();
    let _ = term.hide_cursor();

    let args = Cli::parse();
    let config = AppConfig::load();

    let outcome = match args.command {
        Some(Commands::Organize(organize_args)) => run_organize(&config, organize_args),
        Some(Commands::Dupes(dupes_args)) => run_dupes(&config, dupes_args),
        Some(Commands::Extract(extract_args)) => run_extract(&config, extract_args),
        Some(Commands::Consolidate(consolidate_args)) => {
            run_consolidate(&config, consolidate_args)
        }
        Some(Commands::Schema(schema_args)) => run_schema(&config, schema_args),
        Some(Commands::PrintConfig) => {
            println!("{:#?}", config);
            Ok(())
        }
        Some(Commands::RotateLog) => {
            let log = JobLog::new(&config.log_dir);
            log.rotate_if_needed(config.log_max_size_kb * 1024);
            Ok(())
        }
        None => {
            if config.auto_organize {
                run_organize(
                    &config,
                    OrganizeArgs {
                        roots: Vec::new(),
                        move_files: false,
                        no_keyword_routing: false,
                    },
                )
            } else {
                println!("Nothing to do; try `sweeper --help`");
                Ok(())
            }
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
    }

    let _ = term.show_cursor();
}

fn run_organize(config: &AppConfig, args: OrganizeArgs) -> anyhow::Result<()> {
    let roots = resolve_roots(args.roots, config)?;
    let job = ScanJob {
        roots,
        request: JobRequest::Organize(OrganizeOptions {
            organized_root: config.organized_root.clone(),
            move_files: args.move_files,
            keyword_routing: !args.no_keyword_routing,
            enabled_categories: config.enabled_categories.clone(),
            create_subfolders: config.create_subfolders,
            deep_scan: config.deep_scan,
        }),
    };

    let summary = run_to_completion(config, job)?;
    print_summary(&summary);
    Ok(())
}

fn run_dupes(config: &AppConfig, args: DupesArgs) -> anyhow::Result<()> {
    let roots = resolve_roots(args.roots, config)?;
    let algorithm = if args.legacy_hash {
        HashAlgorithm::Legacy
    } else {
        HashAlgorithm::from_config(&config.hash_algorithm)
    };
    let job = ScanJob {
        roots,
        request: JobRequest::Duplicates(DuplicateOptions {
            min_file_size_kb: args.min_size_kb.unwrap_or(config.min_file_size_kb),
            algorithm,
            ignore_patterns: config.ignore_patterns.clone(),
        }),
    };

    let summary = run_to_completion(config, job)?;
    print_summary(&summary);

    let JobOutcome::Duplicates { pairs } = &summary.outcome else {
        return Ok(());
    };
    for pair in pairs {
        println!(
            "{} {}{}\n  {} {}{}",
            "original: ".green(),
            pair.original.path.display(),
            modified_label(&pair.original),
            "duplicate:".red(),
            pair.duplicate.path.display(),
            modified_label(&pair.duplicate)
        );
        println!("  {} {}", "reason:   ".dimmed(), pair.reason.dimmed());
    }

    if args.delete && !summary.cancelled && !pairs.is_empty() {
        let question = format!(
            "Remove {} duplicate files (the first-seen copy of each is kept)?",
            pairs.len()
        );
        if utils::prompt::prompt_confirm(&question, Some(false))? {
            let log = JobLog::new(&config.log_dir);
            let (removed, errors) =
                dupes::remove_duplicates(pairs, config.quarantine.as_deref(), &log);
            println!(
                "Removed {} duplicates, {} errors",
                removed.to_string().green(),
                errors.to_string().red()
            );
        }
    }
    Ok(())
}

fn run_extract(config: &AppConfig, args: ExtractArgs) -> anyhow::Result<()> {
    let roots = resolve_roots(args.roots, config)?;
    let job = ScanJob {
        roots,
        request: JobRequest::Extract(ExtractOptions {
            repository_root: args.into.unwrap_or_else(|| config.repository_root.clone()),
            extensions: classify::normalize_extensions(&config.code_extensions),
        }),
    };

    let summary = run_to_completion(config, job)?;
    print_summary(&summary);
    Ok(())
}

fn run_consolidate(config: &AppConfig, args: ConsolidateArgs) -> anyhow::Result<()> {
    let roots = resolve_roots(args.roots, config)?;
    let job = ScanJob {
        roots,
        request: JobRequest::Consolidate(ConsolidateOptions {
            output_dir: args.out_dir.unwrap_or_else(|| config.library_root.clone()),
            extensions: classify::normalize_extensions(&config.code_extensions),
        }),
    };

    let summary = run_to_completion(config, job)?;
    print_summary(&summary);
    Ok(())
}

fn run_schema(config: &AppConfig, args: SchemaArgs) -> anyhow::Result<()> {
    let root = args.root.unwrap_or_else(|| config.organized_root.clone());
    let log = JobLog::new(&config.log_dir);

    let created = schema::ensure_destination_tree(&root, config.create_subfolders)
        .context("cannot create destination tree")?;
    println!("Destination tree ready ({} folders)", created.len());

    let unauthorized =
        schema::find_unauthorized_folders(&root).context("cannot scan destination root")?;
    if unauthorized.is_empty() {
        println!("{}", "No folders outside the schema".green());
        return Ok(());
    }

    println!("{}", "Folders outside the schema:".yellow().bold());
    for folder in &unauthorized {
        println!("  {}", folder.display());
    }

    if config.delete_unauthorized_folders {
        let question = format!("Delete {} folders and their contents?", unauthorized.len());
        if utils::prompt::prompt_confirm(&question, Some(false))? {
            for folder in &unauthorized {
                match std::fs::remove_dir_all(folder) {
                    Ok(()) => log.info(&format!("Deleted folder {}", folder.display())),
                    Err(err) => {
                        log.error(&format!("Error deleting {}: {}", folder.display(), err))
                    }
                }
            }
        }
    }
    Ok(())
}

/// Submits the job and blocks until the summary is in. The per-run stats
/// land on stdout and in a CSV next to the binary. Interactive callers that
/// need mid-run cancellation go through `Orchestrator::cancel` with the job
/// id; this CLI path just waits.
fn run_to_completion(config: &AppConfig, job: ScanJob) -> anyhow::Result<JobSummary> {
    let log = Arc::new(JobLog::new(&config.log_dir));
    log.rotate_if_needed(config.log_max_size_kb * 1024);

    let orchestrator = Orchestrator::new(log);
    let handle = orchestrator.submit(job)?;

    let stats = handle.stats();
    let summary = handle.join();

    tracing::info!(
        kind = %summary.kind,
        errors = summary.errors,
        cancelled = summary.cancelled,
        "job complete"
    );
    let stats = stats.lock().unwrap().clone();
    stats.print();
    if let Err(err) = stats.write_csv(std::path::Path::new(STATS_CSV_PATH)) {
        tracing::debug!("stats csv not written: {}", err);
    }

    Ok(summary)
}

/// Modification times are shown for the user's benefit only; which side of
/// a pair is "original" is decided by traversal order, not by age.
fn modified_label(record: &FileRecord) -> String {
    match record.modified {
        Some(modified) => {
            let stamp: chrono::DateTime<chrono::Local> = modified.into();
            format!(" (modified {})", stamp.format("%Y-%m-%d %H:%M"))
        }
        None => String::new(),
    }
}

fn resolve_roots(cli_roots: Vec<PathBuf>, config: &AppConfig) -> anyhow::Result<Vec<PathBuf>> {
    let roots = if cli_roots.is_empty() {
        config.root_paths.clone()
    } else {
        cli_roots
    };
    if roots.is_empty() {
        bail!("no root paths given on the command line or in the configuration");
    }
    Ok(utils::non_overlapping_directories(roots))
}

fn print_summary(summary: &JobSummary) {
    if summary.cancelled {
        println!("{}", "Job cancelled; partial results follow".yellow().bold());
    }
    match &summary.outcome {
        JobOutcome::Organize {
            category_counts,
            placed,
        } => {
            println!(
                "Organized {} files into {} categories",
                placed.to_string().green(),
                category_counts.len()
            );
        }
        JobOutcome::Duplicates { pairs } => {
            println!("Found {} duplicate pairs", pairs.len().to_string().red());
        }
        JobOutcome::Extract { extracted } => {
            println!("Extracted {} code files", extracted.len().to_string().green());
        }
        JobOutcome::Consolidate {
            files,
            bytes,
            output,
        } => {
            println!(
                "Consolidated {} files ({} bytes)",
                files.to_string().green(),
                bytes
            );
            if let Some(output) = output {
                println!("Saved to {}", output.display());
            }
        }
    }
    if summary.errors > 0 {
        println!("{} {}", "Errors:".bold(), summary.errors.to_string().red());
    }
}
