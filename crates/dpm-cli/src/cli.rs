//! CLI definition and command dispatch for `dpm`.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to `dpm-core`.
//!
//! ## Configuration precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (`--config`, `--verbose`, `--quiet`, `--color`)
//! 2. Environment variables (`DPM_CONFIG`, `DPM_VERBOSE`, `DPM_COLOR`)
//! 3. Config file (`~/.dpm/config.yaml` or the path from `--config`/`DPM_CONFIG`)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use dpm_core::issue_tracker::{build_bug_catalogue, RestIssueTracker};
use dpm_core::source_parser::JavaSourceParser;
use dpm_core::vcs::{GitVersionControl, VersionControl};
use dpm_core::{DpmError, GlobalConfig};
use dpm_db::{ArtefactPaths, ArtifactStore, FileArtifactStore};

use crate::ui::{table, ColorMode, MessageType, Progress, ProgressMode, Style};

/// Version string including the crate version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command-line interface for the defect-prediction mining pipeline.
#[derive(Parser, Debug)]
#[command(name = "dpm")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "DPM_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress and informational messages
    #[arg(short, long, global = true, env = "DPM_QUIET")]
    pub quiet: bool,

    /// Path to configuration file (default: ~/.dpm/config.yaml)
    #[arg(long, global = true, env = "DPM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode: always, never, or auto (default: auto)
    #[arg(long, global = true, env = "DPM_COLOR", default_value = "auto")]
    pub color: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline end to end for one project
    #[command(after_help = r#"EXAMPLES:
    dpm run --repo ./checkout --project Lang --tracker-url https://issues.example.org
"#)]
    Run {
        /// Local path to the project's git checkout
        #[arg(long)]
        repo: PathBuf,
        /// Project name, used both for tracker queries and artefact naming
        #[arg(long)]
        project: String,
        /// Base URL of the issue tracker's REST API
        #[arg(long)]
        tracker_url: String,
        /// Output directory for persisted artefacts (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the resolved release index for a repository
    ReleaseIndex {
        /// Local path to the project's git checkout
        #[arg(long)]
        repo: PathBuf,
    },

    /// Fetch and print the bug catalogue for a project
    Bugs {
        /// Project name
        #[arg(long)]
        project: String,
        /// Base URL of the issue tracker's REST API
        #[arg(long)]
        tracker_url: String,
    },

    /// Extract the raw dataset (bug catalogue through dataset assembly) for a project
    Extract {
        /// Local path to the project's git checkout
        #[arg(long)]
        repo: PathBuf,
        /// Project name
        #[arg(long)]
        project: String,
        /// Base URL of the issue tracker's REST API
        #[arg(long)]
        tracker_url: String,
        /// Output directory for persisted artefacts (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Preprocess an existing `<PROJECT>.csv` into a trainable dataset
    Preprocess {
        /// Project name
        #[arg(long)]
        project: String,
        /// Output directory holding the project's artefacts (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Train and tune a classifier on an existing processed dataset
    Train {
        /// Project name
        #[arg(long)]
        project: String,
        /// Output directory holding the project's artefacts (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run the actionable-feature picker and what-if simulator on a trained model
    Simulate {
        /// Project name
        #[arg(long)]
        project: String,
        /// Output directory holding the project's artefacts (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Report which artefacts already exist for a project
    Status {
        /// Project name
        #[arg(long)]
        project: String,
        /// Output directory holding the project's artefacts (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!("dpm_core={log_level},dpm_cli={log_level}");
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let color_mode = ColorMode::from_str(&cli.color).unwrap_or(ColorMode::Auto);
    let style = Style::new(color_mode);
    let progress_mode = ProgressMode::detect(cli.quiet, false, color_mode);

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", style.error_with_context("Failed to load configuration", Some(&e.to_string()), None));
            return ExitCode::FAILURE;
        }
    };
    match config.validate() {
        Ok(warnings) => {
            if !cli.quiet {
                for w in &warnings {
                    println!("{}", style.message(MessageType::Warn, w));
                }
            }
        }
        Err(e) => {
            eprintln!("{}", style.error_with_context("Invalid configuration", Some(&e.to_string()), None));
            return ExitCode::FAILURE;
        }
    }

    let result = match cli.command {
        Command::Run { repo, project, tracker_url, out } => {
            handle_run(&style, progress_mode, &config, &repo, &project, &tracker_url, out.as_deref())
        }
        Command::ReleaseIndex { repo } => handle_release_index(&style, &repo),
        Command::Bugs { project, tracker_url } => handle_bugs(&style, &project, &tracker_url),
        Command::Extract { repo, project, tracker_url, out } => {
            handle_extract(&style, progress_mode, &config, &repo, &project, &tracker_url, out.as_deref())
        }
        Command::Preprocess { project, out } => handle_preprocess(&style, &config, &project, out.as_deref()),
        Command::Train { project, out } => handle_train(&style, &config, &project, out.as_deref()),
        Command::Simulate { project, out } => handle_simulate(&style, &config, &project, out.as_deref()),
        Command::Status { project, out, json } => handle_status(&style, &project, out.as_deref(), json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style.message(MessageType::Err, &e.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<GlobalConfig, DpmError> {
    match explicit {
        Some(path) => GlobalConfig::from_path(path),
        None => GlobalConfig::load_default(),
    }
}

fn out_dir(out: Option<&Path>) -> PathBuf {
    out.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
}

fn handle_run(
    style: &Style,
    progress_mode: ProgressMode,
    config: &GlobalConfig,
    repo: &Path,
    project: &str,
    tracker_url: &str,
    out: Option<&Path>,
) -> Result<(), DpmError> {
    let vcs = GitVersionControl::open(repo)?;
    let tracker = RestIssueTracker::new(tracker_url);
    let parser = JavaSourceParser::new();
    let store = FileArtifactStore::new();
    let out_dir = out_dir(out);

    let spinner = Progress::spinner(&format!("Mining {project}"), progress_mode);
    let outcome = dpm_core::run_pipeline(&vcs, &tracker, &parser, &store, project, &out_dir, config);
    match outcome {
        Ok(outcome) => {
            spinner.finish_ok(&format!(
                "Mined {project}: {} releases, {} records, classifier {:?} ({})",
                outcome.release_count, outcome.record_count, outcome.selected_classifier, outcome.classifier_options
            ));
            if let Some(feature) = &outcome.actionable_feature {
                println!("{}", style.message_detail("Actionable feature", feature));
            }
            if let Some(sim) = &outcome.simulation {
                println!(
                    "{}",
                    style.message_detail(
                        "What-if simulation",
                        &format!(
                            "{:?} (predicted positives B⁺={} → B={}, threshold={:.3})",
                            sim.interpretation, sim.predicted_positive_b_plus, sim.predicted_positive_b, sim.threshold
                        )
                    )
                );
            }
            Ok(())
        }
        Err(e) => {
            spinner.finish_err(&format!("Mining {project} failed"));
            Err(e)
        }
    }
}

fn handle_release_index(style: &Style, repo: &Path) -> Result<(), DpmError> {
    let vcs = GitVersionControl::open(repo)?;
    let tags = vcs.list_tags()?;
    let mut descriptors = Vec::with_capacity(tags.len());
    for (name, commit_id) in &tags {
        if let Ok(commit) = vcs.find_commit(commit_id) {
            descriptors.push(dpm_core::release_index::ReleaseDescriptor {
                name: name.clone(),
                released: true,
                date: Some(commit.timestamp),
            });
        }
    }
    let index = dpm_core::release_index::ReleaseIndex::build(descriptors, "release-index")?;

    println!("{}", style.section("RELEASE INDEX"));
    println!();
    println!("{}", table::render_release_index_table(index.releases()));
    Ok(())
}

fn handle_bugs(style: &Style, project: &str, tracker_url: &str) -> Result<(), DpmError> {
    let tracker = RestIssueTracker::new(tracker_url);
    let tickets = build_bug_catalogue(&tracker, project)?;

    println!("{}", style.section("BUG CATALOGUE"));
    println!();
    println!("{}", table::render_bug_catalogue_table(&tickets));
    Ok(())
}

fn handle_extract(
    style: &Style,
    progress_mode: ProgressMode,
    config: &GlobalConfig,
    repo: &Path,
    project: &str,
    tracker_url: &str,
    out: Option<&Path>,
) -> Result<(), DpmError> {
    let vcs = GitVersionControl::open(repo)?;
    let tracker = RestIssueTracker::new(tracker_url);
    let parser = JavaSourceParser::new();
    let store = FileArtifactStore::new();
    let out_dir = out_dir(out);

    let spinner = Progress::spinner(&format!("Extracting {project}"), progress_mode);
    match dpm_core::extract_dataset(&vcs, &tracker, &parser, &store, project, &out_dir, config) {
        Ok(outcome) => {
            spinner.finish_ok(&format!(
                "Extracted {project}: {} releases, {} records",
                outcome.release_count, outcome.record_count
            ));
            Ok(())
        }
        Err(e) => {
            spinner.finish_err(&format!("Extraction for {project} failed"));
            Err(e)
        }
    }
}

fn handle_preprocess(style: &Style, config: &GlobalConfig, project: &str, out: Option<&Path>) -> Result<(), DpmError> {
    let store = FileArtifactStore::new();
    let out_dir = out_dir(out);
    let outcome = dpm_core::preprocess_dataset(&store, project, &out_dir, config)?;
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Preprocessed {project}: {} rows, features [{}]{}",
                outcome.row_count,
                outcome.selected_columns.join(", "),
                if outcome.balanced { ", balanced artefact written" } else { "" }
            )
        )
    );
    Ok(())
}

fn handle_train(style: &Style, config: &GlobalConfig, project: &str, out: Option<&Path>) -> Result<(), DpmError> {
    let store = FileArtifactStore::new();
    let out_dir = out_dir(out);
    let result = dpm_core::train_classifier(&store, project, &out_dir, config)?;
    println!(
        "{}",
        style.message(
            MessageType::Ok,
            &format!(
                "Trained {project}: {:?} ({}), AUC={:.3} precision={:.3} recall={:.3}",
                result.descriptor.kind,
                result.descriptor.options,
                result.metrics.auc,
                result.metrics.precision,
                result.metrics.recall
            )
        )
    );
    Ok(())
}

fn handle_simulate(style: &Style, config: &GlobalConfig, project: &str, out: Option<&Path>) -> Result<(), DpmError> {
    let store = FileArtifactStore::new();
    let out_dir = out_dir(out);
    let (actionable, simulation) = dpm_core::simulate_whatif(&store, project, &out_dir, config)?;

    match actionable {
        Some(feature) => println!("{}", style.message_detail("Actionable feature", &feature)),
        None => println!("{}", style.message(MessageType::Info, "No actionable feature found among the configured candidates")),
    }
    if let Some(sim) = simulation {
        println!(
            "{}",
            style.message_detail(
                "What-if simulation",
                &format!(
                    "{:?} (predicted positives B⁺={} → B={}, threshold={:.3})",
                    sim.interpretation, sim.predicted_positive_b_plus, sim.predicted_positive_b, sim.threshold
                )
            )
        );
    }
    Ok(())
}

fn handle_status(style: &Style, project: &str, out: Option<&Path>, json: bool) -> Result<(), DpmError> {
    let out_dir = out_dir(out);
    let paths = ArtefactPaths::new(project, &out_dir);
    let store = FileArtifactStore::new();

    let rows = vec![
        ("raw dataset", paths.raw_dataset()),
        ("processed dataset", paths.processed_dataset()),
        ("balanced dataset", paths.balanced_dataset()),
        ("trained model", paths.trained_model()),
        ("actionable method source", paths.actionable_method_source()),
        ("refactored method source", paths.refactored_method_source()),
    ];
    let present: Vec<(&str, PathBuf, bool)> =
        rows.into_iter().map(|(label, path)| (label, path.clone(), store.exists_and_nonempty(&path))).collect();

    if json {
        let entries: Vec<serde_json::Value> = present
            .iter()
            .map(|(label, path, exists)| serde_json::json!({"artefact": label, "path": path, "present": exists}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries).unwrap_or_default());
    } else {
        println!("{}", style.section(&format!("STATUS: {project}")));
        println!();
        println!("{}", table::render_artefact_status_table(&present));
    }
    Ok(())
}
