//! Top-level pipeline orchestrator.
//!
//! A linear sequence of phases, each with its own tracing span, each able to
//! fail independently, with best-effort steps logging a warning and
//! continuing rather than aborting the whole run.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use dpm_db::{ArtefactPaths, ArtifactStore};
use tracing::{info, warn};

use crate::actionable::pick_actionable_feature;
use crate::config::GlobalConfig;
use crate::dataset::{records_to_dataset, write_dataset};
use crate::errors::DpmResult;
use crate::issue_tracker::{build_bug_catalogue, IssueTracker};
use crate::labeller::{apply_proportion_estimate, derive_version_indices, estimate_rho, is_buggy};
use crate::linker::link_commits_to_tickets;
use crate::log::PipelineContext;
use crate::method_history::extract_release_methods;
use crate::preprocess::{impute_missing, normalize, oversample_if_imbalanced, rank_features, select_top_k};
use crate::release_index::{ReleaseDescriptor, ReleaseIndex};
use crate::simulator::{run_simulation, SimulationReport};
use crate::source_parser::SourceParser;
use crate::touched_methods::touched_methods;
use crate::types::{Dataset, FeatureRecord, LastKnownMethods};
use crate::vcs::VersionControl;
use dpm_model::{ClassifierKind, TrainedModelDescriptor};

const SOURCE_SUFFIX: &str = ".java";

/// Everything one `dpm run` invocation produces (§6's persisted artefacts,
/// surfaced in memory for the CLI to print).
pub struct PipelineOutcome {
    pub release_count: usize,
    pub record_count: usize,
    pub selected_classifier: ClassifierKind,
    pub classifier_options: String,
    pub actionable_feature: Option<String>,
    pub simulation: Option<SimulationReport>,
}

/// What `extract_dataset` produces (components 1–8): a persisted
/// `<PROJECT>.csv` plus the counts the `extract` subcommand reports.
pub struct ExtractionOutcome {
    pub release_count: usize,
    pub record_count: usize,
}

/// What `preprocess_dataset` produces (component 9): the preprocessed row
/// count and whether oversampling triggered a balanced artefact.
pub struct PreprocessOutcome {
    pub row_count: usize,
    pub selected_columns: Vec<String>,
    pub balanced: bool,
}

/// Build the release index from `vcs`'s tags (step 1), returning it
/// alongside the tag-to-commit map later steps need to resolve a release's
/// checkout.
fn build_release_index(vcs: &dyn VersionControl, project: &str) -> DpmResult<(ReleaseIndex, std::collections::BTreeMap<String, String>)> {
    let tag_commits = vcs.list_tags()?;
    let mut descriptors = Vec::with_capacity(tag_commits.len());
    for (name, commit_id) in &tag_commits {
        match vcs.find_commit(commit_id) {
            Ok(commit) => descriptors.push(ReleaseDescriptor {
                name: name.clone(),
                released: true,
                date: Some(commit.timestamp),
            }),
            Err(e) => warn!(release = %name, error = %e, "missing tag commit; release omitted"),
        }
    }
    let release_index = ReleaseIndex::build(descriptors, project)?;
    info!(releases = release_index.len(), "release index built");
    Ok((release_index, tag_commits))
}

/// Build the labelled bug catalogue (steps 2, 3, 4, 5): fetch tickets, link
/// fix commits, extract each fix's touched methods, then estimate and fill
/// in missing introduction versions.
fn build_labelled_tickets(
    vcs: &dyn VersionControl,
    tracker: &dyn IssueTracker,
    parser: &dyn SourceParser,
    project: &str,
    release_index: &ReleaseIndex,
) -> DpmResult<(Vec<crate::types::BugTicket>, HashMap<String, HashSet<String>>)> {
    let mut tickets = build_bug_catalogue(tracker, project)?;
    link_commits_to_tickets(vcs, &mut tickets)?;

    let mut touched_by_ticket: HashMap<String, HashSet<String>> = HashMap::new();
    for ticket in &tickets {
        let Some(commit_id) = &ticket.fix_commit else { continue };
        match vcs.find_commit(commit_id) {
            Ok(commit) => match touched_methods(vcs, parser, &commit, SOURCE_SUFFIX) {
                Ok(methods) => {
                    touched_by_ticket.insert(ticket.key.clone(), methods);
                }
                Err(e) => warn!(ticket = %ticket.key, error = %e, "touched-methods extraction failed"),
            },
            Err(e) => warn!(ticket = %ticket.key, error = %e, "fix commit not found"),
        }
    }

    derive_version_indices(&mut tickets, release_index);
    let rho = estimate_rho(&tickets);
    apply_proportion_estimate(&mut tickets, rho);

    Ok((tickets, touched_by_ticket))
}

/// Extract and label the per-(method, release) feature rows (steps 6, 7):
/// method-history extraction over the configured cutoff releases, labelled
/// against the verified-window tickets. Returns the rows plus each row's
/// rendered method source, keyed by its stable rendered identity (§9).
fn extract_feature_records(
    vcs: &dyn VersionControl,
    parser: &dyn SourceParser,
    project: &str,
    tag_commits: &std::collections::BTreeMap<String, String>,
    release_index: &ReleaseIndex,
    tickets: &[crate::types::BugTicket],
    touched_by_ticket: &HashMap<String, HashSet<String>>,
    config: &GlobalConfig,
) -> DpmResult<(Vec<FeatureRecord>, HashMap<String, String>)> {
    let cutoff = config.effective_release_cutoff_percentage();
    let mut last_known = LastKnownMethods::default();
    let mut records: Vec<FeatureRecord> = Vec::new();
    let mut method_sources: HashMap<String, String> = HashMap::new();

    for release in release_index.cutoff_releases(cutoff) {
        let Some(commit_id) = tag_commits.get(&release.name) else {
            warn!(release = %release.name, "release has no tag commit; skipped");
            continue;
        };
        let methods = match extract_release_methods(vcs, parser, commit_id, SOURCE_SUFFIX, &mut last_known) {
            Ok(methods) => methods,
            Err(e) => {
                warn!(release = %release.name, error = %e, "method-history extraction failed; release skipped");
                continue;
            }
        };

        for method in methods {
            let buggy = is_buggy(&method.key.render(), release.index, tickets, touched_by_ticket);
            method_sources.insert(method.key.render(), method.rendered_source.clone());
            records.push(FeatureRecord {
                project: project.to_string(),
                method_name: method.key.render(),
                release: release.name.clone(),
                code_smells: method.static_metrics.code_smells,
                cyclomatic_complexity: method.static_metrics.cyclomatic_complexity,
                parameter_count: method.static_metrics.parameter_count,
                duplication: method.static_metrics.duplication,
                nr: method.change_history.nr,
                n_auth: method.change_history.n_auth,
                stmt_added: method.change_history.stmt_added,
                stmt_deleted: method.change_history.stmt_deleted,
                max_churn: method.change_history.max_churn,
                avg_churn: method.change_history.avg_churn,
                is_buggy: buggy,
            });
        }
    }

    Ok((records, method_sources))
}

/// Run components 1–8 for one project: release index, bug catalogue,
/// linking, touched-methods, proportion estimation, method-history
/// extraction and labelling, and dataset assembly. Writes `<PROJECT>.csv`.
pub fn extract_dataset(
    vcs: &dyn VersionControl,
    tracker: &dyn IssueTracker,
    parser: &dyn SourceParser,
    store: &dyn ArtifactStore,
    project: &str,
    out_dir: &Path,
    config: &GlobalConfig,
) -> DpmResult<ExtractionOutcome> {
    let _ctx = PipelineContext::enter(project);
    let paths = ArtefactPaths::new(project, out_dir);

    let (release_index, tag_commits) = build_release_index(vcs, project)?;
    let (tickets, touched_by_ticket) = build_labelled_tickets(vcs, tracker, parser, project, &release_index)?;
    let (records, _method_sources) =
        extract_feature_records(vcs, parser, project, &tag_commits, &release_index, &tickets, &touched_by_ticket, config)?;

    write_dataset(store, &paths.raw_dataset(), &records)?;
    info!(records = records.len(), "dataset assembled");

    Ok(ExtractionOutcome {
        release_count: release_index.len(),
        record_count: records.len(),
    })
}

/// Run component 9 (preprocessing) on an existing `<PROJECT>.csv`: impute,
/// normalize, rank by information gain, select the top-k features, and
/// oversample if the class balance is skewed enough to trigger it.
pub fn preprocess_dataset(store: &dyn ArtifactStore, project: &str, out_dir: &Path, config: &GlobalConfig) -> DpmResult<PreprocessOutcome> {
    let paths = ArtefactPaths::new(project, out_dir);
    let records = crate::dataset::read_dataset(store, &paths.raw_dataset())?;

    let mut dataset = records_to_dataset(&records);
    impute_missing(&mut dataset);
    normalize(&mut dataset);
    let ranking = rank_features(&dataset);
    let k = config.preprocessing.features_to_select.min(ranking.len().max(1));
    let selected = select_top_k(&dataset, &ranking, k);

    if !store.exists_and_nonempty(&paths.processed_dataset()) {
        store.write_arff(
            &paths.processed_dataset(),
            project,
            &dpm_db::ArffTable { columns: selected.columns.clone(), rows: selected.rows.clone() },
        )?;
    }

    let mut balanced = false;
    if let Some(balanced_dataset) = oversample_if_imbalanced(&selected) {
        balanced = true;
        if !store.exists_and_nonempty(&paths.balanced_dataset()) {
            store.write_arff(
                &paths.balanced_dataset(),
                project,
                &dpm_db::ArffTable { columns: balanced_dataset.columns.clone(), rows: balanced_dataset.rows.clone() },
            )?;
        }
    }

    Ok(PreprocessOutcome {
        row_count: selected.rows.len(),
        selected_columns: selected.columns,
        balanced,
    })
}

/// Load the dataset component 10 (and 11/12) train and simulate against:
/// the balanced artefact if oversampling produced one, else the plain
/// preprocessed artefact.
fn load_training_dataset(store: &dyn ArtifactStore, paths: &ArtefactPaths) -> DpmResult<Dataset> {
    let path = if store.exists_and_nonempty(&paths.balanced_dataset()) {
        paths.balanced_dataset()
    } else {
        paths.processed_dataset()
    };
    let table = store.read_arff(&path)?;
    Ok(Dataset { columns: table.columns, rows: table.rows })
}

/// Run component 10 (classifier orchestration) on an existing processed
/// artefact, persisting the tuned winner as `<PROJECT>_best.model`.
pub fn train_classifier(
    store: &dyn ArtifactStore,
    project: &str,
    out_dir: &Path,
    config: &GlobalConfig,
) -> DpmResult<crate::classifier_orchestrator::OrchestrationResult> {
    let paths = ArtefactPaths::new(project, out_dir);
    let dataset = load_training_dataset(store, &paths)?;
    crate::classifier_orchestrator::orchestrate(store, &paths.trained_model(), &dataset, &config.tuner)
}

/// Run components 11 and 12 (actionable-feature picker, what-if simulator)
/// against an existing trained model. Unlike [`run_pipeline`], this
/// standalone path has no in-memory rendered method sources available, so
/// it does not (re)write `<PROJECT>_AFMethod.txt`; it still touches the
/// empty refactored-source placeholder if absent (§9, open-question
/// resolution: standalone `simulate` trades the source artefact for not
/// having to re-run extraction).
pub fn simulate_whatif(
    store: &dyn ArtifactStore,
    project: &str,
    out_dir: &Path,
    config: &GlobalConfig,
) -> DpmResult<(Option<String>, Option<SimulationReport>)> {
    let paths = ArtefactPaths::new(project, out_dir);
    let dataset = load_training_dataset(store, &paths)?;
    let bytes = store.read_blob(&paths.trained_model())?;
    let descriptor = TrainedModelDescriptor::from_bytes(&bytes)
        .map_err(|e| crate::errors::DpmError::persistence_failure(paths.trained_model().display().to_string(), e.to_string()))?;

    let actionable = pick_actionable_feature(&dataset, &config.analysis.actionable_feature_list());
    let actionable_index = actionable.as_ref().and_then(|name| dataset.columns.iter().position(|c| c == name));
    let simulation = actionable_index.map(|idx| run_simulation(&dataset, &descriptor, idx));

    store.touch_if_absent(&paths.refactored_method_source())?;

    Ok((actionable, simulation))
}

/// Run the full pipeline for one project. Best-effort recovery is applied
/// per §7 inside the individual component calls; this function itself
/// treats its own component failures as fatal for the project (§7.1,
/// §6 "Exit behaviour").
pub fn run_pipeline(
    vcs: &dyn VersionControl,
    tracker: &dyn IssueTracker,
    parser: &dyn SourceParser,
    store: &dyn ArtifactStore,
    project: &str,
    out_dir: &Path,
    config: &GlobalConfig,
) -> DpmResult<PipelineOutcome> {
    let _ctx = PipelineContext::enter(project);
    let paths = ArtefactPaths::new(project, out_dir);

    let (release_index, tag_commits) = build_release_index(vcs, project)?;
    let (tickets, touched_by_ticket) = build_labelled_tickets(vcs, tracker, parser, project, &release_index)?;
    let (records, method_sources) =
        extract_feature_records(vcs, parser, project, &tag_commits, &release_index, &tickets, &touched_by_ticket, config)?;

    // 8. Dataset assembly.
    write_dataset(store, &paths.raw_dataset(), &records)?;
    info!(records = records.len(), "dataset assembled");

    // 9. Preprocessing.
    let mut dataset = records_to_dataset(&records);
    impute_missing(&mut dataset);
    normalize(&mut dataset);
    let ranking = rank_features(&dataset);
    let k = config.preprocessing.features_to_select.min(ranking.len().max(1));
    let selected = select_top_k(&dataset, &ranking, k);

    if !store.exists_and_nonempty(&paths.processed_dataset()) {
        store.write_arff(
            &paths.processed_dataset(),
            project,
            &dpm_db::ArffTable { columns: selected.columns.clone(), rows: selected.rows.clone() },
        )?;
    }

    if let Some(balanced) = oversample_if_imbalanced(&selected) {
        if !store.exists_and_nonempty(&paths.balanced_dataset()) {
            store.write_arff(
                &paths.balanced_dataset(),
                project,
                &dpm_db::ArffTable { columns: balanced.columns.clone(), rows: balanced.rows.clone() },
            )?;
        }
    }

    // 10. Classifier orchestration.
    let training_dataset = if store.exists_and_nonempty(&paths.balanced_dataset()) {
        store
            .read_arff(&paths.balanced_dataset())
            .map(|t| Dataset { columns: t.columns, rows: t.rows })
            .unwrap_or_else(|_| selected.clone())
    } else {
        selected.clone()
    };
    let orchestration = crate::classifier_orchestrator::orchestrate(
        store,
        &paths.trained_model(),
        &training_dataset,
        &config.tuner,
    )?;

    // 11. Actionable feature.
    let actionable = pick_actionable_feature(&training_dataset, &config.analysis.actionable_feature_list());
    let actionable_index = actionable
        .as_ref()
        .and_then(|name| training_dataset.columns.iter().position(|c| c == name));

    // 12. What-if simulator.
    let simulation = actionable_index.map(|idx| run_simulation(&training_dataset, &orchestration.descriptor, idx));

    if let Some(ref feature_name) = actionable {
        if let Some(chosen) = most_actionable_method(&records, feature_name) {
            if let Some(source) = method_sources.get(&chosen) {
                store.write_text(&paths.actionable_method_source(), source)?;
            }
        }
    }
    store.touch_if_absent(&paths.refactored_method_source())?;

    Ok(PipelineOutcome {
        release_count: release_index.len(),
        record_count: records.len(),
        selected_classifier: orchestration.descriptor.kind,
        classifier_options: orchestration.descriptor.options,
        actionable_feature: actionable,
        simulation,
    })
}

/// Raw (pre-normalisation) value of `feature_name` on one feature record, by
/// the same names the preprocessor ranks (§4.9, §4.11).
fn raw_feature_value(record: &FeatureRecord, feature_name: &str) -> Option<f64> {
    match feature_name {
        "CodeSmells" => Some(record.code_smells as f64),
        "CyclomaticComplexity" => Some(record.cyclomatic_complexity as f64),
        "ParameterCount" => Some(record.parameter_count as f64),
        "Duplication" => Some(record.duplication as f64),
        "NR" => Some(record.nr as f64),
        "NAuth" => Some(record.n_auth as f64),
        "stmtAdded" => Some(record.stmt_added as f64),
        "stmtDeleted" => Some(record.stmt_deleted as f64),
        "maxChurn" => Some(record.max_churn as f64),
        "avgChurn" => Some(record.avg_churn),
        _ => None,
    }
}

/// The `(path, signature)`-identified method with the largest raw value of
/// `feature_name`, keyed off its stable rendered identity (§9, the
/// documented alternative to brittle substring matching).
fn most_actionable_method(records: &[FeatureRecord], feature_name: &str) -> Option<String> {
    records
        .iter()
        .filter_map(|r| raw_feature_value(r, feature_name).map(|v| (v, &r.method_name)))
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, name)| name.clone())
}
