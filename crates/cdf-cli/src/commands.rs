//! Command implementations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use cdf_core::{LoadRequest, LoadReport, load_results_file};
use cdf_model::{CdfElement, ContestType, Diagnostics, ErrorCategory, ROW_SHOULD_BE_DROPPED};
use cdf_params::{Dictionary, MungerConfig, ParamFile, ResultsDescriptor};
use cdf_store::{
    CdfStore, ConflictMode, MemoryStore, RollupRow, TotalsMismatch,
    check_totals_match_vote_types, rollup,
};

use crate::cli::{LoadArgs, MungersArgs};

pub struct BatchResult {
    pub reports: Vec<LoadReport>,
    pub mismatches: Vec<TotalsMismatch>,
    /// Rolled-up counts per election, when requested.
    pub rollups: Vec<(String, Vec<RollupRow>)>,
}

impl BatchResult {
    pub fn has_failures(&self) -> bool {
        self.reports.iter().any(|report| !report.succeeded())
    }
}

pub fn run_load(args: &LoadArgs) -> Result<BatchResult> {
    let mut diags = Diagnostics::new();
    let dictionary = Dictionary::from_path(&args.dictionary, &mut diags)
        .with_context(|| format!("reading dictionary {}", args.dictionary.display()))?;
    for warning in diags.warnings() {
        tracing::warn!(key = %warning.key, "{}", warning.message);
    }

    let mut store = MemoryStore::new();
    let mut reports = Vec::with_capacity(args.descriptors.len());
    let mut elections = Vec::new();
    for descriptor_path in &args.descriptors {
        let descriptor = ResultsDescriptor::from_path(descriptor_path)
            .with_context(|| format!("reading descriptor {}", descriptor_path.display()))?;
        seed_store(&mut store, &descriptor, &dictionary);
        if !elections.contains(&descriptor.election) {
            elections.push(descriptor.election.clone());
        }

        let default_dir = descriptor_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let results_dir = args.results_dir.as_deref().unwrap_or(&default_dir);
        let report = load_results_file(
            &mut store,
            &LoadRequest {
                descriptor: &descriptor,
                results_dir,
                munger_dir: &args.munger_dir,
                dictionary: &dictionary,
                mode: if args.upsert {
                    ConflictMode::Upsert
                } else {
                    ConflictMode::InsertIgnore
                },
            },
        );
        if let Some(report_dir) = &args.report_dir {
            write_report(report_dir, &report)?;
        }
        reports.push(report);
    }

    let mut mismatches = Vec::new();
    let mut rollups = Vec::new();
    if args.check_totals || args.rollup {
        for election in &elections {
            let Some(election_id) = store.election_id(election)? else {
                continue;
            };
            if args.check_totals {
                mismatches.extend(check_totals_match_vote_types(
                    &store,
                    election_id,
                    args.subdivision_depth,
                )?);
            }
            if args.rollup {
                let rows = rollup(&store, election_id, args.subdivision_depth)?;
                rollups.push((election.clone(), rows));
            }
        }
    }
    Ok(BatchResult {
        reports,
        mismatches,
        rollups,
    })
}

/// One load session runs against a fresh in-memory store, so elections,
/// contests, and selection dimensions come from the descriptor and the
/// dictionary's internal names. A persistent backing store would already
/// hold these from jurisdiction prep.
fn seed_store(store: &mut MemoryStore, descriptor: &ResultsDescriptor, dictionary: &Dictionary) {
    store.add_election(&descriptor.election);
    let internal_names = |element: CdfElement| {
        dictionary
            .entries(element)
            .into_iter()
            .flat_map(|entries| entries.values())
            .filter(|name| name.as_str() != ROW_SHOULD_BE_DROPPED)
    };
    for name in internal_names(CdfElement::CandidateContest) {
        store.add_contest(name, ContestType::Candidate);
    }
    for name in internal_names(CdfElement::BallotMeasureContest) {
        store.add_contest(name, ContestType::BallotMeasure);
    }
    for name in internal_names(CdfElement::Candidate) {
        store.add_candidate(name);
    }
    for name in internal_names(CdfElement::Party) {
        store.add_party(name);
    }
    for name in internal_names(CdfElement::BallotMeasureSelection) {
        store.add_ballot_measure_selection(name);
    }
}

fn write_report(dir: &Path, report: &LoadReport) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.report.json", report.short_name));
    let json = report.to_json()?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "load report written");
    Ok(())
}

pub struct MungerSummary {
    pub name: String,
    pub detail: std::result::Result<MungerConfig, String>,
}

pub fn run_mungers(args: &MungersArgs) -> Result<Vec<MungerSummary>> {
    let mut summaries = Vec::new();
    for entry in fs::read_dir(&args.dir)
        .with_context(|| format!("reading {}", args.dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|extension| extension.to_str()) != Some("munger") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("munger")
            .to_string();
        let detail = ParamFile::from_path(&path, ErrorCategory::Munger)
            .and_then(|file| MungerConfig::from_param_file(&name, &file))
            .map_err(|error| error.message);
        summaries.push(MungerSummary { name, detail });
    }
    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(summaries)
}
