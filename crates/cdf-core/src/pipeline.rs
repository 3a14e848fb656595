//! Per-file load pipeline with ordered stage execution.
//!
//! Stages run in a fixed order for each results file:
//!
//! 1. **Configured**: descriptor parsed, mungers parsed and coverage-checked
//! 2. **Read**: source file read into raw tables, one per sheet or block
//! 3. **Standardized**: melted into count frames with a single `Count` column
//! 4. **FormulasApplied**: munge formulas evaluated into `_raw` columns
//! 5. **DictionaryResolved**: raw values joined to internal names and ids
//! 6. **Aggregated**: missing totals synthesized, duplicates summed
//! 7. **Loaded**: bulk insert into VoteCount
//!
//! A fatal error at any stage moves the file to `Errored` and nothing is
//! written to VoteCount; per-sheet and per-munger failures are tolerated as
//! long as some sheet still yields rows. Files in a batch are isolated: each
//! gets its own report and a failed file never aborts its siblings.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, info_span, warn};

use cdf_ingest::{LookupTable, read_lookup, read_source};
use cdf_model::{
    Diagnostics, ElectionId, ErrorCategory, LoadError, LoadResult, ReportingUnitId, VoteCount,
};
use cdf_munge::{apply_formulas, standardize};
use cdf_params::{Dictionary, MungerConfig, ParamFile, ResultsDescriptor};
use cdf_resolve::{build_vote_counts, resolve_names};
use cdf_store::{
    CdfStore, ConflictMode, DatafileRecord, ensure_reporting_unit, load_vote_counts,
};

use crate::report::{LoadReport, Stage};

/// Everything one file load needs besides the store.
pub struct LoadRequest<'a> {
    pub descriptor: &'a ResultsDescriptor,
    /// Directory `results_file` is relative to.
    pub results_dir: &'a Path,
    /// Directory holding `<name>.munger` files.
    pub munger_dir: &'a Path,
    pub dictionary: &'a Dictionary,
    pub mode: ConflictMode,
}

/// Load one results file end to end. Never returns `Err`: fatal conditions
/// land in the report with `stage_reached == Errored`.
pub fn load_results_file(store: &mut dyn CdfStore, request: &LoadRequest<'_>) -> LoadReport {
    let descriptor = request.descriptor;
    let span = info_span!("load", file = %descriptor.short_name);
    let _guard = span.enter();

    let mut diags = Diagnostics::new();
    let mut stage = Stage::Configured;
    let mut rows_resolved = 0;
    let mut outcome = None;
    match run(store, request, &mut stage, &mut diags) {
        Ok((rows, insert_outcome)) => {
            rows_resolved = rows;
            outcome = Some(insert_outcome);
            info!(rows, "load finished");
        }
        Err(error) => {
            warn!(stage = ?stage, %error, "load failed");
            diags.fatal(error);
            stage = Stage::Errored;
        }
    }
    LoadReport {
        short_name: descriptor.short_name.clone(),
        results_file: descriptor.results_file.clone(),
        stage_reached: stage,
        rows_resolved,
        outcome,
        diagnostics: diags,
    }
}

fn run(
    store: &mut dyn CdfStore,
    request: &LoadRequest<'_>,
    stage: &mut Stage,
    diags: &mut Diagnostics,
) -> LoadResult<(usize, cdf_store::InsertOutcome)> {
    let descriptor = request.descriptor;
    let mungers = load_mungers(descriptor, request.munger_dir)?;
    let (election_id, jurisdiction_id) = resolve_targets(store, descriptor)?;
    let datafile_id = store.register_datafile(DatafileRecord {
        short_name: descriptor.short_name.clone(),
        file_name: descriptor.results_file.clone(),
        download_date: descriptor.download_date.to_string(),
        source: descriptor.source.clone(),
        note: descriptor.note.clone(),
        election_id,
        jurisdiction_id,
    })?;

    let results_path = request.results_dir.join(&descriptor.results_file);
    let mut rows: Vec<VoteCount> = Vec::new();
    let mut stashed_errors: Vec<LoadError> = Vec::new();
    for munger in &mungers {
        let span = info_span!("munger", name = %munger.name);
        let _guard = span.enter();
        // A munger whose read fails outright is treated like a failed
        // sheet: stashed, and fatal only if no munger yields rows.
        let tables = match read_source(&results_path, munger, diags) {
            Ok(tables) => tables,
            Err(error) => {
                warn!(%error, "munger read failed");
                stashed_errors.push(error);
                continue;
            }
        };
        *stage = (*stage).max(Stage::Read);
        for (sheet, table) in &tables {
            let mut sheet_diags = Diagnostics::new();
            let sheet_result = load_sheet(
                store,
                request,
                munger,
                sheet,
                table,
                &results_path,
                election_id,
                datafile_id,
                stage,
                &mut sheet_diags,
            );
            diags.merge(sheet_diags);
            match sheet_result {
                Ok(mut sheet_rows) => rows.append(&mut sheet_rows),
                Err(error) => {
                    warn!(sheet = %sheet, %error, "sheet failed");
                    stashed_errors.push(error);
                }
            }
        }
    }

    if rows.is_empty() {
        return Err(stashed_errors.into_iter().next().unwrap_or_else(|| {
            LoadError::file(&descriptor.results_file, "no sheet produced any count row")
        }));
    }
    // Enough survived; surviving sheets carry the load and failed mungers
    // and sheets are downgraded to warnings.
    for error in stashed_errors {
        diags.warn(error.category, error.key, error.message);
    }

    *stage = Stage::Aggregated;
    let rows_resolved = rows.len();
    let outcome = load_vote_counts(store, rows, request.mode)?;
    *stage = Stage::Loaded;
    Ok((rows_resolved, outcome))
}

fn load_mungers(
    descriptor: &ResultsDescriptor,
    munger_dir: &Path,
) -> LoadResult<Vec<MungerConfig>> {
    let mut mungers = Vec::with_capacity(descriptor.munger_names.len());
    for name in &descriptor.munger_names {
        let path = munger_dir.join(format!("{name}.munger"));
        let file = ParamFile::from_path(&path, ErrorCategory::Munger)?;
        mungers.push(MungerConfig::from_param_file(name, &file)?);
    }
    Ok(mungers)
}

fn resolve_targets(
    store: &mut dyn CdfStore,
    descriptor: &ResultsDescriptor,
) -> LoadResult<(ElectionId, ReportingUnitId)> {
    let election_id = store.election_id(&descriptor.election)?.ok_or_else(|| {
        LoadError::ini(
            &descriptor.short_name,
            format!("unknown election: {}", descriptor.election),
        )
    })?;
    let jurisdiction_id =
        ensure_reporting_unit(store, &descriptor.jurisdiction, "jurisdiction")?;
    Ok((election_id, jurisdiction_id))
}

#[allow(clippy::too_many_arguments)]
fn load_sheet(
    store: &mut dyn CdfStore,
    request: &LoadRequest<'_>,
    munger: &MungerConfig,
    sheet: &str,
    table: &cdf_ingest::RawTable,
    results_path: &Path,
    election_id: ElectionId,
    datafile_id: cdf_model::DatafileId,
    stage: &mut Stage,
    diags: &mut Diagnostics,
) -> LoadResult<Vec<VoteCount>> {
    let mut frame = standardize(sheet, table, munger, diags)?;
    *stage = (*stage).max(Stage::Standardized);

    let mut lookups: BTreeMap<String, LookupTable> = BTreeMap::new();
    for (field, spec) in &munger.lookups {
        let lookup = read_lookup(field, spec, results_path, table, munger, diags)?;
        lookups.insert(field.clone(), lookup);
    }
    apply_formulas(
        &mut frame,
        munger,
        &request.descriptor.constants,
        &lookups,
        diags,
    )?;
    *stage = (*stage).max(Stage::FormulasApplied);

    resolve_names(&mut frame, request.dictionary, diags)?;
    let rows = build_vote_counts(&frame, store, election_id, datafile_id, diags)?;
    *stage = (*stage).max(Stage::DictionaryResolved);
    Ok(rows)
}

/// The explicit delete operation: every VoteCount for the election inside
/// the jurisdiction, located through the name-nesting closure.
pub fn remove_election_results(
    store: &mut dyn CdfStore,
    election: &str,
    jurisdiction: &str,
) -> LoadResult<usize> {
    let election_id = store
        .election_id(election)?
        .ok_or_else(|| LoadError::ini("remove", format!("unknown election: {election}")))?;
    let jurisdiction_id = store.reporting_unit_id(jurisdiction)?.ok_or_else(|| {
        LoadError::jurisdiction("remove", format!("unknown reporting unit: {jurisdiction}"))
    })?;
    let removed = store.remove_vote_counts(election_id, jurisdiction_id)?;
    info!(election, jurisdiction, removed, "vote counts removed");
    Ok(removed)
}
