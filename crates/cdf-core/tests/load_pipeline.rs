//! End-to-end load over a delimited precinct export.

use std::fs;
use std::path::Path;

use cdf_core::{LoadRequest, Stage, load_results_file, remove_election_results};
use cdf_model::{ContestType, Diagnostics};
use cdf_params::{Dictionary, ParamFile, ResultsDescriptor};
use cdf_store::{CdfStore, ConflictMode, MemoryStore};

const RESULTS: &str = "\
County,Precinct,Contest,Candidate,Party,Election Day,Absentee
Jones,12,Governor,SMITH JOHN,DEM,60,40
Jones,12,Governor,DOE JANE,REP,30,20
";

const MUNGER: &str = "\
[format]
file_type=flat_text
count_location=by_name
count_fields_by_name=Election Day,Absentee
noncount_header_row=0

[munge formulas]
ReportingUnit=<County>;<Precinct>
CandidateContest=<Contest>
Candidate=<Candidate>
Party=<Party>
CountItemType=<header_0>
";

const DICTIONARY: &str = "\
cdf_element\tcdf_internal_name\traw_identifier_value
ReportingUnit\tGeorgia;Jones County;Precinct 12\tJones;12
CandidateContest\tGovernor\tGovernor
Candidate\tJohn Smith\tSMITH JOHN
Candidate\tJane Doe\tDOE JANE
Party\tDemocratic Party\tDEM
Party\tRepublican Party\tREP
CountItemType\telection-day\tElection Day
CountItemType\tabsentee\tAbsentee
";

const DESCRIPTOR: &str = "\
[election_results]
results_file=ga_precincts.txt
results_short_name=ga20g_precincts
results_download_date=2020-11-21
results_source=GA Secretary of State
results_note=precinct-level export
election=2020 General
top_reporting_unit=Georgia
munger_list=ga_precincts
";

fn write_fixture(dir: &Path) {
    fs::write(dir.join("ga_precincts.txt"), RESULTS).expect("write results");
    fs::write(dir.join("ga_precincts.munger"), MUNGER).expect("write munger");
    fs::write(dir.join("dictionary.txt"), DICTIONARY).expect("write dictionary");
}

fn seeded_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_election("2020 General");
    store.add_contest("Governor", ContestType::Candidate);
    store.add_candidate("John Smith");
    store.add_candidate("Jane Doe");
    store.add_party("Democratic Party");
    store.add_party("Republican Party");
    store
}

fn total_count(store: &MemoryStore) -> i64 {
    store
        .vote_counts()
        .expect("vote counts")
        .iter()
        .map(|row| row.count)
        .sum()
}

#[test]
fn loads_resolves_and_synthesizes_totals() {
    let dir = tempfile::tempdir().expect("temp dir").keep();
    write_fixture(&dir);
    let descriptor = ResultsDescriptor::from_param_file("ga.ini", &ParamFile::parse(DESCRIPTOR))
        .expect("descriptor");
    let mut diags = Diagnostics::new();
    let dictionary =
        Dictionary::from_path(&dir.join("dictionary.txt"), &mut diags).expect("dictionary");
    assert_eq!(diags.warning_count(), 0);

    let mut store = seeded_store();
    let report = load_results_file(
        &mut store,
        &LoadRequest {
            descriptor: &descriptor,
            results_dir: &dir,
            munger_dir: &dir,
            dictionary: &dictionary,
            mode: ConflictMode::InsertIgnore,
        },
    );
    assert_eq!(report.stage_reached, Stage::Loaded, "{:?}", report.diagnostics);
    assert_eq!(report.rows_resolved, 4);

    // Two candidates x (election-day, absentee) plus one synthesized total
    // per candidate.
    let rows = store.vote_counts().expect("vote counts");
    assert_eq!(rows.len(), 6);
    assert_eq!(total_count(&store), 300);
    let totals: Vec<i64> = rows
        .iter()
        .filter(|row| row.count_item_type == "total")
        .map(|row| row.count)
        .collect();
    assert_eq!(totals.iter().sum::<i64>(), 150);

    // Reporting unit was created with its name-nesting ancestors.
    assert!(
        store
            .reporting_unit_id("Georgia;Jones County")
            .expect("lookup")
            .is_some()
    );
}

#[test]
fn a_failed_munger_does_not_discard_sibling_rows() {
    let dir = tempfile::tempdir().expect("temp dir").keep();
    write_fixture(&dir);
    // Same geometry, but skipping past EOF so every sheet comes up empty.
    let broken = MUNGER.replace("[format]\n", "[format]\nrows_to_skip=50\n");
    fs::write(dir.join("ga_broken.munger"), broken).expect("write munger");
    let text = DESCRIPTOR.replace(
        "munger_list=ga_precincts",
        "munger_list=ga_precincts,ga_broken",
    );
    let descriptor = ResultsDescriptor::from_param_file("ga.ini", &ParamFile::parse(&text))
        .expect("descriptor");
    let mut diags = Diagnostics::new();
    let dictionary =
        Dictionary::from_path(&dir.join("dictionary.txt"), &mut diags).expect("dictionary");

    let mut store = seeded_store();
    let report = load_results_file(
        &mut store,
        &LoadRequest {
            descriptor: &descriptor,
            results_dir: &dir,
            munger_dir: &dir,
            dictionary: &dictionary,
            mode: ConflictMode::InsertIgnore,
        },
    );
    assert_eq!(report.stage_reached, Stage::Loaded, "{:?}", report.diagnostics);
    assert_eq!(report.rows_resolved, 4);
    assert_eq!(total_count(&store), 300);
    // The empty munger's read failure surfaces as a warning, not a fatal.
    assert!(!report.diagnostics.has_fatal());
    assert!(
        report
            .diagnostics
            .warnings()
            .any(|warning| warning.message.contains("no sheet produced any data rows"))
    );
}

#[test]
fn reloading_the_same_file_changes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir").keep();
    write_fixture(&dir);
    let descriptor = ResultsDescriptor::from_param_file("ga.ini", &ParamFile::parse(DESCRIPTOR))
        .expect("descriptor");
    let mut diags = Diagnostics::new();
    let dictionary =
        Dictionary::from_path(&dir.join("dictionary.txt"), &mut diags).expect("dictionary");

    let mut store = seeded_store();
    let request = LoadRequest {
        descriptor: &descriptor,
        results_dir: &dir,
        munger_dir: &dir,
        dictionary: &dictionary,
        mode: ConflictMode::InsertIgnore,
    };
    let first = load_results_file(&mut store, &request);
    assert!(first.succeeded());
    let once = total_count(&store);

    let second = load_results_file(&mut store, &request);
    assert!(second.succeeded());
    let outcome = second.outcome.expect("outcome");
    assert_eq!(outcome.inserted, 0);
    assert_eq!(total_count(&store), once);
}

#[test]
fn unknown_election_errors_without_inserting() {
    let dir = tempfile::tempdir().expect("temp dir").keep();
    write_fixture(&dir);
    let text = DESCRIPTOR.replace("2020 General", "2022 General");
    let descriptor = ResultsDescriptor::from_param_file("ga.ini", &ParamFile::parse(&text))
        .expect("descriptor");
    let mut diags = Diagnostics::new();
    let dictionary =
        Dictionary::from_path(&dir.join("dictionary.txt"), &mut diags).expect("dictionary");

    let mut store = seeded_store();
    let report = load_results_file(
        &mut store,
        &LoadRequest {
            descriptor: &descriptor,
            results_dir: &dir,
            munger_dir: &dir,
            dictionary: &dictionary,
            mode: ConflictMode::InsertIgnore,
        },
    );
    assert_eq!(report.stage_reached, Stage::Errored);
    assert!(report.diagnostics.has_fatal());
    assert!(store.vote_counts().expect("vote counts").is_empty());
}

#[test]
fn remove_deletes_only_the_named_election() {
    let dir = tempfile::tempdir().expect("temp dir").keep();
    write_fixture(&dir);
    let descriptor = ResultsDescriptor::from_param_file("ga.ini", &ParamFile::parse(DESCRIPTOR))
        .expect("descriptor");
    let mut diags = Diagnostics::new();
    let dictionary =
        Dictionary::from_path(&dir.join("dictionary.txt"), &mut diags).expect("dictionary");

    let mut store = seeded_store();
    let report = load_results_file(
        &mut store,
        &LoadRequest {
            descriptor: &descriptor,
            results_dir: &dir,
            munger_dir: &dir,
            dictionary: &dictionary,
            mode: ConflictMode::InsertIgnore,
        },
    );
    assert!(report.succeeded());

    let removed = remove_election_results(&mut store, "2020 General", "Georgia")
        .expect("remove");
    assert_eq!(removed, 6);
    assert!(store.vote_counts().expect("vote counts").is_empty());
}
