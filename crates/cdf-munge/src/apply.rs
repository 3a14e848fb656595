//! Apply munge formulas to a standardized count frame.
//!
//! Each covered element gains a raw column: either the element's formula
//! evaluated row-wise, or the descriptor constant broadcast when the munger
//! declares the element `constant_over_file`. Raw values are whitespace
//! compressed, `[ignore]` rows are filtered out, and the source columns are
//! dropped once every formula has run.

use std::collections::BTreeMap;

use tracing::debug;

use cdf_ingest::LookupTable;
use cdf_model::{CdfElement, Diagnostics, LoadError, LoadResult};
use cdf_params::MungerConfig;

use crate::formula::Formula;
use crate::frame::CountFrame;
use crate::text::compress_whitespace;

pub fn apply_formulas(
    frame: &mut CountFrame,
    munger: &MungerConfig,
    constants: &BTreeMap<CdfElement, String>,
    lookups: &BTreeMap<String, LookupTable>,
    diags: &mut Diagnostics,
) -> LoadResult<()> {
    for element in CdfElement::ALL {
        if munger.constant_over_file.contains(&element) {
            let Some(value) = constants.get(&element) else {
                return Err(LoadError::ini(
                    &munger.name,
                    format!("{element} is constant_over_file but the results file has no value for it"),
                ));
            };
            let value = compress_whitespace(value);
            frame.set_raw_column(element, vec![value; frame.height()])?;
        } else if let Some(template) = munger.formulas.get(&element) {
            let formula = Formula::parse(element, template, &munger.name)?;
            let mut values = formula.evaluate(frame, lookups, &munger.name, diags)?;
            for value in &mut values {
                *value = compress_whitespace(value);
            }
            frame.set_raw_column(element, values)?;
        }
    }

    for (element, unwanted) in &munger.ignore {
        if !frame.has_raw_column(*element) {
            continue;
        }
        let values = frame.raw_values(*element)?;
        let mask: Vec<bool> = values
            .iter()
            .map(|value| !unwanted.contains(value))
            .collect();
        let dropped = mask.iter().filter(|keep| !**keep).count();
        if dropped > 0 {
            debug!(munger = %munger.name, %element, dropped, "filtered ignored rows");
            frame.retain_rows(&mask)?;
        }
    }

    frame.drop_source_columns()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, NamedFrom, Series};

    use cdf_model::ErrorCategory;
    use cdf_params::ParamFile;

    use super::*;

    fn munger(text: &str) -> MungerConfig {
        MungerConfig::from_param_file("test", &ParamFile::parse(text)).expect("munger")
    }

    fn frame(columns: &[(&str, &[&str])], counts: &[i64]) -> CountFrame {
        let mut series: Vec<polars::prelude::Column> = columns
            .iter()
            .map(|(name, values)| {
                Series::new(
                    format!("{name}_SOURCE").as_str().into(),
                    values.iter().map(|value| (*value).to_string()).collect::<Vec<_>>(),
                )
                .into()
            })
            .collect();
        series.push(Series::new("Count".into(), counts.to_vec()).into());
        CountFrame {
            data: DataFrame::new(series).expect("frame"),
        }
    }

    #[test]
    fn formulas_produce_compressed_raw_columns() {
        let munger = munger(
            "[format]\nfile_type=flat_text\ncount_location=by_number\ncount_column_numbers=3\n\n\
             [munge formulas]\nReportingUnit=<County>;<Precinct>\nCandidateContest=<Contest>\n\
             Candidate=<Name>\nCountItemType=total\n",
        );
        let mut frame = frame(
            &[
                ("County", &["  Jones "]),
                ("Precinct", &[" 12  "]),
                ("Contest", &["Governor"]),
                ("Name", &["SMITH   JOHN"]),
            ],
            &[100],
        );
        let mut diags = Diagnostics::new();
        apply_formulas(
            &mut frame,
            &munger,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &mut diags,
        )
        .expect("apply");
        assert_eq!(
            frame.raw_values(CdfElement::ReportingUnit).expect("ru"),
            vec!["Jones;12"]
        );
        assert_eq!(
            frame.raw_values(CdfElement::Candidate).expect("candidate"),
            vec!["SMITH JOHN"]
        );
        assert_eq!(
            frame.raw_values(CdfElement::CountItemType).expect("cit"),
            vec!["total"]
        );
        assert!(frame.source_fields().is_empty());
    }

    #[test]
    fn constant_over_file_pulls_the_descriptor_value() {
        let munger = munger(
            "[format]\nfile_type=flat_text\ncount_location=by_number\ncount_column_numbers=1\n\
             constant_over_file=CandidateContest\n\n\
             [munge formulas]\nReportingUnit=<County>\nCandidate=<Name>\nCountItemType=total\n",
        );
        let constants: BTreeMap<CdfElement, String> =
            [(CdfElement::CandidateContest, "US Senate".to_string())]
                .into_iter()
                .collect();
        let mut frame = frame(&[("County", &["Jones", "Lee"]), ("Name", &["A", "B"])], &[1, 2]);
        let mut diags = Diagnostics::new();
        apply_formulas(&mut frame, &munger, &constants, &BTreeMap::new(), &mut diags)
            .expect("apply");
        assert_eq!(
            frame
                .raw_values(CdfElement::CandidateContest)
                .expect("contest"),
            vec!["US Senate", "US Senate"]
        );
    }

    #[test]
    fn missing_constant_is_an_ini_error() {
        let munger = munger(
            "[format]\nfile_type=flat_text\ncount_location=by_number\ncount_column_numbers=1\n\
             constant_over_file=CandidateContest\n\n\
             [munge formulas]\nReportingUnit=<County>\nCandidate=<Name>\nCountItemType=total\n",
        );
        let mut frame = frame(&[("County", &["Jones"]), ("Name", &["A"])], &[1]);
        let mut diags = Diagnostics::new();
        let error = apply_formulas(
            &mut frame,
            &munger,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &mut diags,
        )
        .expect_err("no constant");
        assert_eq!(error.category, ErrorCategory::Ini);
    }

    #[test]
    fn ignore_section_filters_rows() {
        let munger = munger(
            "[format]\nfile_type=flat_text\ncount_location=by_number\ncount_column_numbers=2\n\n\
             [munge formulas]\nReportingUnit=<County>\nCandidateContest=c\nCandidate=<Name>\nCountItemType=total\n\n\
             [ignore]\nCandidate=Registered Voters,Ballots Cast\n",
        );
        let mut frame = frame(
            &[
                ("County", &["Jones", "Jones", "Jones"]),
                ("Name", &["Smith", "Registered Voters", "Ballots Cast"]),
            ],
            &[10, 500, 400],
        );
        let mut diags = Diagnostics::new();
        apply_formulas(
            &mut frame,
            &munger,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &mut diags,
        )
        .expect("apply");
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.counts().expect("counts"), vec![10]);
    }
}
