//! The munge-formula mini-language.
//!
//! A formula is literal text interleaved with field references:
//!
//! * `<field>` substitutes the field's value;
//! * `<field from section>` resolves the row's key through the
//!   `[section lookup]` table, then substitutes `field` from the matched row;
//! * `{<field>,regex}` substitutes the single capturing group of `regex`
//!   applied to the field's value. A value that does not match substitutes a
//!   diagnostic string instead of failing the load.
//!
//! Templates are compiled once per munger into a token sequence and
//! evaluated vectorized over the count frame.

use std::collections::BTreeMap;

use regex::Regex;

use cdf_ingest::LookupTable;
use cdf_model::{CdfElement, Diagnostics, ErrorCategory, LoadError, LoadResult};

use crate::frame::CountFrame;

#[derive(Debug, Clone)]
pub enum Token {
    Literal(String),
    Field(FieldRef),
}

#[derive(Debug, Clone)]
pub struct FieldRef {
    pub source: FieldSource,
    pub extract: Option<Extract>,
}

#[derive(Debug, Clone)]
pub enum FieldSource {
    /// A column of the count frame.
    Column(String),
    /// `<column from section>`: resolve through a lookup table first.
    Lookup { section: String, column: String },
}

#[derive(Debug, Clone)]
pub struct Extract {
    pattern: Regex,
    raw: String,
}

#[derive(Debug, Clone)]
pub struct Formula {
    pub element: CdfElement,
    pub tokens: Vec<Token>,
}

impl Formula {
    /// Compile a template. Brace extractions must hold exactly one capturing
    /// group; that is a configuration error, not a runtime surprise.
    pub fn parse(element: CdfElement, template: &str, munger_name: &str) -> LoadResult<Self> {
        let error = |message: String| LoadError::munger(munger_name, message);
        let mut tokens = Vec::new();
        let mut rest = template;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('{') {
                let field_start = after.trim_start();
                let Some(after_field) = field_start.strip_prefix('<') else {
                    return Err(error(format!(
                        "{element} formula: expected <field> after '{{' in {template}"
                    )));
                };
                let Some((field, after_close)) = after_field.split_once('>') else {
                    return Err(error(format!(
                        "{element} formula: unclosed <field> in {template}"
                    )));
                };
                let Some(after_comma) = after_close.trim_start().strip_prefix(',') else {
                    return Err(error(format!(
                        "{element} formula: expected ',regex' after field in {template}"
                    )));
                };
                let Some((pattern_text, after_brace)) = after_comma.split_once('}') else {
                    return Err(error(format!(
                        "{element} formula: unclosed '{{' in {template}"
                    )));
                };
                let pattern = Regex::new(pattern_text).map_err(|regex_error| {
                    error(format!(
                        "{element} formula: bad regex {pattern_text}: {regex_error}"
                    ))
                })?;
                if pattern.captures_len() != 2 {
                    return Err(error(format!(
                        "{element} formula: regex {pattern_text} must have exactly one capturing group"
                    )));
                }
                tokens.push(Token::Field(FieldRef {
                    source: parse_source(field),
                    extract: Some(Extract {
                        pattern,
                        raw: pattern_text.to_string(),
                    }),
                }));
                rest = after_brace;
            } else if let Some(after) = rest.strip_prefix('<') {
                let Some((field, after_close)) = after.split_once('>') else {
                    return Err(error(format!(
                        "{element} formula: unclosed <field> in {template}"
                    )));
                };
                tokens.push(Token::Field(FieldRef {
                    source: parse_source(field),
                    extract: None,
                }));
                rest = after_close;
            } else {
                let end = rest
                    .find(['<', '{'])
                    .unwrap_or(rest.len());
                tokens.push(Token::Literal(rest[..end].to_string()));
                rest = &rest[end..];
            }
        }
        Ok(Self { element, tokens })
    }

    /// Lookup sections this formula chains through.
    pub fn lookup_sections(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|token| match token {
                Token::Field(FieldRef {
                    source: FieldSource::Lookup { section, .. },
                    ..
                }) => Some(section.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Evaluate over the frame, one output value per row. A referenced field
    /// missing from both the frame and its lookup table is a hard failure
    /// against this element.
    pub fn evaluate(
        &self,
        frame: &CountFrame,
        lookups: &BTreeMap<String, LookupTable>,
        munger_name: &str,
        diags: &mut Diagnostics,
    ) -> LoadResult<Vec<String>> {
        let height = frame.height();
        let mut out = vec![String::new(); height];
        for token in &self.tokens {
            match token {
                Token::Literal(text) => {
                    for value in &mut out {
                        value.push_str(text);
                    }
                }
                Token::Field(field) => {
                    let values = self.field_values(field, frame, lookups, munger_name, diags)?;
                    for (value, piece) in out.iter_mut().zip(values) {
                        value.push_str(&piece);
                    }
                }
            }
        }
        Ok(out)
    }

    fn field_values(
        &self,
        field: &FieldRef,
        frame: &CountFrame,
        lookups: &BTreeMap<String, LookupTable>,
        munger_name: &str,
        diags: &mut Diagnostics,
    ) -> LoadResult<Vec<String>> {
        let element = self.element;
        let mut values = match &field.source {
            FieldSource::Column(name) => {
                if !frame.has_source_field(name) {
                    return Err(LoadError::munger(
                        munger_name,
                        format!("{element} formula references missing field {name}"),
                    ));
                }
                frame.source_values(name)?
            }
            FieldSource::Lookup { section, column } => {
                let Some(lookup) = lookups.get(section) else {
                    return Err(LoadError::munger(
                        munger_name,
                        format!("{element} formula chains through undefined lookup {section}"),
                    ));
                };
                if lookup.column_index(column).is_none() {
                    return Err(LoadError::munger(
                        munger_name,
                        format!("lookup {section} has no column {column} for {element}"),
                    ));
                }
                if !frame.has_source_field(&lookup.key_column) {
                    return Err(LoadError::munger(
                        munger_name,
                        format!(
                            "lookup {section} keys on {} which the file does not provide",
                            lookup.key_column
                        ),
                    ));
                }
                let keys = frame.source_values(&lookup.key_column)?;
                let mut missed: Vec<String> = Vec::new();
                let values: Vec<String> = keys
                    .iter()
                    .map(|key| match lookup.value(key, column) {
                        Some(value) => value.to_string(),
                        None => {
                            if !key.is_empty()
                                && missed.len() < 5
                                && !missed.contains(key)
                            {
                                missed.push(key.clone());
                            }
                            String::new()
                        }
                    })
                    .collect();
                if !missed.is_empty() {
                    diags.warn(
                        ErrorCategory::Munger,
                        munger_name,
                        format!(
                            "lookup {section} has no row for keys: {}",
                            missed.join(", ")
                        ),
                    );
                }
                values
            }
        };
        if let Some(extract) = &field.extract {
            for value in &mut values {
                *value = match extract.pattern.captures(value) {
                    Some(captures) => captures
                        .get(1)
                        .map(|group| group.as_str().to_string())
                        .unwrap_or_default(),
                    None => format!("Does not match regex {}: {value}", extract.raw),
                };
            }
        }
        Ok(values)
    }
}

fn parse_source(field: &str) -> FieldSource {
    match field.split_once(" from ") {
        Some((column, section)) => FieldSource::Lookup {
            section: section.trim().to_string(),
            column: column.trim().to_string(),
        },
        None => FieldSource::Column(field.trim().to_string()),
    }
}
