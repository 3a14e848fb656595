//! Streamed XML flattening.
//!
//! Election XML feeds nest counts in leaf elements under contest/unit
//! context. Each leaf element (no child elements) becomes one row; the row
//! carries every attribute and text value on the path to it, keyed
//! `Tag.attr` for attributes and `Tag` for element text. Column order is
//! first appearance.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use cdf_model::{LoadError, LoadResult};

use crate::table::RawTable;

struct Frame {
    values: Vec<(String, String)>,
    has_child_element: bool,
}

pub fn read_xml_table(path: &Path) -> LoadResult<RawTable> {
    let source = path.display().to_string();
    let mut reader = Reader::from_file(path)
        .map_err(|error| LoadError::file(&source, format!("cannot open xml: {error}")))?;
    reader.config_mut().trim_text(true);

    let mut headers: Vec<String> = Vec::new();
    let mut records: Vec<BTreeMap<String, String>> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|error| LoadError::file(&source, format!("malformed xml: {error}")))?;
        match event {
            Event::Start(start) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_child_element = true;
                }
                let values = element_values(&source, &start)?;
                stack.push(Frame {
                    values,
                    has_child_element: false,
                });
            }
            Event::Empty(start) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_child_element = true;
                }
                let values = element_values(&source, &start)?;
                emit_row(&stack, &values, &mut headers, &mut records);
            }
            Event::Text(text) => {
                let value = text
                    .xml_content()
                    .map_err(|error| LoadError::file(&source, format!("bad xml text: {error}")))?
                    .trim()
                    .to_string();
                if !value.is_empty()
                    && let Some(frame) = stack.last_mut()
                {
                    let tag = frame
                        .values
                        .first()
                        .map(|(key, _)| key.split('.').next().unwrap_or(key).to_string());
                    // Frame values always start with the synthetic tag marker.
                    if let Some(tag) = tag {
                        frame.values.push((tag, value));
                    }
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else { continue };
                if !frame.has_child_element {
                    emit_row(&stack, &frame.values, &mut headers, &mut records);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let rows = records
        .into_iter()
        .map(|record| {
            headers
                .iter()
                .map(|header| record.get(header).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(RawTable {
        headers,
        rows,
        ..RawTable::default()
    })
}

/// Attribute values of one element, keyed `Tag.attr`. The first entry is a
/// synthetic `Tag._` marker carrying the tag name so text events can key
/// themselves; it is dropped before emission if empty.
fn element_values(source: &str, start: &BytesStart<'_>) -> LoadResult<Vec<(String, String)>> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut values = vec![(format!("{tag}._"), String::new())];
    for attribute in start.attributes() {
        let attribute = attribute
            .map_err(|error| LoadError::file(source, format!("bad xml attribute: {error}")))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|error| LoadError::file(source, format!("bad xml attribute: {error}")))?
            .into_owned();
        values.push((format!("{tag}.{key}"), value));
    }
    Ok(values)
}

fn emit_row(
    stack: &[Frame],
    leaf_values: &[(String, String)],
    headers: &mut Vec<String>,
    records: &mut Vec<BTreeMap<String, String>>,
) {
    let mut record = BTreeMap::new();
    for frame in stack {
        insert_values(&frame.values, &mut record, headers);
    }
    insert_values(leaf_values, &mut record, headers);
    if !record.is_empty() {
        records.push(record);
    }
}

fn insert_values(
    values: &[(String, String)],
    record: &mut BTreeMap<String, String>,
    headers: &mut Vec<String>,
) {
    for (key, value) in values {
        if key.ends_with("._") && value.is_empty() {
            continue;
        }
        if !headers.iter().any(|header| header == key) {
            headers.push(key.clone());
        }
        record.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<ElectionResult>
  <Contest name="Governor">
    <Choice name="Smith" party="REP">
      <VoteType name="Election Day" votes="1204"/>
      <VoteType name="Absentee" votes="310"/>
    </Choice>
  </Contest>
</ElectionResult>
"#;

    #[test]
    fn flattens_leaf_elements_with_ancestor_context() {
        let dir = tempfile::tempdir().expect("temp dir").keep();
        let path = dir.join("results.xml");
        fs::write(&path, SAMPLE).expect("write xml");
        let table = read_xml_table(&path).expect("xml table");
        assert_eq!(table.rows.len(), 2);
        let contest = table.column_index("Contest.name").expect("contest column");
        let votes = table.column_index("VoteType.votes").expect("votes column");
        assert_eq!(table.rows[0][contest], "Governor");
        assert_eq!(table.rows[0][votes], "1204");
        assert_eq!(table.rows[1][votes], "310");
    }

    #[test]
    fn element_text_becomes_a_tag_column() {
        let dir = tempfile::tempdir().expect("temp dir").keep();
        let path = dir.join("r.xml");
        fs::write(
            &path,
            "<Results><Unit><Name>Precinct 4</Name><Votes>12</Votes></Unit></Results>",
        )
        .expect("write xml");
        let table = read_xml_table(&path).expect("xml table");
        let name = table.column_index("Name").expect("name column");
        let votes = table.column_index("Votes").expect("votes column");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][name], "Precinct 4");
        assert_eq!(table.rows[1][votes], "12");
    }
}
