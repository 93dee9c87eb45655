use crate::error::FleetError;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;

/// One parsed field value. List values accumulate across continuation lines
/// (e.g. LAG member columns that wrap).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    Text(String),
    List(Vec<String>),
}

impl RowValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RowValue::Text(s) => Some(s),
            RowValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            RowValue::List(items) => Some(items),
            RowValue::Text(_) => None,
        }
    }
}

/// One record extracted from raw command output. The loose string map stays
/// inside the parse/normalize boundary; normalizers emit typed records.
pub type Row = IndexMap<String, RowValue>;

/// Convenience accessors used by the normalizers
pub trait RowExt {
    fn text(&self, field: &str) -> Option<&str>;
    fn list(&self, field: &str) -> Option<&[String]>;
    fn has(&self, field: &str) -> bool;
}

impl RowExt for Row {
    fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(RowValue::as_text)
    }

    fn list(&self, field: &str) -> Option<&[String]> {
        self.get(field).and_then(RowValue::as_list)
    }

    fn has(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

/// Static definition of one template, compiled into a [`Template`] at
/// library construction time.
pub struct TemplateDef {
    pub name: &'static str,
    /// Regex whose match opens a new row; named captures seed the row
    pub start: &'static str,
    /// Regexes folded into the currently open row
    pub continuations: &'static [&'static str],
    /// Capture names accumulated as lists instead of set-once scalars
    pub list_fields: &'static [&'static str],
}

/// A compiled line-oriented template
///
/// Parsing walks the output line by line: a `start` match closes the open
/// row and begins a new one, continuation matches fold their captures into
/// the open row. Scalar captures are set-once so repeated block lines cannot
/// clobber earlier values; list captures append.
pub struct Template {
    pub name: &'static str,
    start: Regex,
    continuations: Vec<Regex>,
    list_fields: HashSet<&'static str>,
}

impl Template {
    /// Compile a definition. A malformed pattern is a programmer error and
    /// fails the whole run.
    pub fn compile(def: &TemplateDef) -> Result<Self, FleetError> {
        let start = Regex::new(def.start).map_err(|e| {
            FleetError::TemplateError(format!("template {}: bad start pattern: {}", def.name, e))
        })?;
        if start.capture_names().flatten().next().is_none() {
            return Err(FleetError::TemplateError(format!(
                "template {}: start pattern has no named captures",
                def.name
            )));
        }
        let mut continuations = Vec::with_capacity(def.continuations.len());
        for pattern in def.continuations {
            continuations.push(Regex::new(pattern).map_err(|e| {
                FleetError::TemplateError(format!(
                    "template {}: bad continuation pattern: {}",
                    def.name, e
                ))
            })?);
        }
        Ok(Self {
            name: def.name,
            start,
            continuations,
            list_fields: def.list_fields.iter().copied().collect(),
        })
    }

    /// Extract rows from raw output. Zero rows is a valid result.
    pub fn parse(&self, raw: &str) -> Vec<Row> {
        let mut rows: Vec<Row> = Vec::new();
        let mut open: Option<Row> = None;

        for line in raw.lines() {
            if let Some(caps) = self.start.captures(line) {
                if let Some(done) = open.take() {
                    rows.push(done);
                }
                let mut row = Row::new();
                self.fold(&mut row, &caps);
                open = Some(row);
                continue;
            }

            if let Some(row) = open.as_mut() {
                for cont in &self.continuations {
                    if let Some(caps) = cont.captures(line) {
                        self.fold(row, &caps);
                        break;
                    }
                }
            }
        }

        if let Some(done) = open.take() {
            rows.push(done);
        }
        rows
    }

    fn fold(&self, row: &mut Row, caps: &regex::Captures<'_>) {
        for name in self.start.capture_names().flatten().chain(
            self.continuations
                .iter()
                .flat_map(|re| re.capture_names().flatten()),
        ) {
            let Some(value) = caps.name(name) else {
                continue;
            };
            let value = value.as_str().trim().to_string();
            if self.list_fields.contains(name) {
                match row.get_mut(name) {
                    Some(RowValue::List(items)) => items.push(value),
                    _ => {
                        row.insert(name.to_string(), RowValue::List(vec![value]));
                    }
                }
            } else if !row.contains_key(name) {
                row.insert(name.to_string(), RowValue::Text(value));
            }
        }
    }
}
