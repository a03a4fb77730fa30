//! JCAMP-DX document model and parser.
//!
//! A document is a sequence of labelled data records (`##LABEL= value`).
//! Records between `##TITLE=` and `##END=` form a block; a link block with
//! `##BLOCKS=` nests further blocks, which are flattened here. Inside a block
//! an `##NTUPLES=` section holds pages (`##PAGE=`), each with a
//! `##DATA TABLE=` whose Y symbol (`R`, `I`) names the ordinate. A plain
//! `##XYDATA=` record is read as a single `R` page.

use crate::asdf::decode_ordinates;
use nmrdata_core::NmrDataError;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JcampError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JCAMP parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Invalid JCAMP document: {0}")]
    Invalid(String),
    #[error(transparent)]
    Data(#[from] NmrDataError),
}

impl From<JcampError> for NmrDataError {
    fn from(e: JcampError) -> Self {
        match e {
            JcampError::Io(e) => NmrDataError::Io(e),
            JcampError::Data(e) => e,
            other => NmrDataError::HeaderParse(other.to_string()),
        }
    }
}

/// Canonical form of a label: upper case with spaces, `-`, `/` and `_`
/// removed, so `$SW_h` and `$SW-H` compare equal.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '/' | '_'))
        .flat_map(char::to_uppercase)
        .collect()
}

fn strip_brackets(s: &str) -> String {
    s.trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim()
        .to_string()
}

/// Canonical nucleus name for `<1H>`, `^13C`, `C13` and friends.
pub fn to_nucleus_name(s: &str) -> String {
    let name = strip_brackets(s).trim_start_matches('^').to_string();
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    let letters: String = name.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if digits.is_empty() || letters.is_empty() || digits.len() + letters.len() != name.len() {
        return name;
    }
    let mut element = letters.to_ascii_lowercase();
    if let Some(first) = element.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    format!("{}{}", digits, element)
}

// ─── Records ────────────────────────────────────────────────────────────────

/// One labelled data record.
#[derive(Debug, Clone, PartialEq)]
pub struct JcampRecord {
    pub label: String,
    pub normalized: String,
    /// Raw value; continuation lines are joined with `\n`.
    pub value: String,
    /// Line of the `##` that opened the record.
    pub line: usize,
}

impl JcampRecord {
    pub fn new(label: &str, value: &str, line: usize) -> Self {
        Self {
            label: label.trim().to_string(),
            normalized: normalize_label(label),
            value: value.trim().to_string(),
            line,
        }
    }

    /// First line of the value without `<>` brackets.
    pub fn string(&self) -> String {
        strip_brackets(self.value.lines().next().unwrap_or_default())
    }

    /// The value on one line, as listed by `pars`.
    pub fn display_value(&self) -> String {
        self.value.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Individual values: comma separated, or a `(0..n)` array whose
    /// elements follow on continuation lines.
    pub fn strings(&self) -> Vec<String> {
        let value = self.value.trim();
        if value.starts_with('(') && value.contains("..") {
            if let Some(close) = value.find(')') {
                return value[close + 1..]
                    .split_whitespace()
                    .map(strip_brackets)
                    .collect();
            }
        }
        value.split(',').map(strip_brackets).collect()
    }

    pub fn string_at(&self, index: usize) -> Option<String> {
        self.strings().into_iter().nth(index)
    }

    pub fn double_at(&self, index: usize) -> Option<f64> {
        self.string_at(index).and_then(|s| s.parse::<f64>().ok())
    }

    pub fn double(&self) -> Option<f64> {
        self.double_at(0)
    }

    pub fn doubles(&self) -> Vec<f64> {
        self.strings()
            .iter()
            .filter_map(|s| s.parse::<f64>().ok())
            .collect()
    }

    pub fn int_at(&self, index: usize) -> Option<i64> {
        let s = self.string_at(index)?;
        s.parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(|v| v as i64))
    }
}

// ─── Pages ──────────────────────────────────────────────────────────────────

/// One page of an `NTUPLES` section, or a plain `XYDATA` table.
#[derive(Debug, Clone, PartialEq)]
pub struct JcampPage {
    /// Value of `##PAGE=` (empty for `XYDATA`).
    pub title: String,
    /// Variable list, e.g. `(X++(R..R)), XYDATA`.
    pub table: String,
    pub y_symbol: String,
    data: Vec<String>,
    first_data_line: usize,
}

impl JcampPage {
    fn from_table(title: &str, record: &JcampRecord) -> Self {
        let mut lines = record.value.lines();
        let table = lines.next().unwrap_or_default().trim().to_string();
        let data: Vec<String> = lines.map(str::to_string).collect();
        Self {
            title: title.to_string(),
            y_symbol: y_symbol_of(&table),
            table,
            data,
            first_data_line: record.line + 1,
        }
    }

    /// Decode the page's ordinates without scaling.
    pub fn raw_values(&self) -> Result<Vec<f64>, JcampError> {
        decode_ordinates(self.data.iter().map(String::as_str), self.first_data_line)
    }
}

/// Y symbol of a variable list: `(X++(R..R))` gives `R`; `Y` maps to `R`.
fn y_symbol_of(table: &str) -> String {
    let symbol = table
        .find("++(")
        .map(|start| &table[start + 3..])
        .and_then(|rest| rest.find("..").map(|end| rest[..end].trim().to_string()))
        .unwrap_or_else(|| "Y".to_string());
    if symbol.eq_ignore_ascii_case("Y") {
        "R".to_string()
    } else {
        symbol.to_ascii_uppercase()
    }
}

// ─── Blocks ─────────────────────────────────────────────────────────────────

/// Records and pages of one block. Repeated labels keep their first value.
#[derive(Debug, Clone, Default)]
pub struct JcampBlock {
    records: Vec<JcampRecord>,
    index: HashMap<String, usize>,
    pages: Vec<JcampPage>,
    in_ntuples: bool,
    page_title: Option<String>,
}

impl JcampBlock {
    fn push_record(&mut self, record: JcampRecord) {
        if self.index.contains_key(&record.normalized) {
            log::debug!("Ignoring repeated record ##{}", record.label);
            return;
        }
        self.index
            .insert(record.normalized.clone(), self.records.len());
        self.records.push(record);
    }

    fn accept(&mut self, record: JcampRecord) {
        match record.normalized.as_str() {
            "NTUPLES" => {
                self.in_ntuples = true;
                self.push_record(record);
            }
            "ENDNTUPLES" => {
                self.in_ntuples = false;
                self.page_title = None;
            }
            "PAGE" if self.in_ntuples => {
                self.page_title = Some(record.value.clone());
            }
            "DATATABLE" => {
                let title = self.page_title.clone().unwrap_or_default();
                self.pages.push(JcampPage::from_table(&title, &record));
            }
            "XYDATA" if !self.in_ntuples => {
                self.pages.push(JcampPage::from_table("", &record));
            }
            _ => self.push_record(record),
        }
    }

    pub fn records(&self) -> &[JcampRecord] {
        &self.records
    }

    pub fn get(&self, label: &str) -> Option<&JcampRecord> {
        self.index
            .get(&normalize_label(label))
            .map(|&i| &self.records[i])
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// The first of `labels` present in the block.
    pub fn optional(&self, labels: &[&str]) -> Option<&JcampRecord> {
        labels.iter().find_map(|l| self.get(l))
    }

    pub fn double_at(&self, label: &str, index: usize) -> Option<f64> {
        self.get(label).and_then(|r| r.double_at(index))
    }

    pub fn int_at(&self, label: &str, index: usize) -> Option<i64> {
        self.get(label).and_then(|r| r.int_at(index))
    }

    pub fn pages(&self) -> &[JcampPage] {
        &self.pages
    }

    pub fn pages_for_y_symbol(&self, symbol: &str) -> Vec<&JcampPage> {
        self.pages
            .iter()
            .filter(|p| p.y_symbol.eq_ignore_ascii_case(symbol))
            .collect()
    }

    /// Scale factor of `symbol`: its `##FACTOR=` entry in an NTUPLES
    /// section, `##YFACTOR=` for plain XYDATA, otherwise 1.
    pub fn factor(&self, symbol: &str) -> f64 {
        if let (Some(symbols), Some(factors)) = (self.get("SYMBOL"), self.get("FACTOR")) {
            let position = symbols
                .strings()
                .iter()
                .position(|s| s.eq_ignore_ascii_case(symbol));
            if let Some(f) = position.and_then(|i| factors.double_at(i)) {
                return f;
            }
        }
        self.get("YFACTOR").and_then(JcampRecord::double).unwrap_or(1.0)
    }

    /// Decoded ordinates of `page`, scaled by the symbol's factor.
    pub fn page_values(&self, page: &JcampPage) -> Result<Vec<f64>, JcampError> {
        let factor = self.factor(&page.y_symbol);
        let mut values = page.raw_values()?;
        if factor != 1.0 {
            values.iter_mut().for_each(|v| *v *= factor);
        }
        Ok(values)
    }

    /// `##DATA TYPE=` of the block, e.g. `NMR FID`.
    pub fn data_type(&self) -> Option<String> {
        self.get("DATA TYPE").map(JcampRecord::string)
    }
}

// ─── Document ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct JcampDocument {
    root: JcampBlock,
    blocks: Vec<JcampBlock>,
}

impl JcampDocument {
    pub fn read(path: &Path) -> Result<Self, JcampError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    pub fn parse(text: &str) -> Result<Self, JcampError> {
        let mut builder = Builder::default();
        let mut pending: Option<(String, String, usize)> = None;

        for (n, raw) in text.lines().enumerate() {
            let line_no = n + 1;
            let line = match raw.find("$$") {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix("##") {
                if let Some((label, value, at)) = pending.take() {
                    builder.record(JcampRecord::new(&label, &value, at));
                }
                let eq = rest.find('=').ok_or_else(|| JcampError::Parse {
                    line: line_no,
                    message: format!("record without '=': {}", trimmed),
                })?;
                pending = Some((rest[..eq].to_string(), rest[eq + 1..].to_string(), line_no));
            } else if let Some((_, value, _)) = pending.as_mut() {
                value.push('\n');
                value.push_str(line.trim_end());
            } else if !line.trim().is_empty() {
                log::debug!("Skipping text outside a record at line {}", line_no);
            }
        }
        if let Some((label, value, at)) = pending.take() {
            builder.record(JcampRecord::new(&label, &value, at));
        }
        builder.finish()
    }

    /// Document-level records.
    pub fn records(&self) -> &[JcampRecord] {
        self.root.records()
    }

    pub fn get(&self, label: &str) -> Option<&JcampRecord> {
        self.root.get(label)
    }

    pub fn blocks(&self) -> &[JcampBlock] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

#[derive(Default)]
struct Builder {
    root: Option<JcampBlock>,
    stack: Vec<JcampBlock>,
    blocks: Vec<JcampBlock>,
    root_closed: bool,
}

impl Builder {
    fn current(&mut self) -> &mut JcampBlock {
        match self.stack.last_mut() {
            Some(block) => block,
            None => self.root.get_or_insert_with(JcampBlock::default),
        }
    }

    fn record(&mut self, record: JcampRecord) {
        match record.normalized.as_str() {
            "TITLE" if self.root.is_some() && !self.root_closed => {
                let mut block = JcampBlock::default();
                block.push_record(record);
                self.stack.push(block);
            }
            "END" => match self.stack.pop() {
                Some(block) => self.blocks.push(block),
                None => self.root_closed = true,
            },
            _ => self.current().accept(record),
        }
    }

    fn finish(mut self) -> Result<JcampDocument, JcampError> {
        while let Some(block) = self.stack.pop() {
            log::warn!("JCAMP block without ##END=, closing it");
            self.blocks.push(block);
        }
        let root = self
            .root
            .ok_or_else(|| JcampError::Invalid("no labelled records".into()))?;
        let mut blocks = self.blocks;
        if blocks.is_empty() {
            blocks.push(root.clone());
        }
        Ok(JcampDocument { root, blocks })
    }
}
