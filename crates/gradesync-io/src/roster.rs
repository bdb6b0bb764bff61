//! Roster files: delimited text and spreadsheets.
//!
//! A roster is read into a [`RosterTable`] that keeps every original column.
//! Identifiers are kept exactly as written; normalization only happens when
//! matching. The filled table is always written to a new file next to the
//! input (see [`output_path`]).

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use encoding_rs::Encoding;

use gradesync_core::model::RosterEntry;

use crate::atomic;
use crate::error::InputError;

/// Supported roster file formats, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Csv,
    Tsv,
    Xlsx,
    Xls,
}

impl RosterFormat {
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            _ => Err(InputError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }

    /// Legacy `.xls` input is written back as `.xlsx`.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Xlsx | Self::Xls => "xlsx",
        }
    }

    fn is_spreadsheet(self) -> bool {
        matches!(self, Self::Xlsx | Self::Xls)
    }
}

/// Column bindings and text format for reading and writing a roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterOptions {
    pub id_column: String,
    pub name_column: Option<String>,
    pub mark_column: String,
    pub simplify: bool,
    /// Text encoding of delimited files, used for reading and writing.
    pub encoding: &'static Encoding,
    /// Field separator of `.csv` files. `.tsv` always uses a tab.
    pub separator: u8,
    /// Decimal separator used when writing marks to delimited files.
    pub decimal_separator: char,
}

impl RosterOptions {
    /// UTF-8, comma separated, `.` decimals.
    pub fn new(id_column: impl Into<String>, mark_column: impl Into<String>) -> Self {
        Self {
            id_column: id_column.into(),
            name_column: None,
            mark_column: mark_column.into(),
            simplify: false,
            encoding: encoding_rs::UTF_8,
            separator: b',',
            decimal_separator: '.',
        }
    }
}

/// One roster cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::from_text(s),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Text(dt.to_string()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
            Data::Error(e) => Cell::Text(format!("#ERR:{e:?}")),
        }
    }

    /// Text form; integral numbers print without a fractional part.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{n:.0}"),
            Cell::Number(n) => n.to_string(),
        }
    }

    fn delimited_text(&self, decimal_separator: char) -> String {
        match self {
            Cell::Number(_) if decimal_separator != '.' => {
                self.text().replace('.', &decimal_separator.to_string())
            }
            _ => self.text(),
        }
    }
}

/// A roster held in memory with its original columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterTable {
    source: PathBuf,
    format: RosterFormat,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RosterTable {
    /// Read a roster file, choosing the reader by extension.
    pub fn read(path: &Path, options: &RosterOptions) -> Result<Self> {
        let format = RosterFormat::from_path(path)?;
        if !path.exists() {
            return Err(InputError::MissingFile(path.to_path_buf()).into());
        }
        let (headers, rows) = if format.is_spreadsheet() {
            read_workbook(path)?
        } else {
            let delimiter = match format {
                RosterFormat::Tsv => b'\t',
                _ => options.separator,
            };
            read_delimited(path, options.encoding, delimiter)?
        };

        tracing::info!(
            "read roster {} ({} rows, {} columns)",
            path.display(),
            rows.len(),
            headers.len()
        );
        Ok(Self {
            source: path.to_path_buf(),
            format,
            headers,
            rows,
        })
    }

    pub fn format(&self) -> RosterFormat {
        self.format
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name.trim())
    }

    fn require_column(&self, name: &str) -> Result<usize, InputError> {
        self.column(name).ok_or_else(|| InputError::MissingColumn {
            path: self.source.clone(),
            column: name.to_string(),
        })
    }

    /// One entry per row with its current mark, if numeric.
    pub fn entries(&self, options: &RosterOptions) -> Result<Vec<RosterEntry>, InputError> {
        let id_col = self.require_column(&options.id_column)?;
        let name_col = options.name_column.as_deref().and_then(|n| self.column(n));
        let mark_col = self.column(&options.mark_column);

        Ok(self
            .rows
            .iter()
            .map(|row| RosterEntry {
                roster_id: row[id_col].text(),
                name: name_col
                    .map(|c| row[c].text())
                    .filter(|n| !n.trim().is_empty()),
                mark: mark_col.and_then(|c| match &row[c] {
                    Cell::Number(n) => Some(*n),
                    Cell::Text(s) => s.trim().replace(',', ".").parse().ok(),
                    Cell::Empty => None,
                }),
            })
            .collect())
    }

    /// Write entry marks into `mark_column`, creating it if absent.
    pub fn set_marks(&mut self, mark_column: &str, entries: &[RosterEntry]) {
        let col = match self.column(mark_column) {
            Some(col) => col,
            None => {
                tracing::info!("adding mark column '{mark_column}'");
                self.headers.push(mark_column.to_string());
                for row in &mut self.rows {
                    row.push(Cell::Empty);
                }
                self.headers.len() - 1
            }
        };
        for (row, entry) in self.rows.iter_mut().zip(entries) {
            row[col] = entry.mark.map(Cell::Number).unwrap_or(Cell::Empty);
        }
    }

    /// Keep only id, name and mark columns, and strip a leading `#` from the
    /// mark header so import tools accept it.
    ///
    /// Skipped with a warning when no usable name column is configured.
    pub fn simplify(&mut self, options: &RosterOptions) {
        let Some(name_column) = options.name_column.as_deref() else {
            tracing::warn!("simplify requested but no name column was given; skipping");
            return;
        };
        if self.column(name_column).is_none() {
            tracing::warn!("name column '{name_column}' not found in roster; skipping simplify");
            return;
        }

        let mut keep: Vec<usize> = Vec::with_capacity(3);
        for name in [options.id_column.as_str(), name_column, options.mark_column.as_str()] {
            if let Some(col) = self.column(name) {
                if !keep.contains(&col) {
                    keep.push(col);
                }
            }
        }
        tracing::info!(
            "simplifying roster to columns: {}, {}, {}",
            options.id_column,
            name_column,
            options.mark_column
        );

        self.headers = keep.iter().map(|&c| self.headers[c].clone()).collect();
        self.rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&c| row[c].clone()).collect())
            .collect();

        if let Some(col) = self.column(&options.mark_column) {
            let header = &mut self.headers[col];
            if header.starts_with('#') {
                let clean = header.trim_start_matches('#').trim().to_string();
                tracing::info!("renamed column '{header}' to '{clean}' to allow import");
                *header = clean;
            }
        }
    }

    /// Write the table to `path` in the format implied by its extension.
    pub fn write(&self, path: &Path, options: &RosterOptions) -> Result<()> {
        let bytes = match RosterFormat::from_path(path)? {
            RosterFormat::Csv => {
                self.delimited_bytes(options, options.separator, csv::QuoteStyle::Necessary)?
            }
            RosterFormat::Tsv => {
                self.delimited_bytes(options, b'\t', csv::QuoteStyle::NonNumeric)?
            }
            RosterFormat::Xlsx | RosterFormat::Xls => self.workbook_bytes()?,
        };
        atomic::write_bytes(path, &bytes)
            .with_context(|| format!("failed to write roster {}", path.display()))?;
        tracing::info!("saved roster to {}", path.display());
        Ok(())
    }

    fn delimited_bytes(
        &self,
        options: &RosterOptions,
        delimiter: u8,
        quote_style: csv::QuoteStyle,
    ) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .quote_style(quote_style)
            .from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.delimited_text(options.decimal_separator)))?;
        }
        let text = writer
            .into_inner()
            .map_err(|e| anyhow!("failed to finish roster text: {}", e.error()))?;
        let text = String::from_utf8(text).context("roster text is not valid UTF-8")?;

        let (encoded, _, unmappable) = options.encoding.encode(&text);
        if unmappable {
            tracing::warn!(
                "some characters cannot be represented in {}; they were replaced",
                options.encoding.name()
            );
        }
        Ok(encoded.into_owned())
    }

    fn workbook_bytes(&self) -> Result<Vec<u8>> {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| anyhow!("new workbook has no sheet"))?;
        sheet.set_name("Sheet1");

        for (col, header) in self.headers.iter().enumerate() {
            sheet
                .get_cell_mut(((col as u32) + 1, 1))
                .set_value(header.as_str());
        }
        for (row_idx, row) in self.rows.iter().enumerate() {
            let row_num = row_idx as u32 + 2;
            for (col, cell) in row.iter().enumerate() {
                let target = sheet.get_cell_mut(((col as u32) + 1, row_num));
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => {
                        target.set_value(s.as_str());
                    }
                    Cell::Number(n) => {
                        target.set_value_number(*n);
                    }
                }
            }
        }

        let mut buf = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf)
            .map_err(|e| anyhow!("failed to build xlsx: {e}"))?;
        Ok(buf.into_inner())
    }
}

/// `<stem>_with_marks.<ext>` next to the input.
pub fn output_path(input: &Path) -> Result<PathBuf, InputError> {
    let format = RosterFormat::from_path(input)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(input.with_file_name(format!(
        "{stem}_with_marks.{}",
        format.output_extension()
    )))
}

type Grid = (Vec<String>, Vec<Vec<Cell>>);

fn read_delimited(path: &Path, encoding: &'static Encoding, delimiter: u8) -> Result<Grid> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read roster {}", path.display()))?;
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(
            "roster {} contains bytes that are not valid {}; they were replaced",
            path.display(),
            used.name()
        );
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for (line, record) in records.enumerate() {
        let record = record
            .with_context(|| format!("failed to read row {} of {}", line + 2, path.display()))?;
        let cells = record.iter().map(Cell::from_text).collect();
        rows.push(fit_row(cells, headers.len(), path, line + 2)?);
    }
    Ok((headers, rows))
}

fn read_workbook(path: &Path) -> Result<Grid> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow!("failed to open workbook {}: {e}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("workbook {} has no sheets", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| anyhow!("failed to read sheet '{sheet_name}' of {}: {e}", path.display()))?;

    let mut grid = range.rows();
    let headers: Vec<String> = grid
        .next()
        .map(|row| row.iter().map(|d| Cell::from_data(d).text().trim().to_string()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<Cell>> = grid
        .enumerate()
        .map(|(line, row)| {
            let cells = row.iter().map(Cell::from_data).collect();
            fit_row(cells, headers.len(), path, line + 2)
        })
        .collect::<Result<_, InputError>>()?;
    Ok((headers, rows))
}

/// Pad a row to the header width. Trailing empty cells past the header are
/// dropped; any other value there is an error naming the 1-based row.
fn fit_row(
    mut row: Vec<Cell>,
    width: usize,
    path: &Path,
    line: usize,
) -> Result<Vec<Cell>, InputError> {
    if row.len() > width {
        if row[width..].iter().any(|c| *c != Cell::Empty) {
            return Err(InputError::ExtraFields {
                path: path.to_path_buf(),
                row: line,
                fields: row.len(),
                columns: width,
            });
        }
        row.truncate(width);
    }
    row.resize(width, Cell::Empty);
    Ok(row)
}
