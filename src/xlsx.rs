//! Read-only XLSX access: the first worksheet as a raw cell grid.
//!
//! Price books arrive as OOXML workbooks. We only ever need the raw rows of
//! the first sheet, so this loader walks the zip container directly with
//! quick-xml instead of pulling in a full spreadsheet model: shared strings
//! table, then the sheet XML, placing cells by their `r` references.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A single cell, stripped down to what the extractor needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Trimmed string form; whole numbers render without a trailing `.0`,
    /// matching how codes appear when a sheet stores them as numerics.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(t) => t.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(t) => t.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Numeric value if the cell holds one, else a lenient text parse.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(t) => t.trim().parse().ok(),
        }
    }
}

/// Load the first worksheet of an XLSX file as a row-major grid.
/// No header is assumed; every row comes back as raw cells.
pub fn load_grid(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_grid(file)
}

/// Same as [`load_grid`] but from any seekable reader.
pub fn read_grid<R: Read + Seek>(reader: R) -> Result<Vec<Vec<Cell>>> {
    let mut archive = zip::ZipArchive::new(reader)?;

    if archive.by_name("[Content_Types].xml").is_err() {
        return Err(anyhow!("not an XLSX file: missing [Content_Types].xml"));
    }

    let shared = read_shared_strings(&mut archive)?;
    let sheet_path = first_sheet_path(&mut archive)?;
    read_sheet(&mut archive, &sheet_path, &shared)
}

/// Read the shared strings table; absent table is valid (all-inline sheets).
fn read_shared_strings<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<Vec<String>> {
    let file = match archive.by_name("xl/sharedStrings.xml") {
        Ok(f) => f,
        Err(_) => return Ok(Vec::new()),
    };

    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => current.push_str(&e.unescape()?),
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"t" => in_t = false,
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Resolve the first sheet's part path via workbook.xml and its rels.
/// Falls back to the conventional path when either part is unhelpful.
fn first_sheet_path<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<String> {
    let rid = first_sheet_rid(archive)?;
    let rels = read_workbook_rels(archive)?;
    Ok(rid
        .and_then(|id| rels.get(&id).cloned())
        .unwrap_or_else(|| "xl/worksheets/sheet1.xml".to_string()))
}

fn first_sheet_rid<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<Option<String>> {
    let file = match archive.by_name("xl/workbook.xml") {
        Ok(f) => f,
        Err(_) => return Ok(None),
    };

    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"sheet" => {
                return Ok(attr(&e, b"r:id"));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
}

/// Map relationship ids to worksheet part paths.
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<HashMap<String, String>> {
    let mut rels = HashMap::new();
    let file = match archive.by_name("xl/_rels/workbook.xml.rels") {
        Ok(f) => f,
        Err(_) => return Ok(rels),
    };

    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Relationship" => {
                let id = attr(&e, b"Id");
                let target = attr(&e, b"Target");
                let rel_type = attr(&e, b"Type").unwrap_or_default();

                if let (Some(id), Some(target)) = (id, target) {
                    if rel_type.ends_with("/worksheet") {
                        // Target is relative to the xl/ folder
                        let full = if let Some(stripped) = target.strip_prefix('/') {
                            stripped.to_string()
                        } else {
                            format!("xl/{}", target)
                        };
                        rels.insert(id, full);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

fn read_sheet<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
    shared: &[String],
) -> Result<Vec<Vec<Cell>>> {
    let file = archive
        .by_name(path)
        .map_err(|_| anyhow!("missing worksheet part {path}"))?;

    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut current_row: Vec<Cell> = Vec::new();
    let mut row_target = 0usize;

    let mut cell_col: Option<usize> = None;
    let mut cell_type = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut in_inline_text = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"row" => {
                    row_target = row_index(&e).unwrap_or(rows.len());
                    current_row.clear();
                }
                b"c" => {
                    cell_col = attr(&e, b"r").and_then(|r| column_index(&r));
                    cell_type = attr(&e, b"t").unwrap_or_default();
                    value.clear();
                }
                b"v" => in_value = true,
                b"t" => in_inline_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"row" => {
                // Self-closing row: nothing in it, but it still occupies its index.
                let target = row_index(&e).unwrap_or(rows.len());
                commit_row(&mut rows, target, Vec::new());
            }
            Ok(Event::Text(e)) if in_value || in_inline_text => {
                value.push_str(&e.unescape()?);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"c" => {
                    let col = cell_col.take().unwrap_or(current_row.len());
                    let cell = make_cell(&cell_type, &value, shared);
                    place_cell(&mut current_row, col, cell);
                }
                b"row" => {
                    commit_row(&mut rows, row_target, std::mem::take(&mut current_row));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn make_cell(cell_type: &str, raw: &str, shared: &[String]) -> Cell {
    match cell_type {
        "s" => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i))
            .map(|s| Cell::Text(s.clone()))
            .unwrap_or(Cell::Empty),
        "inlineStr" | "str" => {
            if raw.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(raw.to_string())
            }
        }
        "b" => Cell::Number(if raw.trim() == "1" { 1.0 } else { 0.0 }),
        "e" => Cell::Empty,
        _ => match raw.trim().parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) if raw.trim().is_empty() => Cell::Empty,
            Err(_) => Cell::Text(raw.to_string()),
        },
    }
}

fn place_cell(row: &mut Vec<Cell>, col: usize, cell: Cell) {
    if matches!(cell, Cell::Empty) {
        return;
    }
    while row.len() < col {
        row.push(Cell::Empty);
    }
    if row.len() == col {
        row.push(cell);
    } else {
        row[col] = cell;
    }
}

/// Sheets may skip row indices entirely; keep the grid aligned with gaps.
fn commit_row(rows: &mut Vec<Vec<Cell>>, target: usize, row: Vec<Cell>) {
    while rows.len() < target {
        rows.push(Vec::new());
    }
    rows.push(row);
}

/// 0-based row index from a `<row r="N">` attribute.
fn row_index(e: &BytesStart) -> Option<usize> {
    attr(e, b"r")?.parse::<usize>().ok()?.checked_sub(1)
}

/// 0-based column index from a cell reference like `C7`.
fn column_index(cell_ref: &str) -> Option<usize> {
    let mut idx = 0usize;
    let mut seen = false;
    for c in cell_ref.chars() {
        if c.is_ascii_alphabetic() {
            idx = idx * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
            seen = true;
        } else {
            break;
        }
    }
    if seen {
        Some(idx - 1)
    } else {
        None
    }
}

fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.to_string())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    /// Build a minimal workbook in memory: shared strings + one sheet.
    fn build_xlsx(shared: &str, sheet: &str) -> Cursor<Vec<u8>> {
        let mut zw = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();

        let parts: [(&str, String); 5] = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/sharedStrings.xml",
                format!(r#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{shared}</sst>"#),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet}</sheetData></worksheet>"#),
            ),
        ];

        for (name, content) in parts {
            zw.start_file(name, opts).unwrap();
            zw.write_all(content.as_bytes()).unwrap();
        }
        zw.finish().unwrap()
    }

    #[test]
    fn shared_and_numeric_cells() {
        let cursor = build_xlsx(
            "<si><t>LIQUOR</t></si><si><t>BRAND NAME</t></si>",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1"><v>86.5</v></c></row>"#,
        );
        let grid = read_grid(cursor).unwrap();
        assert_eq!(
            grid,
            vec![vec![
                Cell::Text("LIQUOR".into()),
                Cell::Text("BRAND NAME".into()),
                Cell::Number(86.5),
            ]]
        );
    }

    #[test]
    fn sparse_rows_and_columns_keep_positions() {
        let cursor = build_xlsx(
            "",
            r#"<row r="1"><c r="C1" t="inlineStr"><is><t>WHISKY</t></is></c></row><row r="3"><c r="A3"><v>100</v></c></row>"#,
        );
        let grid = read_grid(cursor).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid[0],
            vec![Cell::Empty, Cell::Empty, Cell::Text("WHISKY".into())]
        );
        assert!(grid[1].is_empty());
        assert_eq!(grid[2], vec![Cell::Number(100.0)]);
    }

    #[test]
    fn rejects_non_xlsx_archives() {
        let mut zw = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zw.start_file("random.txt", SimpleFileOptions::default())
            .unwrap();
        zw.write_all(b"nope").unwrap();
        let cursor = zw.finish().unwrap();
        assert!(read_grid(cursor).is_err());
    }

    #[test]
    fn cell_text_renders_whole_numbers_as_codes() {
        assert_eq!(Cell::Number(101.0).to_text(), "101");
        assert_eq!(Cell::Number(86.5).to_text(), "86.5");
        assert_eq!(Cell::Text("  x  ".into()).to_text(), "x");
    }

    #[test]
    fn column_refs() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("C7"), Some(2));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("12"), None);
    }
}
