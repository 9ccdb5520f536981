use super::ooxml::{attr, event_text, relationship_id, relationships, Package};
use crate::registry::DocumentParser;
use crate::table::render_table;
use docchat_core::{DocumentFormat, LoadError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

const FORMAT: DocumentFormat = DocumentFormat::Xlsx;
const FALLBACK_SHEET: &str = "xl/worksheets/sheet1.xml";

/// Sheet bounds of the file format: column `XFD`, row 1048576.
const MAX_COLUMNS: u32 = 16_384;
const MAX_ROWS: u32 = 1_048_576;

/// Excel workbooks: the first worksheet, first row as header, rendered as an
/// indexed table.
pub struct XlsxParser;

impl DocumentParser for XlsxParser {
    fn format(&self) -> DocumentFormat {
        FORMAT
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError> {
        let mut package = Package::open(bytes, FORMAT)?;

        let sheet_path = first_sheet_path(&mut package)?;
        let shared = match package.part("xl/sharedStrings.xml")? {
            Some(xml) => shared_strings(&xml)?,
            None => Vec::new(),
        };
        let sheet = package.required_part(&sheet_path)?;
        let grid = cells(&sheet, &shared)?;

        Ok(to_table(grid))
    }
}

type Grid = BTreeMap<u32, BTreeMap<u32, String>>;

/// Resolve the first `<sheet>` of the workbook through its relationship id.
fn first_sheet_path(package: &mut Package<'_>) -> Result<String, LoadError> {
    let Some(workbook) = package.part("xl/workbook.xml")? else {
        return Ok(FALLBACK_SHEET.to_string());
    };

    let mut rel_id = None;
    let mut reader = Reader::from_str(&workbook);
    loop {
        match reader.read_event().map_err(|e| LoadError::parse(FORMAT, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                rel_id = relationship_id(&e, FORMAT)?;
                break;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let (Some(rel_id), Some(rels)) = (rel_id, package.part("xl/_rels/workbook.xml.rels")?) else {
        return Ok(FALLBACK_SHEET.to_string());
    };
    Ok(relationships(&rels, "xl", FORMAT)?
        .remove(&rel_id)
        .unwrap_or_else(|| FALLBACK_SHEET.to_string()))
}

/// Every `<si>` entry, rich-text runs concatenated.
fn shared_strings(xml: &str) -> Result<Vec<String>, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| LoadError::parse(FORMAT, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            other if in_text => {
                if let Some(chunk) = event_text(&other, FORMAT)? {
                    current.push_str(&chunk);
                }
            }
            _ => {}
        }
    }

    Ok(strings)
}

/// Zero-based `(row, column)` of an `A1`-style reference. Malformed
/// references are `None`; references past the sheet bounds are an error.
fn cell_position(reference: &str) -> Result<Option<(u32, u32)>, LoadError> {
    let Some(split) = reference.find(|c: char| c.is_ascii_digit()) else {
        return Ok(None);
    };
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(None);
    }
    let Ok(row) = digits.parse::<u32>() else {
        return Ok(None);
    };

    let mut col: u32 = 0;
    for c in letters.chars() {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = match col.checked_mul(26).and_then(|v| v.checked_add(digit)) {
            Some(v) if v <= MAX_COLUMNS => v,
            _ => return Err(out_of_bounds(reference)),
        };
    }
    if row > MAX_ROWS {
        return Err(out_of_bounds(reference));
    }
    Ok(row.checked_sub(1).map(|r| (r, col - 1)))
}

fn out_of_bounds(reference: &str) -> LoadError {
    LoadError::parse(
        FORMAT,
        format!("cell reference '{reference}' is outside the sheet bounds"),
    )
}

struct PendingCell {
    row: u32,
    col: u32,
    kind: Option<String>,
    value: String,
}

fn start_cell(e: &BytesStart<'_>, row: u32, next_col: u32) -> Result<PendingCell, LoadError> {
    let position = match attr(e, b"r", FORMAT)? {
        Some(reference) => cell_position(&reference)?,
        None => None,
    };
    let (row, col) = position.unwrap_or((row, next_col));
    if row >= MAX_ROWS || col >= MAX_COLUMNS {
        return Err(LoadError::parse(
            FORMAT,
            format!(
                "cell at row {} column {} is outside the sheet bounds",
                u64::from(row) + 1,
                u64::from(col) + 1
            ),
        ));
    }
    Ok(PendingCell {
        row,
        col,
        kind: attr(e, b"t", FORMAT)?,
        value: String::new(),
    })
}

fn resolve_cell(cell: &PendingCell, shared: &[String]) -> Result<String, LoadError> {
    match cell.kind.as_deref() {
        Some("s") => {
            let idx: usize = cell
                .value
                .trim()
                .parse()
                .map_err(|_| {
                    LoadError::parse(
                        FORMAT,
                        format!("bad shared string index '{}'", cell.value),
                    )
                })?;
            shared.get(idx).cloned().ok_or_else(|| {
                LoadError::parse(FORMAT, format!("shared string {idx} out of range"))
            })
        }
        Some("b") => Ok(if cell.value.trim() == "1" { "True" } else { "False" }.to_string()),
        _ => Ok(cell.value.clone()),
    }
}

fn cells(xml: &str, shared: &[String]) -> Result<Grid, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut grid = Grid::new();
    let mut row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut cell: Option<PendingCell> = None;
    let mut capture = false;

    loop {
        match reader.read_event().map_err(|e| LoadError::parse(FORMAT, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    if let Some(r) = attr(&e, b"r", FORMAT)?.and_then(|r| r.parse::<u32>().ok()) {
                        row = r.saturating_sub(1);
                    }
                    next_col = 0;
                }
                b"c" => cell = Some(start_cell(&e, row, next_col)?),
                b"v" | b"t" => capture = cell.is_some(),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let empty = start_cell(&e, row, next_col)?;
                next_col = empty.col + 1;
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if let Some(done) = cell.take() {
                        next_col = done.col + 1;
                        let value = resolve_cell(&done, shared)?;
                        if !value.is_empty() {
                            grid.entry(done.row).or_default().insert(done.col, value);
                        }
                    }
                }
                b"row" => row = row.saturating_add(1),
                _ => {}
            },
            Event::Eof => break,
            other if capture => {
                if let (Some(chunk), Some(pending)) = (event_text(&other, FORMAT)?, cell.as_mut()) {
                    pending.value.push_str(&chunk);
                }
            }
            _ => {}
        }
    }

    Ok(grid)
}

/// First populated row is the header; columns span to the widest row.
fn to_table(grid: Grid) -> String {
    let Some(width) = grid
        .values()
        .filter_map(|cols| cols.keys().next_back())
        .max()
        .map(|max_col| max_col + 1)
    else {
        return render_table(&[], &[]);
    };

    let mut rows = grid.into_values();
    let header_cells = rows.next().unwrap_or_default();
    let headers: Vec<String> = (0..width)
        .map(|c| {
            header_cells
                .get(&c)
                .cloned()
                .unwrap_or_else(|| format!("Unnamed: {c}"))
        })
        .collect();

    let body: Vec<Vec<String>> = rows
        .map(|cols| {
            (0..width)
                .map(|c| cols.get(&c).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    render_table(&headers, &body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::parsers::ooxml::fixture::package;

    const WORKBOOK: &str = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
        xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
      <sheets><sheet name="Sales" sheetId="1" r:id="rId7"/></sheets>
    </workbook>"#;

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
      <Relationship Id="rId1" Target="styles.xml"/>
      <Relationship Id="rId7" Target="worksheets/data.xml"/>
    </Relationships>"#;

    const SHARED: &str = r#"<sst><si><t>region</t></si><si><t>total</t></si>
      <si><r><t>No</t></r><r><t>rth</t></r></si><si><t>South</t></si></sst>"#;

    const SHEET: &str = r#"<worksheet><sheetData>
      <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>audited</t></is></c></row>
      <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>1250</v></c><c r="C2" t="b"><v>1</v></c></row>
      <row r="3"><c r="A3" t="s"><v>3</v></c><c r="C3" t="b"><v>0</v></c></row>
    </sheetData></worksheet>"#;

    #[test]
    fn test_first_sheet_via_relationships() {
        let bytes = package(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/data.xml", SHEET),
        ]);
        let text = XlsxParser.parse(&bytes).unwrap();
        assert_eq!(
            text,
            "   region  total  audited\n\
             0   North   1250     True\n\
             1   South    NaN    False"
        );
    }

    #[test]
    fn test_fallback_sheet_without_workbook() {
        let sheet = r#"<worksheet><sheetData>
          <row><c t="inlineStr"><is><t>a</t></is></c><c t="inlineStr"><is><t>b</t></is></c></row>
          <row><c><v>1</v></c><c><v>2.5</v></c></row>
        </sheetData></worksheet>"#;
        let bytes = package(&[("xl/worksheets/sheet1.xml", sheet)]);
        let text = XlsxParser.parse(&bytes).unwrap();
        assert_eq!(text, "   a    b\n0  1  2.5");
    }

    #[test]
    fn test_empty_sheet() {
        let bytes = package(&[(
            "xl/worksheets/sheet1.xml",
            "<worksheet><sheetData/></worksheet>",
        )]);
        assert_eq!(
            XlsxParser.parse(&bytes).unwrap(),
            "Empty DataFrame\nColumns: []\nIndex: []"
        );
    }

    #[test]
    fn test_cell_position() {
        assert_eq!(cell_position("A1").unwrap(), Some((0, 0)));
        assert_eq!(cell_position("C12").unwrap(), Some((11, 2)));
        assert_eq!(cell_position("AA3").unwrap(), Some((2, 26)));
        assert_eq!(cell_position("XFD1048576").unwrap(), Some((1_048_575, 16_383)));
        assert_eq!(cell_position("12").unwrap(), None);
        assert_eq!(cell_position("A0").unwrap(), None);
    }

    #[test]
    fn test_cell_position_past_sheet_bounds() {
        assert!(cell_position("XFE1").is_err());
        assert!(cell_position("A1048577").is_err());
        // Long column names must not overflow.
        assert!(cell_position("AAAAAAAAAA1").is_err());
    }

    #[test]
    fn test_out_of_bounds_cell_is_parse_failure() {
        for reference in ["AAAAAAAAAA1", "AAAAA1"] {
            let sheet = format!(
                r#"<worksheet><sheetData>
                  <row r="1"><c r="A1"><v>1</v></c><c r="{reference}"><v>2</v></c></row>
                  <row r="2"><c r="A2"><v>3</v></c></row>
                </sheetData></worksheet>"#
            );
            let bytes = package(&[("xl/worksheets/sheet1.xml", sheet.as_str())]);
            let err = XlsxParser.parse(&bytes).unwrap_err();
            assert!(
                matches!(err, LoadError::ParseFailure { format: DocumentFormat::Xlsx, .. }),
                "{reference}"
            );
        }
    }
}
