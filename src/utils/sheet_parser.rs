//! Heuristic reader for vendor quotation spreadsheets.
//!
//! Vendor price lists rarely agree on a layout: title blocks above the
//! table, "Cat. No." vs "Catalogue Number", prices with currency noise.
//! The parser hunts for the header row by keyword, maps columns to fields
//! by synonym, and falls back to fixed positions when no header is found.
//! PDFs have no grid; only their text is kept and scanned for a CAS number.

use calamine::{Data, Reader, open_workbook_auto};
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Rows scanned when looking for the header.
const HEADER_SCAN_ROWS: usize = 25;
/// Distinct fields a row must name to count as a header.
const MIN_HEADER_FIELDS: usize = 2;

// Column widths of the quotations and product_data tables, in characters.
const ITEM_NAME_CHARS: usize = 512;
const NAME_CHARS: usize = 255;
const MAKE_CHARS: usize = 120;
const CATALOG_NO_CHARS: usize = 120;
const CAS_NO_CHARS: usize = 50;
/// MEDIUMTEXT limit
const PARSED_TEXT_BYTES: usize = 16_777_215;

// letters may touch the number ("CAS64-17-5"), digits may not
static CAS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{2,7}-\d{2}-\d)(?:\D|$)").expect("CAS pattern is valid"));

#[derive(Debug, Display)]
pub enum SheetError {
    #[display(fmt = "unsupported spreadsheet type: {}", _0)]
    Unsupported(String),
    #[display(fmt = "workbook has no sheets")]
    NoSheet,
    #[display(fmt = "excel read failed: {}", _0)]
    Excel(calamine::Error),
    #[display(fmt = "csv read failed: {}", _0)]
    Csv(csv::Error),
    #[display(fmt = "pdf read failed: {}", _0)]
    Pdf(pdf_extract::OutputError),
}

impl std::error::Error for SheetError {}

impl From<calamine::Error> for SheetError {
    fn from(e: calamine::Error) -> Self {
        SheetError::Excel(e)
    }
}

impl From<csv::Error> for SheetError {
    fn from(e: csv::Error) -> Self {
        SheetError::Csv(e)
    }
}

impl From<pdf_extract::OutputError> for SheetError {
    fn from(e: pdf_extract::OutputError) -> Self {
        SheetError::Pdf(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ItemName,
    Make,
    CatalogNo,
    Rate,
    Qty,
    CasNo,
    Brand,
    Instrument,
    Chemical,
    Reagent,
    Kit,
    Media,
}

impl Field {
    const ALL: [Field; 12] = [
        Field::ItemName,
        Field::Make,
        Field::CatalogNo,
        Field::Rate,
        Field::Qty,
        Field::CasNo,
        Field::Brand,
        Field::Instrument,
        Field::Chemical,
        Field::Reagent,
        Field::Kit,
        Field::Media,
    ];

    /// Normalised header spellings seen in vendor sheets.
    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::ItemName => &[
                "item",
                "items",
                "item name",
                "item description",
                "description",
                "description of goods",
                "product",
                "product name",
                "product description",
                "name",
                "particulars",
                "material",
            ],
            Field::Make => &["make", "manufacturer", "mfr", "mfg", "company"],
            Field::CatalogNo => &[
                "cat",
                "cat no",
                "cat number",
                "catalog",
                "catalog no",
                "catalog number",
                "catalogue",
                "catalogue no",
                "catalogue number",
                "code",
                "item code",
                "product code",
                "part no",
                "part number",
                "sku",
                "ref no",
            ],
            Field::Rate => &[
                "rate",
                "price",
                "unit price",
                "unit rate",
                "rate per unit",
                "list price",
                "mrp",
                "unit cost",
            ],
            Field::Qty => &["qty", "quantity", "qnty"],
            Field::CasNo => &["cas", "cas no", "cas number"],
            Field::Brand => &["brand", "brand name"],
            Field::Instrument => &["instrument"],
            Field::Chemical => &["chemical"],
            Field::Reagent => &["reagent"],
            Field::Kit => &["kit"],
            Field::Media => &["media"],
        }
    }
}

/// Words that disqualify a loose (containment) header match.
const LOOSE_MATCH_STOPWORDS: &[&str] = &["hsn", "sac", "gst", "tax", "total", "amount", "discount", "disc"];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductRow {
    /// Zero-based row in the source grid
    pub row_index: u32,
    pub item_name: Option<String>,
    pub make: Option<String>,
    pub catalog_no: Option<String>,
    pub rate: Option<f64>,
    pub qty: Option<f64>,
}

/// Quotation-level fields taken from the first product row.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetSummary {
    pub brand: Option<String>,
    pub make: Option<String>,
    pub cas_no: Option<String>,
    pub product_name: Option<String>,
    pub instrument: Option<String>,
    pub chemical: Option<String>,
    pub reagent: Option<String>,
    pub kit: Option<String>,
    pub media: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ParsedSheet {
    pub header_row: Option<usize>,
    pub columns: HashMap<Field, usize>,
    pub parsed_text: String,
    pub summary: SheetSummary,
    pub products: Vec<ProductRow>,
}

pub fn is_spreadsheet(ext: &str) -> bool {
    matches!(ext, "xls" | "xlsx" | "csv")
}

/// Spreadsheets and PDFs; images are stored untouched.
pub fn is_parseable(ext: &str) -> bool {
    is_spreadsheet(ext) || ext == "pdf"
}

/// At most `max_chars` characters, cut on a char boundary.
pub fn clip(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}

fn clip_bytes(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// Lower case, punctuation to spaces, whitespace collapsed.
pub fn normalize_header(cell: &str) -> String {
    cell.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn exact_field(normalized: &str) -> Option<Field> {
    Field::ALL
        .into_iter()
        .find(|f| f.synonyms().contains(&normalized))
}

fn contains_words(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Exact synonym first, then the longest synonym contained as whole words.
pub fn match_header(cell: &str) -> Option<Field> {
    let normalized = normalize_header(cell);
    if normalized.is_empty() {
        return None;
    }

    if let Some(field) = exact_field(&normalized) {
        return Some(field);
    }

    let words: Vec<&str> = normalized.split(' ').collect();
    if words.iter().any(|w| LOOSE_MATCH_STOPWORDS.contains(w)) {
        return None;
    }

    let mut best: Option<(usize, Field)> = None;
    for field in Field::ALL {
        for synonym in field.synonyms() {
            let needle: Vec<&str> = synonym.split(' ').collect();
            if contains_words(&words, &needle) && best.is_none_or(|(len, _)| synonym.len() > len) {
                best = Some((synonym.len(), field));
            }
        }
    }

    best.map(|(_, field)| field)
}

fn distinct_fields<F>(row: &[String], matcher: F) -> usize
where
    F: Fn(&str) -> Option<Field>,
{
    let mut seen: Vec<Field> = Vec::new();
    for field in row.iter().filter_map(|c| matcher(c.as_str())) {
        if !seen.contains(&field) {
            seen.push(field);
        }
    }
    seen.len()
}

/// Highest-scoring row among the first few; earliest wins ties.
pub fn find_header_row(grid: &[Vec<String>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;

    for (idx, row) in grid.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let score = distinct_fields(row, match_header);
        if score >= MIN_HEADER_FIELDS && best.is_none_or(|(s, _)| score > s) {
            best = Some((score, idx));
        }
    }

    best.map(|(_, idx)| idx)
}

/// Each field keeps the first column that names it.
pub fn map_columns(header: &[String]) -> HashMap<Field, usize> {
    let mut columns = HashMap::new();
    for (col, cell) in header.iter().enumerate() {
        if let Some(field) = match_header(cell) {
            columns.entry(field).or_insert(col);
        }
    }
    columns
}

fn positional_columns(width: usize) -> HashMap<Field, usize> {
    [Field::ItemName, Field::Make, Field::CatalogNo, Field::Rate]
        .into_iter()
        .enumerate()
        .filter(|(col, _)| *col < width)
        .map(|(col, field)| (field, col))
        .collect()
}

/// Price or quantity with currency markers and separators stripped.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_lowercase();
    for marker in ["/-", "inr", "rs.", "rs"] {
        s = s.replace(marker, "");
    }
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | '€' | ',') && !c.is_whitespace())
        .collect();

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn find_cas(text: &str) -> Option<String> {
    CAS_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn cell<'a>(row: &'a [String], columns: &HashMap<Field, usize>, field: Field) -> Option<&'a str> {
    columns
        .get(&field)
        .and_then(|&col| row.get(col))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Chemical/reagent style sheets name the product in their own column.
fn item_cell<'a>(row: &'a [String], columns: &HashMap<Field, usize>) -> Option<&'a str> {
    [
        Field::ItemName,
        Field::Chemical,
        Field::Reagent,
        Field::Kit,
        Field::Media,
        Field::Instrument,
    ]
    .into_iter()
    .find_map(|field| cell(row, columns, field))
}

fn normalized_cells(row: &[String]) -> Vec<String> {
    row.iter()
        .map(|c| normalize_header(c))
        .filter(|c| !c.is_empty())
        .collect()
}

fn is_total_row(item: Option<&str>) -> bool {
    item.map(normalize_header).is_some_and(|n| {
        n.starts_with("total") || n.starts_with("sub total") || n.starts_with("subtotal") || n.starts_with("grand total")
    })
}

pub fn parse_grid(grid: &[Vec<String>]) -> ParsedSheet {
    let parsed_text = grid
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n");
    let parsed_text = clip_bytes(parsed_text, PARSED_TEXT_BYTES);

    let header_row = find_header_row(grid);
    let (columns, data_start) = match header_row {
        Some(idx) => (map_columns(&grid[idx]), idx + 1),
        None => {
            let width = grid.iter().map(Vec::len).max().unwrap_or(0);
            (positional_columns(width), 0)
        }
    };

    let header_cells = header_row.map(|idx| normalized_cells(&grid[idx]));

    let mut products: Vec<ProductRow> = Vec::new();
    let mut summary = SheetSummary::default();

    for (idx, row) in grid.iter().enumerate().skip(data_start) {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        // vendors repeat the header on every printed page
        if let Some(header) = &header_cells {
            if *header == normalized_cells(row)
                || distinct_fields(row, |c| exact_field(&normalize_header(c))) >= MIN_HEADER_FIELDS
            {
                continue;
            }
        }

        let item_name = item_cell(row, &columns);
        let catalog_no = cell(row, &columns, Field::CatalogNo);
        if (item_name.is_none() && catalog_no.is_none()) || is_total_row(item_name) {
            continue;
        }

        if products.is_empty() {
            let pick = |field: Field, width: usize| cell(row, &columns, field).map(|v| clip(v, width));
            summary = SheetSummary {
                brand: pick(Field::Brand, MAKE_CHARS),
                make: pick(Field::Make, MAKE_CHARS),
                cas_no: pick(Field::CasNo, CAS_NO_CHARS),
                product_name: item_name.map(|v| clip(v, NAME_CHARS)),
                instrument: pick(Field::Instrument, NAME_CHARS),
                chemical: pick(Field::Chemical, NAME_CHARS),
                reagent: pick(Field::Reagent, NAME_CHARS),
                kit: pick(Field::Kit, NAME_CHARS),
                media: pick(Field::Media, NAME_CHARS),
            };
        }

        products.push(ProductRow {
            row_index: idx as u32,
            item_name: item_name.map(|v| clip(v, ITEM_NAME_CHARS)),
            make: cell(row, &columns, Field::Make)
                .or_else(|| cell(row, &columns, Field::Brand))
                .map(|v| clip(v, MAKE_CHARS)),
            catalog_no: catalog_no.map(|v| clip(v, CATALOG_NO_CHARS)),
            rate: cell(row, &columns, Field::Rate).and_then(parse_amount),
            qty: cell(row, &columns, Field::Qty).and_then(parse_amount),
        });
    }

    if summary.cas_no.is_none() {
        summary.cas_no = find_cas(&parsed_text);
    }

    ParsedSheet {
        header_row,
        columns,
        parsed_text,
        summary,
        products,
    }
}

/// Text-only documents: no rows, just the text and a CAS number found in it.
pub fn parse_text(text: &str) -> ParsedSheet {
    let parsed_text = clip_bytes(text.trim().to_string(), PARSED_TEXT_BYTES);
    let summary = SheetSummary {
        cas_no: find_cas(&parsed_text),
        ..SheetSummary::default()
    };

    ParsedSheet {
        parsed_text,
        summary,
        ..ParsedSheet::default()
    }
}

fn cell_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // catalog numbers come back as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

pub fn read_excel(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(0).ok_or(SheetError::NoSheet)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Vec<String>>, SheetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid = Vec::new();
    for record in rdr.records() {
        grid.push(record?.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(grid)
}

pub fn read_pdf_text(path: &Path) -> Result<String, SheetError> {
    Ok(pdf_extract::extract_text(path)?)
}

pub fn parse_file(path: &Path, ext: &str) -> Result<ParsedSheet, SheetError> {
    let grid = match ext {
        "pdf" => return Ok(parse_text(&read_pdf_text(path)?)),
        "xls" | "xlsx" => read_excel(path)?,
        "csv" => read_csv(std::fs::File::open(path).map_err(|e| SheetError::Csv(e.into()))?)?,
        other => return Err(SheetError::Unsupported(other.to_string())),
    };

    Ok(parse_grid(&grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_cells_normalize() {
        assert_eq!(normalize_header("  Cat. No. "), "cat no");
        assert_eq!(normalize_header("Rate (₹)"), "rate");
        assert_eq!(normalize_header("Unit-Price/INR"), "unit price inr");
    }

    #[test]
    fn header_synonyms_resolve() {
        assert_eq!(match_header("Cat. No."), Some(Field::CatalogNo));
        assert_eq!(match_header("Catalogue Number"), Some(Field::CatalogNo));
        assert_eq!(match_header("Product Code"), Some(Field::CatalogNo));
        assert_eq!(match_header("Unit Price (INR)"), Some(Field::Rate));
        assert_eq!(match_header("Qty."), Some(Field::Qty));
        assert_eq!(match_header("Description of Item"), Some(Field::ItemName));
        assert_eq!(match_header("CAS No"), Some(Field::CasNo));
        assert_eq!(match_header("Manufacturer"), Some(Field::Make));
    }

    #[test]
    fn tax_and_total_columns_are_not_guessed() {
        assert_eq!(match_header("HSN Code"), None);
        assert_eq!(match_header("Total Amount"), None);
        assert_eq!(match_header("GST %"), None);
        assert_eq!(match_header("S.No"), None);
        assert_eq!(match_header(""), None);
    }

    #[test]
    fn header_found_below_title_block() {
        let g = grid(&[
            &["QUOTATION", "", "", ""],
            &["To: Lab Stores", "", "", ""],
            &["S.No", "Item Description", "Make", "Cat No", "Qty", "Rate"],
            &["1", "Ethanol absolute", "Merck", "100983", "2", "4,520.00"],
        ]);
        assert_eq!(find_header_row(&g), Some(2));
    }

    #[test]
    fn a_row_naming_one_field_is_not_a_header() {
        let g = grid(&[&["Price list"], &["Ethanol", "Merck"]]);
        assert_eq!(find_header_row(&g), None);
    }

    #[test]
    fn extracts_products_after_header() {
        let g = grid(&[
            &["Vendor: Acme Scientific"],
            &["Sr", "Product Name", "Brand", "Catalogue No", "Pack Qty", "Unit Price"],
            &["1", "Ethanol absolute", "Merck", "100983", "1", "Rs. 4,520/-"],
            &["", "", "", "", "", ""],
            &["2", "Agar powder", "HiMedia", "RM026", "2", "₹ 1,150.50"],
            &["", "Total", "", "", "", "5670.50"],
        ]);

        let parsed = parse_grid(&g);
        assert_eq!(parsed.header_row, Some(1));
        assert_eq!(parsed.columns.get(&Field::CatalogNo), Some(&3));
        assert_eq!(parsed.columns.get(&Field::Qty), Some(&4));
        assert_eq!(parsed.products.len(), 2);

        let first = &parsed.products[0];
        assert_eq!(first.row_index, 2);
        assert_eq!(first.item_name.as_deref(), Some("Ethanol absolute"));
        assert_eq!(first.make.as_deref(), Some("Merck"));
        assert_eq!(first.catalog_no.as_deref(), Some("100983"));
        assert_eq!(first.rate, Some(4520.0));
        assert_eq!(first.qty, Some(1.0));

        assert_eq!(parsed.products[1].rate, Some(1150.5));
        assert_eq!(parsed.summary.product_name.as_deref(), Some("Ethanol absolute"));
        assert_eq!(parsed.summary.brand.as_deref(), Some("Merck"));
    }

    #[test]
    fn repeated_page_headers_are_skipped() {
        let g = grid(&[
            &["Item", "Make", "Rate"],
            &["Beaker 250ml", "Borosil", "180"],
            &["Item", "Make", "Rate"],
            &["Beaker 500ml", "Borosil", "240"],
        ]);
        let parsed = parse_grid(&g);
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.products[1].row_index, 3);
    }

    #[test]
    fn positional_defaults_without_header() {
        let g = grid(&[
            &["Pipette tips 200ul", "Tarsons", "521000", "650"],
            &["Microfuge tube", "Tarsons", "500010", "not quoted"],
        ]);
        let parsed = parse_grid(&g);
        assert_eq!(parsed.header_row, None);
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.products[0].row_index, 0);
        assert_eq!(parsed.products[0].catalog_no.as_deref(), Some("521000"));
        assert_eq!(parsed.products[0].rate, Some(650.0));
        assert_eq!(parsed.products[1].rate, None);
    }

    #[test]
    fn cas_falls_back_to_text_scan() {
        let g = grid(&[
            &["Item", "Make", "Remarks"],
            &["Ethanol", "Merck", "CAS 64-17-5, AR grade"],
        ]);
        let parsed = parse_grid(&g);
        assert_eq!(parsed.summary.cas_no.as_deref(), Some("64-17-5"));
    }

    #[test]
    fn cas_column_wins_over_text_scan() {
        let g = grid(&[
            &["Chemical", "CAS No", "Rate"],
            &["Acetone", "67-64-1", "900"],
        ]);
        let parsed = parse_grid(&g);
        assert_eq!(parsed.summary.cas_no.as_deref(), Some("67-64-1"));
        assert_eq!(parsed.summary.chemical.as_deref(), Some("Acetone"));
    }

    #[test]
    fn amounts_tolerate_currency_noise() {
        assert_eq!(parse_amount("Rs. 1,250.00/-"), Some(1250.0));
        assert_eq!(parse_amount("1,250.50 INR"), Some(1250.5));
        assert_eq!(parse_amount("$ 99"), Some(99.0));
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn parsed_text_keeps_every_row() {
        let g = grid(&[&["a", "b"], &["c", "d"]]);
        assert_eq!(parse_grid(&g).parsed_text, "a\tb\nc\td");
    }

    #[test]
    fn reads_ragged_csv() {
        let data = "Item,Make,Rate\nFunnel,Borosil,120\nFlask\n";
        let g = read_csv(data.as_bytes()).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g[2], vec!["Flask".to_string()]);

        let parsed = parse_grid(&g);
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.products[1].make, None);
    }

    #[test]
    fn only_spreadsheets_are_parsed() {
        assert!(is_spreadsheet("xlsx"));
        assert!(is_spreadsheet("csv"));
        assert!(!is_spreadsheet("pdf"));
        assert!(is_parseable("pdf"));
        assert!(!is_parseable("png"));
    }

    #[test]
    fn header_search_stops_after_scan_window() {
        let filler = vec!["Terms and conditions apply".to_string()];
        let header: Vec<String> = ["Item", "Make", "Rate"].iter().map(|c| c.to_string()).collect();

        let mut g = vec![filler.clone(); HEADER_SCAN_ROWS];
        g.push(header.clone());
        assert_eq!(find_header_row(&g), None);

        g.remove(0);
        assert_eq!(find_header_row(&g), Some(HEADER_SCAN_ROWS - 1));
    }

    #[test]
    fn earliest_row_wins_a_tie() {
        let g = grid(&[
            &["Quotation"],
            &["Item", "Rate"],
            &["Make", "Qty"],
            &["Product", "Brand", "Cat No"],
        ]);
        assert_eq!(find_header_row(&g), Some(3));
        assert_eq!(find_header_row(&g[..3]), Some(1));
    }

    #[test]
    fn repeated_loose_headers_are_skipped() {
        let g = grid(&[
            &["Description of Item", "Cat. No.", "Unit Price (INR)"],
            &["Sodium chloride", "S9888", "2,300"],
            &["Description of Item", "Cat. No.", "Unit Price (INR)"],
            &["Potassium chloride", "P9541", "3,100"],
        ]);
        let parsed = parse_grid(&g);
        assert_eq!(parsed.header_row, Some(0));
        assert_eq!(parsed.products.len(), 2);
        assert_eq!(parsed.products[1].item_name.as_deref(), Some("Potassium chloride"));
        assert_eq!(parsed.products[1].row_index, 3);
    }

    #[test]
    fn long_cells_fit_their_columns() {
        let item = "é".repeat(600);
        let brand = "B".repeat(200);
        let catalog = "9".repeat(130);
        let g = vec![
            vec!["Item".to_string(), "Brand".to_string(), "Cat No".to_string(), "CAS No".to_string()],
            vec![item.clone(), brand.clone(), catalog, "x".repeat(60)],
        ];

        let parsed = parse_grid(&g);
        let summary = &parsed.summary;
        assert_eq!(summary.product_name.as_deref().map(|v| v.chars().count()), Some(255));
        assert_eq!(summary.brand.as_deref().map(str::len), Some(120));
        assert_eq!(summary.cas_no.as_deref().map(str::len), Some(50));

        let row = &parsed.products[0];
        assert_eq!(row.item_name.as_deref().map(|v| v.chars().count()), Some(512));
        assert_eq!(row.make.as_deref().map(str::len), Some(120));
        assert_eq!(row.catalog_no.as_deref().map(str::len), Some(120));
        assert!(item.starts_with(row.item_name.as_deref().unwrap()));
    }

    #[test]
    fn clipping_respects_char_boundaries() {
        assert_eq!(clip("Merck", 10), "Merck");
        assert_eq!(clip("₹₹₹", 2), "₹₹");
        assert_eq!(clip_bytes("aé".to_string(), 2), "a");
        assert_eq!(clip_bytes("abc".to_string(), 3), "abc");
    }

    #[test]
    fn cas_may_touch_letters_but_not_digits() {
        assert_eq!(find_cas("CAS64-17-5").as_deref(), Some("64-17-5"));
        assert_eq!(find_cas("64-17-5").as_deref(), Some("64-17-5"));
        assert_eq!(find_cas("Lot 2024-11-30"), None);
        assert_eq!(find_cas("ref 123456789-12-3"), None);
        assert_eq!(find_cas("no numbers"), None);
    }

    #[test]
    fn document_text_is_scanned_for_cas() {
        let parsed = parse_text("  Acetone AR 2.5L\nCAS No: 67-64-1\n  ");
        assert_eq!(parsed.parsed_text, "Acetone AR 2.5L\nCAS No: 67-64-1");
        assert_eq!(parsed.summary.cas_no.as_deref(), Some("67-64-1"));
        assert!(parsed.products.is_empty());
        assert_eq!(parsed.header_row, None);
    }

    #[test]
    fn unreadable_pdf_is_an_error() {
        let dir = std::env::temp_dir().join(format!("office_desk_pdf_{}", uuid::Uuid::new_v4().to_simple()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("quote.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        assert!(matches!(parse_file(&path, "pdf"), Err(SheetError::Pdf(_))));

        std::fs::remove_dir_all(dir).ok();
    }
}
