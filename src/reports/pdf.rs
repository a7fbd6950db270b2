//! PDF rendering of the parcels report with `printpdf`.
//!
//! DejaVu Sans is embedded in the binary and in every document, so names in
//! any script it covers come out as written.

use printpdf::{IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::error::AppError;
use crate::reports::export::ReportRow;

static FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const TITLE: &str = "Parcels Report";
const TITLE_SIZE: f32 = 18.0;
const HEADER_SIZE: f32 = 8.0;
const TEXT_SIZE: f32 = 7.0;
const ROW_HEIGHT: f32 = 5.0;
const FIRST_ROW_Y: f32 = 270.0;

/// Left edge (mm) and character budget of each column.
const COLUMNS: [(f32, usize); 6] = [
    (MARGIN, 38),
    (68.0, 20),
    (103.0, 20),
    (138.0, 12),
    (160.0, 10),
    (180.0, 12),
];

pub fn render_pdf(rows: &[ReportRow]) -> Result<Vec<u8>, AppError> {
    let (doc, page, layer) = PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
    let font = doc.add_external_font(FONT).map_err(pdf_error)?;

    for (index, page_rows) in paginate(rows).into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page).get_layer(layer)
        } else {
            let title = format!("Page {}", index + 1);
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), title);
            doc.get_page(page).get_layer(layer)
        };

        if index == 0 {
            layer.use_text(TITLE, TITLE_SIZE, Mm(80.0), Mm(PAGE_HEIGHT - 15.0), &font);
        }
        write_page(&layer, &font, page_rows);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

/// Rows split into pages; an empty report is still one page of headers.
fn paginate(rows: &[ReportRow]) -> Vec<&[ReportRow]> {
    let per_page = ((FIRST_ROW_Y - ROW_HEIGHT - MARGIN) / ROW_HEIGHT) as usize;
    let mut pages: Vec<&[ReportRow]> = rows.chunks(per_page).collect();
    if pages.is_empty() {
        pages.push(&[]);
    }
    pages
}

fn write_page(layer: &PdfLayerReference, font: &IndirectFontRef, rows: &[ReportRow]) {
    let mut y = FIRST_ROW_Y;
    for ((x, width), header) in COLUMNS.iter().zip(ReportRow::HEADERS) {
        layer.use_text(fit(header, *width), HEADER_SIZE, Mm(*x), Mm(y), font);
    }

    for row in rows {
        y -= ROW_HEIGHT;
        for ((x, width), cell) in COLUMNS.iter().zip(row.cells()) {
            layer.use_text(fit(cell, *width), TEXT_SIZE, Mm(*x), Mm(y), font);
        }
    }
}

fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(width.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

fn pdf_error(err: printpdf::Error) -> AppError {
    AppError::Internal(format!("failed to render pdf report: {err}"))
}
