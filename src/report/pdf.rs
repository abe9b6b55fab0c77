use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{tabulate, ReportRenderer, ReportRow};
use crate::error::ReportError;
use crate::tls::CertificateSnapshot;

const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const TOP_MM: f32 = 260.0;
const BOTTOM_MM: f32 = 25.0;
const ROW_HEIGHT_MM: f32 = 6.0;
const COLUMN_X_MM: [f32; 5] = [15.0, 70.0, 95.0, 120.0, 150.0];
const LAYER: &str = "Layer 1";

/// Letter-size PDF: title, generation time, one row per domain, summary line
#[derive(Debug, Clone, Default)]
pub struct PdfReport;

impl PdfReport {
    pub fn new() -> Self {
        Self
    }
}

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PageCursor<'_> {
    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size.into(), Mm(x.into()), Mm(self.y.into()), font);
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
        if self.y < BOTTOM_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM.into()), Mm(PAGE_HEIGHT_MM.into()), LAYER);
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_MM;
        }
    }

    fn row(&mut self, cells: [&str; 5], bold: bool) {
        for (cell, x) in cells.iter().zip(COLUMN_X_MM) {
            self.text(cell, if bold { 10.0 } else { 8.0 }, x, bold);
        }
        self.advance(ROW_HEIGHT_MM);
    }
}

impl ReportRenderer for PdfReport {
    fn render(
        &self,
        snapshots: &[CertificateSnapshot],
        alert_window_days: i64,
    ) -> Result<Vec<u8>, ReportError> {
        let (rows, summary) = tabulate(snapshots, alert_window_days);

        let (doc, page, layer) = PdfDocument::new(
            "SSL Certificate Report",
            Mm(PAGE_WIDTH_MM.into()),
            Mm(PAGE_HEIGHT_MM.into()),
            LAYER,
        );
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

        {
            let mut cursor = PageCursor {
                doc: &doc,
                layer: doc.get_page(page).get_layer(layer),
                y: TOP_MM,
                regular,
                bold,
            };

            cursor.text("SSL Certificate Report", 18.0, COLUMN_X_MM[0], true);
            cursor.advance(10.0);
            let generated = format!(
                "Generated on: {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            );
            cursor.text(&generated, 10.0, COLUMN_X_MM[0], false);
            cursor.advance(12.0);

            cursor.row(ReportRow::HEADERS, true);
            for row in &rows {
                cursor.row(row.cells(), false);
            }

            cursor.advance(ROW_HEIGHT_MM);
            let line = format!(
                "Summary: {} valid, {} expiring, {} errors",
                summary.valid, summary.expiring, summary.errors
            );
            cursor.text(&line, 10.0, COLUMN_X_MM[0], true);
        }

        Ok(doc.save_to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(domain: &str, days: i64) -> CertificateSnapshot {
        let now = Utc::now();
        CertificateSnapshot::from_validity(
            domain,
            domain,
            Some("Example CA".to_string()),
            now - Duration::days(60),
            now + Duration::days(days) + Duration::hours(1),
            now,
        )
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = PdfReport::new()
            .render(&[snapshot("a.example", 10), snapshot("b.example", 200)], 30)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_empty_registry() {
        let bytes = PdfReport::new().render(&[], 30).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_spills_onto_more_pages() {
        let snapshots: Vec<_> = (0..120)
            .map(|i| snapshot(&format!("host{}.example", i), i))
            .collect();
        let bytes = PdfReport::new().render(&snapshots, 14).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
