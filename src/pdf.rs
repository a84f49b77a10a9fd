use std::io::BufWriter;
use std::ops::RangeInclusive;
use std::path::Path;

use chrono::NaiveDate;
use printpdf::*;

use crate::aggregator::{CompanyReport, IntervalMatrix, TOTAL_LABEL};
use crate::assets::{Notice, ReportAssets};
use crate::error::{RegopError, Result};

// US Letter dimensions (mm)
const LETTER_SHORT: f32 = 215.9;
const LETTER_LONG: f32 = 279.4;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 6.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;
const IMAGE_DPI: f32 = 300.0;
const IMAGE_STACK_MAX_H: f32 = 60.0;
const INTERVAL_COL_W: f32 = 38.0;

const SERIES_COLORS: &[(f32, f32, f32)] = &[
    (0.12, 0.47, 0.71),
    (1.00, 0.50, 0.05),
    (0.17, 0.63, 0.17),
    (0.84, 0.15, 0.16),
    (0.58, 0.40, 0.74),
    (0.55, 0.34, 0.29),
];

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.len() as f32 * size * 0.18
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

#[derive(Clone, Copy)]
enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    fn size(self) -> (f32, f32) {
        match self {
            Self::Landscape => (LETTER_LONG, LETTER_SHORT),
            Self::Portrait => (LETTER_SHORT, LETTER_LONG),
        }
    }
}

/// Context printed in report headers.
pub struct ReportContext<'a> {
    pub date: NaiveDate,
    pub hours: RangeInclusive<u8>,
    pub operator: &'a str,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    orientation: Orientation,
    page_w: f32,
    page_h: f32,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str, orientation: Orientation) -> Result<Self> {
        let (page_w, page_h) = orientation.size();
        let (doc, page, layer) = PdfDocument::new(title, Mm(page_w), Mm(page_h), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RegopError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RegopError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            orientation,
            page_w,
            page_h,
            y: MARGIN_TOP,
        })
    }

    fn layer(&self) -> PdfLayerReference {
        self.doc
            .get_page(self.current_page)
            .get_layer(self.current_layer)
    }

    fn pdf_y(&self) -> f32 {
        self.page_h - self.y
    }

    fn content_w(&self) -> f32 {
        self.page_w - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn new_page(&mut self, orientation: Orientation) {
        let (w, h) = orientation.size();
        let (page, layer) = self.doc.add_page(Mm(w), Mm(h), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.orientation = orientation;
        self.page_w = w;
        self.page_h = h;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > self.page_h - MARGIN_BOTTOM {
            self.new_page(self.orientation);
        }
    }

    fn text_at(&self, s: &str, x: f32, pdf_y: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer().use_text(s, size, Mm(x), Mm(pdf_y), font);
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        self.text_at(s, x, self.pdf_y(), size, bold);
    }

    fn polyline(&self, points: &[(f32, f32)], closed: bool) {
        let line = Line {
            points: points
                .iter()
                .map(|(x, y)| (Point::new(Mm(*x), Mm(*y)), false))
                .collect(),
            is_closed: closed,
        };
        self.layer().add_line(line);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self.layer();
        layer.set_outline_color(rgb(0.0, 0.0, 0.0));
        layer.set_outline_thickness(0.5);
        self.polyline(&[(x1, self.pdf_y()), (x2, self.pdf_y())], false);
    }

    fn header(&mut self, title: &str, subtitle: &str, operator: &str) {
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        self.text(subtitle, MARGIN_LEFT, SUBTITLE_SIZE, false);
        self.y += 5.0;
        let mut ts = chrono::Local::now()
            .format("Generated %Y-%m-%d %H:%M")
            .to_string();
        if !operator.is_empty() {
            ts.push_str(&format!(" by {operator}"));
        }
        self.text(&ts, MARGIN_LEFT, 8.0, false);
        self.y += 4.0;
        self.hline(MARGIN_LEFT, self.page_w - MARGIN_RIGHT);
        self.y += 5.0;
    }

    /// Place an image at the cursor, scaled to `width`.
    fn image(&mut self, image: Image, width: f32) {
        let natural_w = image.image.width.0.max(1) as f32 * 25.4 / IMAGE_DPI;
        let scale = width / natural_w;
        let h = width / aspect(&image);
        image.add_to_layer(
            self.layer(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(self.page_h - self.y - h)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.y += h + 4.0;
    }

    fn cell(&self, x: f32, w: f32, value: &str, right: bool, bold: bool) {
        let top = self.pdf_y();
        let bottom = top - ROW_H;
        self.polyline(&[(x, top), (x + w, top), (x + w, bottom), (x, bottom)], true);
        let tx = if right {
            x + w - 1.5 - approx_text_width(value, FONT_SIZE)
        } else {
            x + 1.5
        };
        self.text_at(value, tx, bottom + 1.8, FONT_SIZE, bold);
    }

    fn grid_row(&mut self, widths: &[f32], values: &[String], bold: bool) {
        self.ensure_space(ROW_H);
        let layer = self.layer();
        layer.set_outline_color(rgb(0.0, 0.0, 0.0));
        layer.set_outline_thickness(0.3);
        let mut x = MARGIN_LEFT;
        for (i, (w, v)) in widths.iter().zip(values).enumerate() {
            self.cell(x, *w, v, i > 0, bold);
            x += w;
        }
        self.y += ROW_H;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| RegopError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| RegopError::Pdf(e.to_string()))
    }
}

/// Width over height.
fn aspect(image: &Image) -> f32 {
    image.image.width.0.max(1) as f32 / image.image.height.0.max(1) as f32
}

/// Common width for images stacked top to bottom: the content width, or
/// narrower when the whole stack would be taller than `IMAGE_STACK_MAX_H`.
fn stack_width(content_w: f32, aspects: &[f32]) -> f32 {
    let height_per_mm: f32 = aspects.iter().map(|a| 1.0 / a).sum();
    if height_per_mm > 0.0 {
        content_w.min(IMAGE_STACK_MAX_H / height_per_mm)
    } else {
        content_w
    }
}

fn load_image(path: &Path) -> std::result::Result<Image, String> {
    use printpdf::image_crate::codecs::{jpeg::JpegDecoder, png::PngDecoder};

    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let reader = std::io::BufReader::new(file);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => {
            let decoder = PngDecoder::new(reader).map_err(|e| e.to_string())?;
            Image::try_from(decoder).map_err(|e| e.to_string())
        }
        "jpg" | "jpeg" => {
            let decoder = JpegDecoder::new(reader).map_err(|e| e.to_string())?;
            Image::try_from(decoder).map_err(|e| e.to_string())
        }
        other => Err(format!("unsupported image type {other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

/// Line chart of dispatches per hour, one line per destination.
fn draw_chart(pdf: &PdfWriter, report: &CompanyReport, hours: &RangeInclusive<u8>) {
    let legend_h = 8.0;
    let axis_label_h = 8.0;
    let left = MARGIN_LEFT + 10.0;
    let right = pdf.page_w - MARGIN_RIGHT;
    let top = pdf.pdf_y();
    let bottom = MARGIN_BOTTOM + axis_label_h + legend_h;
    if top - bottom < 20.0 {
        return;
    }
    let (first, last) = (*hours.start(), *hours.end());
    let span = f32::from(last - first).max(1.0);
    let max_count = report.series.iter().map(|h| h.count).max().unwrap_or(0).max(1);
    let x_of = |hour: u8| left + (right - left) * f32::from(hour - first) / span;
    let y_of = |count: u32| bottom + (top - bottom) * count as f32 / max_count as f32;

    let layer = pdf.layer();
    layer.set_outline_color(rgb(0.0, 0.0, 0.0));
    layer.set_outline_thickness(0.5);
    pdf.polyline(&[(left, top), (left, bottom), (right, bottom)], false);
    pdf.text_at(&max_count.to_string(), MARGIN_LEFT, top - 2.0, 8.0, false);
    pdf.text_at("0", MARGIN_LEFT, bottom, 8.0, false);
    let step = if span > 12.0 { 2 } else { 1 };
    for hour in hours.clone().step_by(step) {
        let label = format!("{hour:02}h");
        let x = x_of(hour) - approx_text_width(&label, 8.0) / 2.0;
        pdf.text_at(&label, x, bottom - 5.0, 8.0, false);
    }

    let mut legend_x = left;
    let legend_y = MARGIN_BOTTOM + 2.0;
    for (i, dest) in report.matrix.destinations.iter().enumerate() {
        let (r, g, b) = SERIES_COLORS[i % SERIES_COLORS.len()];
        let layer = pdf.layer();
        layer.set_outline_color(rgb(r, g, b));
        layer.set_outline_thickness(1.2);
        let points: Vec<(f32, f32)> = hours
            .clone()
            .map(|hour| {
                let count = report.matrix.count(hour, dest).unwrap_or(0);
                (x_of(hour), y_of(count))
            })
            .collect();
        if points.len() == 1 {
            let (x, y) = points[0];
            pdf.polyline(&[(x - 1.0, y), (x + 1.0, y)], false);
        } else {
            pdf.polyline(&points, false);
        }
        pdf.polyline(&[(legend_x, legend_y + 1.2), (legend_x + 6.0, legend_y + 1.2)], false);
        let label = format!("{dest} ({})", report.matrix.total(dest).unwrap_or(0));
        pdf.text_at(&label, legend_x + 8.0, legend_y, 8.0, false);
        legend_x += 14.0 + approx_text_width(&label, 8.0);
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

fn draw_grid(pdf: &mut PdfWriter, matrix: &IntervalMatrix) {
    let n = matrix.destinations.len().max(1) as f32;
    let dest_w = (pdf.content_w() - INTERVAL_COL_W) / n;
    let mut widths = vec![INTERVAL_COL_W];
    widths.extend(std::iter::repeat(dest_w).take(matrix.destinations.len()));

    let mut header = vec!["Interval".to_string()];
    header.extend(matrix.destinations.iter().cloned());
    pdf.grid_row(&widths, &header, true);

    for row in &matrix.rows {
        let mut values = vec![row.label.clone()];
        values.extend(row.counts.iter().map(|c| c.to_string()));
        pdf.grid_row(&widths, &values, false);
    }

    let mut totals = vec![TOTAL_LABEL.to_string()];
    totals.extend(matrix.totals.iter().map(|c| c.to_string()));
    pdf.grid_row(&widths, &totals, true);
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

/// Two-page report for one company: banner, logo and chart on a landscape
/// page, then the interval grid on a portrait page. Images that cannot be
/// read are skipped and reported as notices.
pub fn render_company_report(
    report: &CompanyReport,
    assets: &ReportAssets,
    ctx: &ReportContext,
) -> Result<(Vec<u8>, Vec<Notice>)> {
    let mut notices = Vec::new();
    let title = format!("Dispatches {}", report.company);
    let subtitle = format!(
        "{}  |  {:02}:00 - {:02}:59",
        ctx.date.format("%d/%m/%Y"),
        ctx.hours.start(),
        ctx.hours.end()
    );

    let mut pdf = PdfWriter::new(&title, Orientation::Landscape)?;
    let mut images = Vec::new();
    for (label, path) in [("banner", &assets.banner), ("logo", &assets.logo)] {
        let Some(path) = path else { continue };
        match load_image(path) {
            Ok(image) => images.push(image),
            Err(e) => notices.push(Notice(format!(
                "Could not use {label} {}: {e}",
                path.display()
            ))),
        }
    }
    let aspects: Vec<f32> = images.iter().map(aspect).collect();
    let width = stack_width(pdf.content_w(), &aspects);
    for image in images {
        pdf.image(image, width);
    }
    pdf.header(&title, &subtitle, ctx.operator);
    if report.is_empty() {
        pdf.text("No dispatches for this selection.", MARGIN_LEFT, SUBTITLE_SIZE, false);
        pdf.y += ROW_H;
    }
    draw_chart(&pdf, report, &ctx.hours);

    pdf.new_page(Orientation::Portrait);
    pdf.header(&title, &subtitle, ctx.operator);
    draw_grid(&mut pdf, &report.matrix.trimmed());

    Ok((pdf.to_bytes()?, notices))
}
