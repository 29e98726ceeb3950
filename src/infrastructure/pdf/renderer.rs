use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use super::fonts::{encode_win_ansi, text_width, wrap, FontFace};
use crate::domain::document::{Align, Block, ReportDocument, ReportTable, Rgb, TextRun};
use crate::domain::error::{AppError, Result};

const MM: f32 = 72.0 / 25.4;

/// Page size and margins, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub fn a2() -> Self {
        Self {
            width: 420.0 * MM,
            height: 594.0 * MM,
            margin: 30.0 * MM,
        }
    }

    fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    fn top(&self) -> f32 {
        self.height - self.margin
    }

    fn bottom(&self) -> f32 {
        self.margin
    }
}

const TITLE_SIZE: f32 = 24.0;
const LINE_SPACING: f32 = 1.2;
const CELL_PAD_X: f32 = 6.0;
const CELL_PAD_Y: f32 = 4.0;
const GRID_LINE_WIDTH: f32 = 0.5;

/// Turns a [`ReportDocument`] into PDF bytes.
pub struct PdfRenderer {
    geometry: PageGeometry,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(PageGeometry::a2())
    }
}

impl PdfRenderer {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    pub fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        let mut layout = Layout::new(self.geometry);
        for block in &document.blocks {
            match block {
                Block::Title(text) => layout.title(text),
                Block::Paragraph { runs, size } => layout.paragraph(runs, *size),
                Block::Spacer(height) => layout.spacer(*height),
                Block::Table(table) => layout.table(table),
                Block::PageBreak => layout.new_page(),
            }
        }
        let pages = layout.finish();
        debug!(pages = pages.len(), "Report laid out");
        self.write(pages)
    }

    fn write(&self, pages: Vec<Vec<Operation>>) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = add_font(&mut doc, FontFace::Regular);
        let bold_id = add_font(&mut doc, FontFace::Bold);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FontFace::Regular.resource_name() => regular_id,
                FontFace::Bold.resource_name() => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for operations in pages {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| AppError::Internal(format!("Falha ao gerar PDF: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let media_box: Vec<Object> = vec![
            0.0f32.into(),
            0.0f32.into(),
            self.geometry.width.into(),
            self.geometry.height.into(),
        ];
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AppError::Internal(format!("Falha ao gerar PDF: {}", e)))?;
        Ok(buffer)
    }
}

fn add_font(doc: &mut Document, face: FontFace) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Top-down flow layout over fixed-size pages.
struct Layout {
    geometry: PageGeometry,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl Layout {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            ops: Vec::new(),
            y: geometry.top(),
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.pages.push(std::mem::take(&mut self.ops));
        self.pages
    }

    /// Closes the current page. A page with nothing drawn on it is reused.
    fn new_page(&mut self) {
        if self.ops.is_empty() {
            self.y = self.geometry.top();
            return;
        }
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = self.geometry.top();
    }

    fn page_is_blank(&self) -> bool {
        self.y >= self.geometry.top()
    }

    /// Starts a new page unless `height` still fits below the cursor.
    fn reserve(&mut self, height: f32) {
        if self.y - height < self.geometry.bottom() && !self.page_is_blank() {
            self.new_page();
        }
    }

    fn title(&mut self, text: &str) {
        let leading = TITLE_SIZE * LINE_SPACING;
        let lines = wrap(text, FontFace::Bold, TITLE_SIZE, self.geometry.usable_width());
        self.reserve(leading * lines.len() as f32 + TITLE_SIZE * 0.5);
        for line in lines {
            let width = text_width(&line, FontFace::Bold, TITLE_SIZE);
            let x = self.geometry.margin + (self.geometry.usable_width() - width) / 2.0;
            self.y -= leading;
            self.text(x, self.y, FontFace::Bold, TITLE_SIZE, Rgb::BLACK, &line);
        }
        self.y -= TITLE_SIZE * 0.5;
    }

    fn paragraph(&mut self, runs: &[TextRun], size: f32) {
        let leading = size * LINE_SPACING;
        for line in flow_runs(runs, size, self.geometry.usable_width()) {
            self.reserve(leading);
            self.y -= leading;
            let mut x = self.geometry.margin;
            for (word, face) in line {
                self.text(x, self.y, face, size, Rgb::INFO_TEXT, &word);
                x += text_width(&word, face, size) + text_width(" ", face, size);
            }
        }
    }

    fn spacer(&mut self, height: f32) {
        self.y = (self.y - height).max(self.geometry.bottom());
    }

    fn table(&mut self, table: &ReportTable) {
        let widths = fit_widths(&table.column_widths, table.header.len(), self.geometry.usable_width());
        let total: f32 = widths.iter().sum();
        let left = self.geometry.margin + (self.geometry.usable_width() - total) / 2.0;
        let alignments = table.column_alignments();

        let header = TableRow::layout(&table.header, &widths, FontFace::Bold, table.header_font_size);
        let body: Vec<TableRow> = table
            .rows
            .iter()
            .map(|cells| TableRow::layout(cells, &widths, FontFace::Regular, table.body_font_size))
            .collect();

        let first_height = header.height + body.first().map(|row| row.height).unwrap_or(0.0);
        self.reserve(first_height);
        self.draw_row(&header, left, &widths, &[], table.accent, Rgb::WHITE);

        for (index, row) in body.iter().enumerate() {
            if self.y - row.height < self.geometry.bottom() {
                self.new_page();
                self.draw_row(&header, left, &widths, &[], table.accent, Rgb::WHITE);
            }
            let background = if index % 2 == 0 { Rgb::WHITESMOKE } else { Rgb::WHITE };
            self.draw_row(row, left, &widths, &alignments, background, Rgb::BLACK);
        }
    }

    /// Draws one row at the cursor. Cells without an alignment are centred.
    fn draw_row(
        &mut self,
        row: &TableRow,
        left: f32,
        widths: &[f32],
        alignments: &[Align],
        background: Rgb,
        foreground: Rgb,
    ) {
        let top = self.y;
        let bottom = top - row.height;
        let total: f32 = widths.iter().sum();

        self.fill_rect(left, bottom, total, row.height, background);

        let mut x = left;
        for (index, width) in widths.iter().enumerate() {
            let align = alignments.get(index).copied().unwrap_or(Align::Center);
            let lines = row.cells.get(index).map(Vec::as_slice).unwrap_or(&[]);
            let mut baseline = top - CELL_PAD_Y - row.size * 0.8;
            for line in lines {
                let line_width = text_width(line, row.face, row.size);
                let text_x = match align {
                    Align::Left => x + CELL_PAD_X,
                    Align::Right => x + width - CELL_PAD_X - line_width,
                    Align::Center => x + (width - line_width) / 2.0,
                };
                self.text(text_x, baseline, row.face, row.size, foreground, line);
                baseline -= row.size * LINE_SPACING;
            }
            self.stroke_rect(x, bottom, *width, row.height, Rgb::GREY);
            x += width;
        }

        self.y = bottom;
    }

    fn text(&mut self, x: f32, y: f32, face: FontFace, size: f32, color: Rgb, text: &str) {
        if text.is_empty() {
            return;
        }
        let [r, g, b] = color.unit();
        self.ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![face.resource_name().into(), size.into()],
        ));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let [r, g, b] = color.unit();
        self.ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let [r, g, b] = color.unit();
        self.ops.push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
        self.ops.push(Operation::new("w", vec![GRID_LINE_WIDTH.into()]));
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }
}

/// Wrapped cell text of one table row and the height it needs.
struct TableRow {
    cells: Vec<Vec<String>>,
    face: FontFace,
    size: f32,
    height: f32,
}

impl TableRow {
    fn layout(cells: &[String], widths: &[f32], face: FontFace, size: f32) -> Self {
        let wrapped: Vec<Vec<String>> = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let text = cells.get(index).map(String::as_str).unwrap_or("");
                wrap(text, face, size, (width - 2.0 * CELL_PAD_X).max(size))
            })
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        Self {
            cells: wrapped,
            face,
            size,
            height: lines as f32 * size * LINE_SPACING + 2.0 * CELL_PAD_Y,
        }
    }
}

/// Requested widths, scaled down proportionally when they overflow the page.
fn fit_widths(requested: &[f32], columns: usize, available: f32) -> Vec<f32> {
    let mut widths: Vec<f32> = (0..columns)
        .map(|index| requested.get(index).copied().unwrap_or(80.0))
        .collect();
    let total: f32 = widths.iter().sum();
    if total > available && total > 0.0 {
        let scale = available / total;
        for width in &mut widths {
            *width *= scale;
        }
    }
    widths
}

/// Lays runs out as lines of `(word, face)` pairs that fit `max_width`.
fn flow_runs(runs: &[TextRun], size: f32, max_width: f32) -> Vec<Vec<(String, FontFace)>> {
    let mut lines = Vec::new();
    let mut line: Vec<(String, FontFace)> = Vec::new();
    let mut used = 0.0;

    for run in runs {
        let face = if run.bold { FontFace::Bold } else { FontFace::Regular };
        for word in run.text.split_whitespace() {
            let width = text_width(word, face, size);
            let gap = if line.is_empty() { 0.0 } else { text_width(" ", face, size) };
            if !line.is_empty() && used + gap + width > max_width {
                lines.push(std::mem::take(&mut line));
                used = 0.0;
            }
            used += if line.is_empty() { width } else { gap + width };
            line.push((word.to_string(), face));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
