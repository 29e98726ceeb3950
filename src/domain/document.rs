// ============================================================
// REPORT DOCUMENT MODEL
// ============================================================
// Layout-independent description of a report: the assembler produces it,
// the PDF renderer consumes it

use super::table::looks_numeric;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    pub const WHITESMOKE: Rgb = Rgb(0xF5, 0xF5, 0xF5);
    pub const GREY: Rgb = Rgb(0x80, 0x80, 0x80);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
    pub const INFO_TEXT: Rgb = Rgb(0x33, 0x33, 0x33);

    pub const fn hex(value: u32) -> Self {
        Rgb(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        )
    }

    /// Components scaled to the 0..=1 range PDF colour operators expect.
    pub fn unit(&self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    /// Header labels; `\n` splits a label over several lines.
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub column_widths: Vec<f32>,
    pub accent: Rgb,
    pub header_font_size: f32,
    pub body_font_size: f32,
}

impl ReportTable {
    pub fn new(header: &[&str], column_widths: &[f32], accent: Rgb) -> Self {
        Self {
            header: header.iter().map(|label| label.to_string()).collect(),
            rows: Vec::new(),
            column_widths: column_widths.to_vec(),
            accent,
            header_font_size: 14.0,
            body_font_size: 12.0,
        }
    }

    pub fn with_font_sizes(mut self, header: f32, body: f32) -> Self {
        self.header_font_size = header;
        self.body_font_size = body;
        self
    }

    /// Adds a body row, padding short rows with `-` so columns never shift.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.header.len(), "-".to_string());
        self.rows.push(cells);
    }

    /// A column is right-aligned when every filled body cell looks numeric.
    pub fn column_alignments(&self) -> Vec<Align> {
        (0..self.header.len())
            .map(|index| {
                let mut filled = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.trim())
                    .filter(|cell| !matches!(*cell, "" | "-" | "—"))
                    .peekable();
                if filled.peek().is_none() {
                    return Align::Left;
                }
                if filled.all(looks_numeric) {
                    Align::Right
                } else {
                    Align::Left
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Paragraph { runs: Vec<TextRun>, size: f32 },
    Spacer(f32),
    Table(ReportTable),
    PageBreak,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDocument {
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn page_break_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, Block::PageBreak))
            .count()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Title(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<&ReportTable> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }
}
