//! Top-down flow layout onto A4 pages. Coordinates passed in are measured
//! from the top-left corner; conversion to PDF user space happens here.

use lopdf::content::Operation;
use lopdf::Object;

use crate::text::{encode_win_ansi, fit, text_width};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 42.0;
/// Space kept free at the bottom of every page for the page number.
const FOOTER_SPACE: f32 = 24.0;

pub const REGULAR: &str = "F1";
pub const BOLD: &str = "F2";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    pub const BLACK: Color = Color(0.0, 0.0, 0.0);
    pub const GREY: Color = Color(0.5, 0.5, 0.5);
    pub const MUTED: Color = Color(0.35, 0.35, 0.35);
    pub const HEADER_FILL: Color = Color(0.949, 0.949, 0.949);

    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Color(rgb[0] as f32 / 255.0, rgb[1] as f32 / 255.0, rgb[2] as f32 / 255.0)
    }

    fn operands(self) -> Vec<Object> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: &'static str,
    pub width: f32,
    pub align: Align,
}

impl Column {
    pub fn left(title: &'static str, width: f32) -> Self {
        Column { title, width, align: Align::Left }
    }

    pub fn right(title: &'static str, width: f32) -> Self {
        Column { title, width, align: Align::Right }
    }
}

/// Accumulates drawing operations page by page, breaking when the cursor
/// would run into the bottom margin.
pub struct PageWriter {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    cursor: f32,
}

impl Default for PageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageWriter {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: MARGIN,
        }
    }

    pub fn content_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    pub fn left(&self) -> f32 {
        MARGIN
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    fn bottom_limit(&self) -> f32 {
        PAGE_HEIGHT - MARGIN - FOOTER_SPACE
    }

    pub fn remaining(&self) -> f32 {
        self.bottom_limit() - self.cursor
    }

    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    pub fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.cursor = MARGIN;
    }

    /// Start a new page unless `height` still fits on this one. Returns
    /// whether a break happened.
    pub fn ensure(&mut self, height: f32) -> bool {
        if self.cursor + height > self.bottom_limit() && self.cursor > MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, height: f32) {
        self.cursor += height;
    }

    /// Text whose top edge sits at `top`.
    pub fn text_at(&mut self, x: f32, top: f32, size: f32, bold: bool, color: Color, text: &str) {
        if text.is_empty() {
            return;
        }
        let baseline = PAGE_HEIGHT - (top + size * 0.8);
        let font = if bold { BOLD } else { REGULAR };
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("rg", color.operands()));
        self.ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// One line of text at the cursor, then move below it.
    pub fn line(&mut self, size: f32, bold: bool, text: &str) {
        let height = size * 1.4;
        self.ensure(height);
        let top = self.cursor;
        self.text_at(MARGIN, top, size, bold, Color::BLACK, text);
        self.advance(height);
    }

    /// `label value` on one line with the label in bold.
    pub fn labelled(&mut self, size: f32, label: &str, value: &str) {
        let height = size * 1.4;
        self.ensure(height);
        let top = self.cursor;
        self.text_at(MARGIN, top, size, true, Color::BLACK, label);
        let x = MARGIN + text_width(label, size, true) + size * 0.4;
        self.text_at(x, top, size, false, Color::BLACK, value);
        self.advance(height);
    }

    pub fn heading(&mut self, text: &str) {
        // Keep a heading together with at least a couple of lines of its body.
        self.ensure(13.0 * 1.6 + 40.0);
        self.advance(4.0);
        let top = self.cursor;
        self.text_at(MARGIN, top, 13.0, true, Color::BLACK, text);
        self.advance(13.0 * 1.6);
    }

    pub fn fill_rect(&mut self, x: f32, top: f32, w: f32, h: f32, color: Color) {
        let y = PAGE_HEIGHT - (top + h);
        self.ops.push(Operation::new("rg", color.operands()));
        self.ops.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.ops.push(Operation::new("f", vec![]));
    }

    pub fn stroke_rect(&mut self, x: f32, top: f32, w: f32, h: f32, width: f32, color: Color) {
        let y = PAGE_HEIGHT - (top + h);
        self.ops.push(Operation::new("w", vec![width.into()]));
        self.ops.push(Operation::new("RG", color.operands()));
        self.ops.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    /// Place a registered image XObject.
    pub fn image(&mut self, name: &str, x: f32, top: f32, w: f32, h: f32) {
        let y = PAGE_HEIGHT - (top + h);
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
        ));
        self.ops.push(Operation::new("Do", vec![name.into()]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Grid table; the header row is repeated after every page break.
    pub fn table(&mut self, columns: &[Column], rows: &[Vec<String>]) {
        const ROW: f32 = 16.0;
        const SIZE: f32 = 9.0;
        const PAD: f32 = 4.0;

        self.ensure(ROW * 2.0);
        self.table_row(columns, None, ROW, SIZE, PAD);
        for row in rows {
            if self.ensure(ROW) {
                self.table_row(columns, None, ROW, SIZE, PAD);
            }
            self.table_row(columns, Some(row), ROW, SIZE, PAD);
        }
        self.advance(8.0);
    }

    fn table_row(&mut self, columns: &[Column], cells: Option<&Vec<String>>, row_h: f32, size: f32, pad: f32) {
        let top = self.cursor;
        let bold = cells.is_none();
        let total_w: f32 = columns.iter().map(|c| c.width).sum();
        if bold {
            self.fill_rect(MARGIN, top, total_w, row_h, Color::HEADER_FILL);
        }

        let mut x = MARGIN;
        for (i, column) in columns.iter().enumerate() {
            let raw = match cells {
                Some(cells) => cells.get(i).map(String::as_str).unwrap_or(""),
                None => column.title,
            };
            let text = fit(raw, size, bold, column.width - 2.0 * pad);
            let text_x = match column.align {
                Align::Left => x + pad,
                Align::Right => x + column.width - pad - text_width(&text, size, bold),
            };
            let text_top = top + (row_h - size) / 2.0;
            self.text_at(text_x, text_top, size, bold, Color::BLACK, &text);
            self.stroke_rect(x, top, column.width, row_h, 0.5, Color::GREY);
            x += column.width;
        }
        self.advance(row_h);
    }

    /// Close the last page and stamp `Page n of N` on every page.
    pub fn finish(mut self) -> Vec<Vec<Operation>> {
        self.pages.push(std::mem::take(&mut self.ops));
        let total = self.pages.len();
        let mut pages = std::mem::take(&mut self.pages);
        for (i, ops) in pages.iter_mut().enumerate() {
            let label = format!("Page {} of {}", i + 1, total);
            let x = PAGE_WIDTH - MARGIN - text_width(&label, 8.0, false);
            let mut stamp = PageWriter::new();
            stamp.text_at(x, PAGE_HEIGHT - MARGIN + 8.0, 8.0, false, Color::MUTED, &label);
            ops.extend(stamp.ops);
        }
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(ops: &[Operation], operator: &str) -> usize {
        ops.iter().filter(|op| op.operator == operator).count()
    }

    #[test]
    fn short_content_is_one_page() {
        let mut w = PageWriter::new();
        w.line(20.0, true, "Title");
        w.line(10.0, false, "Body");
        let pages = w.finish();
        assert_eq!(pages.len(), 1);
        // Two lines plus the page stamp.
        assert_eq!(count(&pages[0], "Tj"), 3);
    }

    #[test]
    fn long_tables_break_pages_and_repeat_header() {
        let mut w = PageWriter::new();
        let columns = [Column::left("Day", 100.0), Column::right("Revenue", 100.0)];
        let rows: Vec<Vec<String>> = (0..120).map(|i| vec![i.to_string(), "$1.00".to_string()]).collect();
        w.table(&columns, &rows);
        let pages = w.finish();
        assert!(pages.len() >= 3);
        // Every page starts with a shaded header row.
        for page in &pages {
            assert!(count(page, "f") >= 1);
        }
    }

    #[test]
    fn ensure_does_not_break_empty_page() {
        let mut w = PageWriter::new();
        assert!(!w.ensure(PAGE_HEIGHT * 2.0));
        assert_eq!(w.page_count(), 1);
    }

    #[test]
    fn image_emits_placement_ops() {
        let mut w = PageWriter::new();
        w.image("Im1", 50.0, 100.0, 200.0, 100.0);
        let pages = w.finish();
        assert_eq!(count(&pages[0], "Do"), 1);
        assert_eq!(count(&pages[0], "cm"), 1);
    }
}
