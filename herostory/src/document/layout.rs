//! Page layout: word wrapping and pagination on A4.

use crate::markup;

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.28;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 841.89;
/// Margin on every side.
pub const MARGIN: f32 = 56.0;

const TITLE_SIZE: f32 = 24.0;
const HEADING_SIZE: f32 = 14.0;
const LEADING: f32 = 1.45;
const MAX_IMAGE_HEIGHT_RATIO: f32 = 0.45;

/// Font faces available to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

/// One positioned element. Coordinates are PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A single line of text, `y` at the baseline.
    Text {
        /// Left edge.
        x: f32,
        /// Baseline.
        y: f32,
        /// Font size.
        size: f32,
        /// Face.
        face: Face,
        /// The line.
        text: String,
    },
    /// The inline illustration, `y` at its bottom edge.
    Image {
        /// Left edge.
        x: f32,
        /// Bottom edge.
        y: f32,
        /// Drawn width.
        width: f32,
        /// Drawn height.
        height: f32,
    },
}

/// Blocks of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// Elements in drawing order.
    pub blocks: Vec<Block>,
}

/// Approximate Helvetica advance width in em.
fn char_width(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '.' | ',' | ':' | ';' | '!' | '|' => 0.24,
        ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '[' | ']' | '/' => 0.32,
        'm' | 'w' | 'M' | 'W' | '@' => 0.86,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.556,
        _ => 0.53,
    }
}

/// Estimated width of `text` at `size` points.
#[must_use]
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_width).sum::<f32>() * size
}

/// Greedy word wrap. Words wider than a line are split by character.
#[must_use]
pub fn wrap(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, size) <= max_width {
            current = word.to_string();
            continue;
        }

        for c in word.chars() {
            if !current.is_empty() && text_width(&format!("{current}{c}"), size) > max_width {
                lines.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Flows content top to bottom, opening pages as needed.
#[derive(Debug)]
pub struct Layouter {
    pages: Vec<PageLayout>,
    y: f32,
    body_size: f32,
}

impl Layouter {
    /// Starts a layout with one empty page.
    #[must_use]
    pub fn new(body_size: f32) -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT - MARGIN,
            body_size,
        }
    }

    fn content_width() -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    fn current(&mut self) -> &mut PageLayout {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure(&mut self, height: f32) {
        let at_top = self.current().blocks.is_empty();
        if !at_top && self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn line(&mut self, text: String, size: f32, face: Face, centered: bool) {
        let advance = size * LEADING;
        self.ensure(advance);
        self.y -= size;
        let x = if centered {
            MARGIN + ((Self::content_width() - text_width(&text, size)) / 2.0).max(0.0)
        } else {
            MARGIN
        };
        let y = self.y;
        self.current().blocks.push(Block::Text { x, y, size, face, text });
        self.y -= advance - size;
    }

    fn gap(&mut self, height: f32) {
        if !self.current().blocks.is_empty() {
            self.y -= height;
        }
    }

    /// Centered bold title.
    pub fn title(&mut self, text: &str) {
        for line in wrap(text, TITLE_SIZE, Self::content_width()) {
            self.line(line, TITLE_SIZE, Face::Bold, true);
        }
        self.gap(TITLE_SIZE * 0.5);
    }

    /// Bold section heading, kept with at least two following lines.
    pub fn heading(&mut self, text: &str) {
        self.gap(HEADING_SIZE * 0.6);
        self.ensure(HEADING_SIZE * LEADING + 2.0 * self.body_size * LEADING);
        for line in wrap(text, HEADING_SIZE, Self::content_width()) {
            self.line(line, HEADING_SIZE, Face::Bold, false);
        }
        self.gap(HEADING_SIZE * 0.2);
    }

    /// One wrapped paragraph. Inner line breaks flow as spaces.
    pub fn paragraph(&mut self, text: &str) {
        let size = self.body_size;
        for line in wrap(text, size, Self::content_width()) {
            self.line(line, size, Face::Regular, false);
        }
        self.gap(size * 0.6);
    }

    /// Splits prose on blank lines and flows each paragraph.
    pub fn prose(&mut self, text: &str) {
        for paragraph in markup::paragraphs(text) {
            self.paragraph(&paragraph);
        }
    }

    /// Places the inline image, scaled to fit and centered.
    pub fn image(&mut self, pixel_width: u32, pixel_height: u32) {
        if pixel_width == 0 || pixel_height == 0 {
            return;
        }
        let max_width = Self::content_width();
        let max_height = (PAGE_HEIGHT - 2.0 * MARGIN) * MAX_IMAGE_HEIGHT_RATIO;
        #[allow(clippy::cast_precision_loss)]
        let (px_w, px_h) = (pixel_width as f32, pixel_height as f32);
        let scale = (max_width / px_w).min(max_height / px_h);
        let (width, height) = (px_w * scale, px_h * scale);

        self.ensure(height);
        self.y -= height;
        let x = MARGIN + (max_width - width) / 2.0;
        let y = self.y;
        self.current().blocks.push(Block::Image { x, y, width, height });
        self.gap(self.body_size);
    }

    /// Starts a new page unless the current one is still empty.
    pub fn page_break(&mut self) {
        if !self.current().blocks.is_empty() {
            self.new_page();
        }
    }

    /// Returns the laid-out pages.
    #[must_use]
    pub fn finish(self) -> Vec<PageLayout> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_lines(pages: &[PageLayout]) -> Vec<String> {
        pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter_map(|b| match b {
                Block::Text { text, .. } => Some(text.clone()),
                Block::Image { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "the fog remembers every footstep ".repeat(20);
        let lines = wrap(&text, 11.0, 200.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 11.0) <= 200.0, "line too wide: {line}");
        }
        assert_eq!(lines.join(" "), text.trim());
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let word = "a".repeat(300);
        let lines = wrap(&word, 11.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("   ", 11.0, 100.0).is_empty());
    }

    #[test]
    fn test_paragraphs_flow_independently() {
        let mut layout = Layouter::new(11.0);
        layout.prose("First paragraph.\n\nSecond paragraph.");
        let lines = text_lines(&layout.finish());
        assert_eq!(lines, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_long_prose_paginates_within_margins() {
        let mut layout = Layouter::new(11.0);
        let paragraph = "Lanterns flickered across the valley as Ren walked on. ".repeat(12);
        for _ in 0..30 {
            layout.paragraph(&paragraph);
        }
        let pages = layout.finish();

        assert!(pages.len() > 1);
        for block in pages.iter().flat_map(|p| p.blocks.iter()) {
            if let Block::Text { y, .. } = block {
                assert!(*y >= MARGIN - 0.01 && *y <= PAGE_HEIGHT - MARGIN);
            }
        }
    }

    #[test]
    fn test_page_break_skips_empty_page() {
        let mut layout = Layouter::new(11.0);
        layout.page_break();
        layout.paragraph("text");
        layout.page_break();
        layout.paragraph("more");
        assert_eq!(layout.finish().len(), 2);
    }

    #[test]
    fn test_image_is_scaled_to_content_width() {
        let mut layout = Layouter::new(11.0);
        layout.image(2000, 1000);
        let pages = layout.finish();

        match &pages[0].blocks[0] {
            Block::Image { width, height, x, .. } => {
                assert!((*width - (PAGE_WIDTH - 2.0 * MARGIN)).abs() < 0.01);
                assert!((*height - *width / 2.0).abs() < 0.01);
                assert!((*x - MARGIN).abs() < 0.01);
            }
            other => panic!("expected image, got {other:?}"),
        }
    }
}
