//! Flows declarative report blocks onto fixed-size pages.
//!
//! Everything here works in PDF points with the origin at the bottom-left
//! corner of the page, so the output can be handed straight to the PDF
//! writer. Text positions are baselines.

use chrono::NaiveDateTime;

use crate::metrics::{text_width, wrap};
use crate::style::{FontWeight, ReportStyle, Rgb, TextStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    Title,
    Section,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub widths: Vec<f32>,
    pub header_color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { text: String, level: HeadingLevel },
    Paragraph(String),
    Spacer(f32),
    PageBreak,
    Cards(Vec<Card>),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        color: Rgb,
        text: String,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        line_width: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

/// Vertical room a heading reserves for the content that follows it, so a
/// heading is never left alone at the bottom of a page.
const KEEP_WITH_NEXT: f32 = 40.0;

/// Lays out `blocks` and stamps the running header and footer on each page.
pub fn paginate(blocks: &[Block], style: &ReportStyle, generated_at: NaiveDateTime) -> Vec<Page> {
    let mut flow = Flow::new(style);
    for block in blocks {
        flow.place(block);
    }

    flow.finish()
        .into_iter()
        .enumerate()
        .map(|(index, mut ops)| {
            let number = index + 1;
            ops.extend(page_chrome(number, generated_at, style));
            Page { number, ops }
        })
        .collect()
}

/// Header and footer for one page. Depends only on its arguments.
pub fn page_chrome(number: usize, generated_at: NaiveDateTime, style: &ReportStyle) -> Vec<DrawOp> {
    let page = &style.page;
    let chrome = &style.chrome;
    let left = page.margin_left;
    let right = page.width - page.margin_right;
    let footer_y = chrome.footer_offset;
    let size = chrome.footer_size;

    let stamp = format!("Gerado em: {}", generated_at.format("%d/%m/%Y %H:%M"));
    let page_label = format!("Página {number}");
    let notice_width = text_width(&chrome.confidentiality, size, FontWeight::Regular);
    let page_width = text_width(&page_label, size, FontWeight::Regular);

    vec![
        DrawOp::Text {
            x: left,
            y: page.height - chrome.title_offset,
            size: chrome.title_size,
            weight: FontWeight::Bold,
            color: style.body.color,
            text: chrome.title.clone(),
        },
        DrawOp::Line {
            from: (left, page.height - chrome.rule_offset),
            to: (right, page.height - chrome.rule_offset),
            line_width: chrome.rule_width,
            color: style.body.color,
        },
        DrawOp::Text {
            x: left,
            y: footer_y,
            size,
            weight: FontWeight::Regular,
            color: style.body.color,
            text: stamp,
        },
        DrawOp::Text {
            x: page.width / 2.0 - notice_width / 2.0,
            y: footer_y,
            size,
            weight: FontWeight::Regular,
            color: style.body.color,
            text: chrome.confidentiality.clone(),
        },
        DrawOp::Text {
            x: right - page_width,
            y: footer_y,
            size,
            weight: FontWeight::Regular,
            color: style.body.color,
            text: page_label,
        },
    ]
}

struct Flow<'s> {
    style: &'s ReportStyle,
    pages: Vec<Vec<DrawOp>>,
    ops: Vec<DrawOp>,
    cursor: f32,
}

impl<'s> Flow<'s> {
    fn new(style: &'s ReportStyle) -> Self {
        Self {
            style,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: style.page.frame_top(),
        }
    }

    fn remaining(&self) -> f32 {
        self.cursor - self.style.page.margin_bottom
    }

    fn at_top(&self) -> bool {
        self.ops.is_empty()
    }

    fn new_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(ops);
        self.cursor = self.style.page.frame_top();
    }

    /// Starts a new page unless `height` still fits. Content taller than a
    /// whole page is placed at the top of a fresh one and allowed to overflow.
    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.at_top() {
            self.new_page();
        }
    }

    fn finish(mut self) -> Vec<Vec<DrawOp>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }

    fn place(&mut self, block: &Block) {
        match block {
            Block::Heading { text, level } => {
                let text_style = match level {
                    HeadingLevel::Title => self.style.heading1,
                    HeadingLevel::Section => self.style.heading2,
                };
                self.heading(text, &text_style);
            }
            Block::Paragraph(text) => {
                let body = self.style.body;
                self.paragraph(text, &body);
            }
            Block::Spacer(height) => {
                if self.at_top() {
                    return;
                }
                if *height >= self.remaining() {
                    self.new_page();
                } else {
                    self.cursor -= height;
                }
            }
            Block::PageBreak => {
                if !self.at_top() {
                    self.new_page();
                }
            }
            Block::Cards(cards) => self.cards(cards),
            Block::Table(table) => self.table(table),
        }
    }

    fn heading(&mut self, text: &str, text_style: &TextStyle) {
        let width = self.style.page.frame_width();
        let lines = wrap(text, text_style.size, text_style.weight, width);
        let body = lines.len() as f32 * text_style.leading;

        self.ensure(text_style.space_before + body + text_style.space_after + KEEP_WITH_NEXT);
        if !self.at_top() {
            self.cursor -= text_style.space_before;
        }

        for line in lines {
            self.text_line(line, self.style.page.margin_left, text_style);
        }
        self.cursor -= text_style.space_after;
    }

    fn paragraph(&mut self, text: &str, text_style: &TextStyle) {
        let width = self.style.page.frame_width();
        for line in wrap(text, text_style.size, text_style.weight, width) {
            self.ensure(text_style.leading);
            self.text_line(line, self.style.page.margin_left, text_style);
        }
        self.cursor -= text_style.space_after;
    }

    fn text_line(&mut self, text: String, x: f32, text_style: &TextStyle) {
        let baseline = self.cursor - baseline_drop(text_style.size, text_style.leading);
        self.ops.push(DrawOp::Text {
            x,
            y: baseline,
            size: text_style.size,
            weight: text_style.weight,
            color: text_style.color,
            text,
        });
        self.cursor -= text_style.leading;
    }

    fn cards(&mut self, cards: &[Card]) {
        let card = self.style.cards;
        if cards.is_empty() || card.columns == 0 {
            return;
        }

        let row_height = card.label_height + card.value_height;
        let grid_width = card.width * card.columns as f32;
        let x0 = self.centered_origin(grid_width);
        let mut segment_top: Option<f32> = None;

        for row in cards.chunks(card.columns) {
            if row_height > self.remaining() && !self.at_top() {
                self.close_card_box(&mut segment_top, x0, grid_width);
                self.new_page();
            }
            let top = self.cursor;
            segment_top.get_or_insert(top);

            for (column, item) in row.iter().enumerate() {
                let x = x0 + card.width * column as f32;
                self.ops.push(DrawOp::FillRect {
                    x,
                    y: top - row_height,
                    width: card.width,
                    height: row_height,
                    color: card.background,
                });
                self.ops.push(DrawOp::StrokeRect {
                    x,
                    y: top - row_height,
                    width: card.width,
                    height: row_height,
                    line_width: card.inner_width,
                    color: card.border,
                });
                self.centered_line(
                    &item.label,
                    x,
                    card.width,
                    top - card.label_height / 2.0,
                    card.label_size,
                    FontWeight::Bold,
                    self.style.body.color,
                );
                self.centered_line(
                    &item.value,
                    x,
                    card.width,
                    top - card.label_height - card.value_height / 2.0,
                    card.value_size,
                    FontWeight::Bold,
                    self.style.body.color,
                );
            }
            self.cursor -= row_height;
        }

        self.close_card_box(&mut segment_top, x0, grid_width);
    }

    fn close_card_box(&mut self, segment_top: &mut Option<f32>, x: f32, width: f32) {
        let card = self.style.cards;
        if let Some(top) = segment_top.take() {
            self.ops.push(DrawOp::StrokeRect {
                x,
                y: self.cursor,
                width,
                height: top - self.cursor,
                line_width: card.border_width,
                color: card.border,
            });
        }
    }

    fn table(&mut self, table: &Table) {
        let table_style = self.style.table;
        let total_width: f32 = table.widths.iter().sum();
        let x0 = self.centered_origin(total_width);

        let header = self.wrap_row(&table.header, &table.widths, FontWeight::Bold);
        let header_height = row_height(&header, table_style.leading, table_style.padding);
        let rows: Vec<Vec<Vec<String>>> = table
            .rows
            .iter()
            .map(|row| self.wrap_row(row, &table.widths, FontWeight::Regular))
            .collect();

        let first_height = rows
            .first()
            .map(|row| row_height(row, table_style.leading, table_style.padding))
            .unwrap_or(0.0);
        self.ensure(header_height + first_height);
        self.draw_row(
            &header,
            &table.widths,
            x0,
            header_height,
            table.header_color,
            FontWeight::Bold,
            table_style.header_text,
        );

        for (index, row) in rows.iter().enumerate() {
            let height = row_height(row, table_style.leading, table_style.padding);
            if height > self.remaining() && !self.at_top() {
                self.new_page();
                self.draw_row(
                    &header,
                    &table.widths,
                    x0,
                    header_height,
                    table.header_color,
                    FontWeight::Bold,
                    table_style.header_text,
                );
            }
            let background = table_style.row_backgrounds[index % table_style.row_backgrounds.len()];
            self.draw_row(
                row,
                &table.widths,
                x0,
                height,
                background,
                FontWeight::Regular,
                table_style.body_text,
            );
        }
    }

    fn wrap_row(&self, cells: &[String], widths: &[f32], weight: FontWeight) -> Vec<Vec<String>> {
        let table_style = self.style.table;
        widths
            .iter()
            .enumerate()
            .map(|(column, width)| {
                let text = cells.get(column).map(String::as_str).unwrap_or("");
                let inner = (width - 2.0 * table_style.padding).max(1.0);
                wrap(text, table_style.font_size, weight, inner)
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &mut self,
        cells: &[Vec<String>],
        widths: &[f32],
        x0: f32,
        height: f32,
        background: Rgb,
        weight: FontWeight,
        color: Rgb,
    ) {
        let table_style = self.style.table;
        let top = self.cursor;
        let mut x = x0;

        for (lines, width) in cells.iter().zip(widths) {
            self.ops.push(DrawOp::FillRect {
                x,
                y: top - height,
                width: *width,
                height,
                color: background,
            });
            self.ops.push(DrawOp::StrokeRect {
                x,
                y: top - height,
                width: *width,
                height,
                line_width: table_style.grid_width,
                color: table_style.grid_color,
            });

            let block = lines.len() as f32 * table_style.leading;
            let mut line_top = top - (height - block) / 2.0;
            for line in lines {
                self.centered_line(
                    line,
                    x,
                    *width,
                    line_top - table_style.leading / 2.0,
                    table_style.font_size,
                    weight,
                    color,
                );
                line_top -= table_style.leading;
            }
            x += width;
        }

        self.cursor -= height;
    }

    /// Draws `text` centred horizontally in `[x, x + width]` with its
    /// x-height roughly centred on `middle`.
    #[allow(clippy::too_many_arguments)]
    fn centered_line(
        &mut self,
        text: &str,
        x: f32,
        width: f32,
        middle: f32,
        size: f32,
        weight: FontWeight,
        color: Rgb,
    ) {
        if text.is_empty() {
            return;
        }
        let text_x = x + (width - text_width(text, size, weight)) / 2.0;
        self.ops.push(DrawOp::Text {
            x: text_x,
            y: middle - size * 0.35,
            size,
            weight,
            color,
            text: text.to_string(),
        });
    }

    fn centered_origin(&self, content_width: f32) -> f32 {
        let page = &self.style.page;
        page.margin_left + ((page.frame_width() - content_width) / 2.0).max(0.0)
    }
}

fn baseline_drop(size: f32, leading: f32) -> f32 {
    (leading - size) / 2.0 + size * 0.8
}

fn row_height(cells: &[Vec<String>], leading: f32, padding: f32) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f32 * leading + 2.0 * padding
}
