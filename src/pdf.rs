use anyhow::Context;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Pt,
    Rect,
};

use crate::layout::{DrawOp, Page};
use crate::style::{FontWeight, ReportStyle, Rgb};

const LAYER: &str = "Conteúdo";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn pick(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn color(rgb: Rgb) -> Color {
    let (r, g, b) = rgb.unit();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

/// Encodes laid-out pages as a PDF using the built-in Helvetica faces.
pub fn render(pages: &[Page], style: &ReportStyle) -> anyhow::Result<Vec<u8>> {
    let width = mm(style.page.width);
    let height = mm(style.page.height);
    let (doc, first_page, first_layer) =
        PdfDocument::new(style.chrome.title.as_str(), width, height, LAYER);

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("failed to register Helvetica")?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .context("failed to register Helvetica-Bold")?,
    };

    for page in pages {
        let layer = if page.number == 1 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, LAYER);
            doc.get_page(page_index).get_layer(layer_index)
        };

        for op in &page.ops {
            draw(&layer, op, &fonts);
        }
    }

    doc.save_to_bytes().context("failed to serialize PDF document")
}

fn draw(layer: &PdfLayerReference, op: &DrawOp, fonts: &Fonts) {
    match op {
        DrawOp::Text {
            x,
            y,
            size,
            weight,
            color: rgb,
            text,
        } => {
            layer.set_fill_color(color(*rgb));
            layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.pick(*weight));
        }
        DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color: rgb,
        } => {
            layer.set_fill_color(color(*rgb));
            layer.add_rect(
                Rect::new(mm(*x), mm(*y), mm(x + width), mm(y + height)).with_mode(PaintMode::Fill),
            );
        }
        DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            line_width,
            color: rgb,
        } => {
            layer.set_outline_color(color(*rgb));
            layer.set_outline_thickness(*line_width);
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(*x), mm(*y)), false),
                    (Point::new(mm(x + width), mm(*y)), false),
                    (Point::new(mm(x + width), mm(y + height)), false),
                    (Point::new(mm(*x), mm(y + height)), false),
                ],
                is_closed: true,
            });
        }
        DrawOp::Line {
            from,
            to,
            line_width,
            color: rgb,
        } => {
            layer.set_outline_color(color(*rgb));
            layer.set_outline_thickness(*line_width);
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(from.0), mm(from.1)), false),
                    (Point::new(mm(to.0), mm(to.1)), false),
                ],
                is_closed: false,
            });
        }
    }
}
