#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

pub const BLACK: Rgb = Rgb::hex(0x000000);
pub const WHITE_SMOKE: Rgb = Rgb::hex(0xF5F5F5);
pub const LIGHT_GREY: Rgb = Rgb::hex(0xD3D3D3);
pub const GREY: Rgb = Rgb::hex(0x808080);
pub const STRIPE: Rgb = Rgb::hex(0xF3F3F3);
pub const ADMISSION_BLUE: Rgb = Rgb::hex(0x1565C0);
pub const TERMINATION_RED: Rgb = Rgb::hex(0xC62828);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

const CM: f32 = 72.0 / 2.54;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width: 595.2756,
            height: 841.8898,
            margin_left: 1.5 * CM,
            margin_right: 1.5 * CM,
            margin_top: 1.7 * CM,
            margin_bottom: 1.5 * CM,
        }
    }

    pub fn frame_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn frame_top(&self) -> f32 {
        self.height - self.margin_top
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub leading: f32,
    pub space_before: f32,
    pub space_after: f32,
    pub weight: FontWeight,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStyle {
    pub font_size: f32,
    pub leading: f32,
    pub padding: f32,
    pub grid_width: f32,
    pub grid_color: Rgb,
    pub header_text: Rgb,
    pub body_text: Rgb,
    pub row_backgrounds: [Rgb; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardStyle {
    pub columns: usize,
    pub width: f32,
    pub label_height: f32,
    pub value_height: f32,
    pub label_size: f32,
    pub value_size: f32,
    pub background: Rgb,
    pub border: Rgb,
    pub border_width: f32,
    pub inner_width: f32,
}

/// Running header and footer texts plus their geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Chrome {
    pub title: String,
    pub confidentiality: String,
    pub title_size: f32,
    pub footer_size: f32,
    pub title_offset: f32,
    pub rule_offset: f32,
    pub footer_offset: f32,
    pub rule_width: f32,
}

/// Every visual constant the report uses. Built once and shared by reference
/// with the assembly, layout and rendering passes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    pub page: PageGeometry,
    pub chrome: Chrome,
    pub heading1: TextStyle,
    pub heading2: TextStyle,
    pub body: TextStyle,
    pub table: TableStyle,
    pub cards: CardStyle,
    pub placeholder: &'static str,
    pub summary_widths: [f32; 2],
    pub admission_widths: [f32; 5],
    pub termination_widths: [f32; 5],
}

impl ReportStyle {
    pub fn new(company: &str) -> Self {
        Self {
            page: PageGeometry::a4(),
            chrome: Chrome {
                title: format!("Relatório TURNOVER - {company}"),
                confidentiality: "Confidencial – Uso Interno".to_string(),
                title_size: 10.0,
                footer_size: 8.0,
                title_offset: 1.0 * CM,
                rule_offset: 1.2 * CM,
                footer_offset: 1.0 * CM,
                rule_width: 0.5,
            },
            heading1: TextStyle {
                size: 18.0,
                leading: 21.6,
                space_before: 10.0,
                space_after: 6.0,
                weight: FontWeight::Bold,
                color: BLACK,
            },
            heading2: TextStyle {
                size: 14.0,
                leading: 17.0,
                space_before: 10.0,
                space_after: 6.0,
                weight: FontWeight::Bold,
                color: BLACK,
            },
            body: TextStyle {
                size: 9.0,
                leading: 11.0,
                space_before: 0.0,
                space_after: 4.0,
                weight: FontWeight::Regular,
                color: BLACK,
            },
            table: TableStyle {
                font_size: 9.0,
                leading: 11.0,
                padding: 4.0,
                grid_width: 0.3,
                grid_color: LIGHT_GREY,
                header_text: WHITE_SMOKE,
                body_text: BLACK,
                row_backgrounds: [WHITE_SMOKE, STRIPE],
            },
            cards: CardStyle {
                columns: 3,
                width: 170.0,
                label_height: 20.0,
                value_height: 25.0,
                label_size: 9.0,
                value_size: 16.0,
                background: WHITE_SMOKE,
                border: GREY,
                border_width: 1.0,
                inner_width: 0.5,
            },
            placeholder: "—",
            summary_widths: [270.0, 140.0],
            admission_widths: [170.0, 60.0, 140.0, 70.0, 70.0],
            termination_widths: [160.0, 80.0, 60.0, 160.0, 50.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_split_into_channels() {
        let blue = Rgb::hex(0x1565C0);
        assert_eq!(blue, Rgb { r: 0x15, g: 0x65, b: 0xC0 });
        let (r, _, b) = WHITE_SMOKE.unit();
        assert!((r - 245.0 / 255.0).abs() < 1e-6);
        assert!((b - 245.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn detail_tables_fit_inside_the_frame() {
        let style = ReportStyle::new("ACME");
        let frame = style.page.frame_width();
        assert!(style.admission_widths.iter().sum::<f32>() <= frame);
        assert!(style.termination_widths.iter().sum::<f32>() <= frame);
        assert!(style.cards.width * style.cards.columns as f32 <= frame);
        assert_eq!(style.chrome.title, "Relatório TURNOVER - ACME");
    }
}
