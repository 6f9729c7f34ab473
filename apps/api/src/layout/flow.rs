//! Page flow: places a `RenderedDocument` onto an A4-wide canvas.
//!
//! The result is a display list in CSS pixels (794px page width, the width
//! of A4 at 96 dpi). Shapes go into the raster image; text runs are written
//! by the PDF assembler as real text on top of it.

use crate::layout::font_metrics::{get_metrics, FontFamily, FontWeight};
use crate::render::document::{
    DocumentHeader, EntryBlock, Item, LevelItem, RenderedDocument, Section, SectionKind,
};
use crate::render::templates::{Layout, Rgb, TemplateStyle};

pub const PAGE_WIDTH_PX: f32 = 794.0;
/// Height of one 295 mm page slice at `PAGE_WIDTH_PX`; the shortest canvas.
pub const PAGE_HEIGHT_PX: f32 = PAGE_WIDTH_PX * 295.0 / 210.0;

const SIDEBAR_WIDTH: f32 = 250.0;
const MARGIN: f32 = 40.0;
const LETTER_MARGIN: f32 = 72.0;
const LINE_FACTOR: f32 = 1.35;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    Disc {
        cx: f32,
        cy: f32,
        r: f32,
        color: Rgb,
    },
}

/// One line of text. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub text: String,
    pub font: FontFamily,
    pub weight: FontWeight,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
    pub shapes: Vec<Shape>,
    pub text: Vec<TextRun>,
}

/// A vertical text column that wraps and stacks runs.
struct Column {
    x: f32,
    width: f32,
    y: f32,
    font: FontFamily,
    shapes: Vec<Shape>,
    text: Vec<TextRun>,
}

impl Column {
    fn new(x: f32, width: f32, y: f32, font: FontFamily) -> Self {
        Column {
            x,
            width,
            y,
            font,
            shapes: Vec::new(),
            text: Vec::new(),
        }
    }

    fn gap(&mut self, h: f32) {
        self.y += h;
    }

    fn write(&mut self, s: &str, size: f32, weight: FontWeight, color: Rgb) {
        self.write_indented(s, size, weight, color, 0.0);
    }

    fn write_indented(&mut self, s: &str, size: f32, weight: FontWeight, color: Rgb, indent: f32) {
        let metrics = get_metrics(self.font, weight);
        let max_em = (self.width - indent) / size;
        for raw_line in s.lines() {
            for line in metrics.wrap(raw_line, max_em) {
                self.y += size * LINE_FACTOR;
                self.text.push(TextRun {
                    x: self.x + indent,
                    y: self.y - size * 0.3,
                    size,
                    text: line,
                    font: self.font,
                    weight,
                    color,
                });
            }
        }
    }

    fn rule(&mut self, thickness: f32, color: Rgb) {
        self.shapes.push(Shape::Rect {
            x: self.x,
            y: self.y,
            w: self.width,
            h: thickness,
            color,
        });
        self.y += thickness;
    }

    fn gauge(&mut self, percent: u8, track: Rgb, fill: Rgb) {
        self.y += 4.0;
        self.shapes.push(Shape::Rect {
            x: self.x,
            y: self.y,
            w: self.width,
            h: 5.0,
            color: track,
        });
        self.shapes.push(Shape::Rect {
            x: self.x,
            y: self.y,
            w: self.width * f32::from(percent.min(100)) / 100.0,
            h: 5.0,
            color: fill,
        });
        self.y += 5.0;
    }
}

/// Colours for one column of a given template.
#[derive(Clone, Copy)]
struct Palette {
    ink: Rgb,
    muted: Rgb,
    title: Rgb,
    track: Rgb,
    fill: Rgb,
}

pub fn layout_document(doc: &RenderedDocument) -> Scene {
    let style = doc.style;
    let accent = style.accent;
    let main_palette = Palette {
        ink: Rgb::INK,
        muted: Rgb::MUTED,
        title: match style.layout {
            Layout::Minimal | Layout::Letter => Rgb::INK,
            _ => accent,
        },
        track: Rgb::TRACK,
        fill: accent,
    };

    let mut shapes = Vec::new();
    let mut text = Vec::new();

    let (main_x, main_width, sidebar_end) = if style.layout.has_sidebar() {
        let sidebar_palette = match style.layout {
            Layout::Sidebar => Palette {
                ink: Rgb::WHITE,
                muted: accent.tint(0.8),
                title: Rgb::WHITE,
                track: accent.tint(0.45),
                fill: Rgb::WHITE,
            },
            _ => Palette {
                ink: Rgb::INK,
                muted: Rgb::MUTED,
                title: accent,
                track: Rgb::TRACK,
                fill: accent,
            },
        };
        let mut col = Column::new(MARGIN * 0.75, SIDEBAR_WIDTH - MARGIN * 1.5, MARGIN, style.font);
        if let Some(header) = &doc.header {
            place_avatar(&mut col, header, &style);
        }
        for section in &doc.sidebar {
            place_section(&mut col, section, &style, sidebar_palette, false);
        }
        let end = col.y + MARGIN;
        shapes.append(&mut col.shapes);
        text.append(&mut col.text);
        (SIDEBAR_WIDTH + MARGIN, PAGE_WIDTH_PX - SIDEBAR_WIDTH - MARGIN * 2.0, end)
    } else {
        let margin = if style.layout == Layout::Letter {
            LETTER_MARGIN
        } else {
            MARGIN
        };
        (margin, PAGE_WIDTH_PX - margin * 2.0, 0.0)
    };

    let top = if style.layout == Layout::Letter {
        LETTER_MARGIN
    } else {
        MARGIN
    };
    let mut col = Column::new(main_x, main_width, top, style.font);
    if let Some(header) = &doc.header {
        place_header(&mut col, header, &style, main_palette);
    }
    for section in &doc.main {
        place_section(&mut col, section, &style, main_palette, true);
    }
    let main_end = col.y + MARGIN;

    let height = main_end.max(sidebar_end).max(PAGE_HEIGHT_PX);

    // backgrounds go underneath everything else
    let mut background = Vec::new();
    match style.layout {
        Layout::Sidebar => background.push(Shape::Rect {
            x: 0.0,
            y: 0.0,
            w: SIDEBAR_WIDTH,
            h: height,
            color: accent,
        }),
        Layout::Timeline => {
            background.push(Shape::Rect {
                x: 0.0,
                y: 0.0,
                w: SIDEBAR_WIDTH,
                h: height,
                color: accent.tint(0.9),
            });
            background.push(Shape::Rect {
                x: SIDEBAR_WIDTH - 4.0,
                y: 0.0,
                w: 4.0,
                h: height,
                color: accent,
            });
        }
        Layout::SingleColumn => background.push(Shape::Rect {
            x: 0.0,
            y: 0.0,
            w: PAGE_WIDTH_PX,
            h: 6.0,
            color: accent,
        }),
        Layout::Minimal | Layout::Letter => {}
    }
    background.append(&mut shapes);
    background.append(&mut col.shapes);
    text.append(&mut col.text);

    Scene {
        width: PAGE_WIDTH_PX,
        height,
        background: Rgb::WHITE,
        shapes: background,
        text,
    }
}

fn place_avatar(col: &mut Column, header: &DocumentHeader, style: &TemplateStyle) {
    if header.initials.is_empty() {
        return;
    }
    let r = 44.0;
    let cx = col.x + col.width / 2.0;
    let cy = col.y + r;
    let (disc, ink) = match style.layout {
        Layout::Sidebar => (Rgb::WHITE, style.accent),
        _ => (style.accent, Rgb::WHITE),
    };
    col.shapes.push(Shape::Disc { cx, cy, r, color: disc });
    let size = 30.0;
    let metrics = get_metrics(col.font, FontWeight::Bold);
    let w = metrics.measure_str(&header.initials) * size;
    col.text.push(TextRun {
        x: cx - w / 2.0,
        y: cy + size * 0.35,
        size,
        text: header.initials.clone(),
        font: col.font,
        weight: FontWeight::Bold,
        color: ink,
    });
    col.gap(r * 2.0 + 20.0);
}

fn place_header(col: &mut Column, header: &DocumentHeader, style: &TemplateStyle, palette: Palette) {
    let name_color = match style.layout {
        Layout::Sidebar | Layout::Timeline => style.accent,
        _ => palette.ink,
    };
    let name_weight = match style.layout {
        Layout::Minimal => FontWeight::Regular,
        _ => FontWeight::Bold,
    };
    if !header.full_name.is_empty() {
        col.write(&header.full_name, 28.0, name_weight, name_color);
    }
    if !header.headline.is_empty() {
        col.write(&header.headline, 14.0, FontWeight::Regular, palette.muted);
    }
    if !header.contacts.is_empty() {
        col.gap(4.0);
        col.write(&header.contacts.join("  ·  "), 11.0, FontWeight::Regular, palette.muted);
    }
    col.gap(12.0);
    if style.layout == Layout::SingleColumn {
        col.rule(1.5, style.accent);
        col.gap(6.0);
    }
}

fn place_section(
    col: &mut Column,
    section: &Section,
    style: &TemplateStyle,
    palette: Palette,
    in_main: bool,
) {
    if !section.title.is_empty() {
        col.gap(10.0);
        let (size, weight) = match style.layout {
            Layout::Minimal => (13.0, FontWeight::Regular),
            _ => (14.0, FontWeight::Bold),
        };
        col.write(&section.title.to_uppercase(), size, weight, palette.title);
        match style.layout {
            Layout::SingleColumn => {
                col.gap(3.0);
                col.rule(1.0, style.accent);
            }
            Layout::Minimal => {
                col.gap(3.0);
                col.rule(0.75, Rgb::TRACK);
            }
            _ => {}
        }
        col.gap(4.0);
    }

    let timeline = in_main
        && style.layout == Layout::Timeline
        && matches!(section.kind, SectionKind::Experience | SectionKind::Education);
    let section_top = col.y;

    for item in &section.items {
        match item {
            Item::Paragraph { text } => {
                let size = if section.kind == SectionKind::Letter { 12.5 } else { 11.5 };
                col.write(text, size, FontWeight::Regular, palette.ink);
                col.gap(if section.kind == SectionKind::Letter { 12.0 } else { 2.0 });
            }
            Item::Entry(entry) => {
                if timeline {
                    col.shapes.push(Shape::Disc {
                        cx: col.x - 16.0,
                        cy: col.y + 10.0,
                        r: 5.0,
                        color: style.accent,
                    });
                }
                place_entry(col, entry, palette);
            }
            Item::Level(level) => place_level(col, level, palette),
        }
    }

    if timeline {
        col.shapes.insert(
            0,
            Shape::Rect {
                x: col.x - 17.0,
                y: section_top,
                w: 2.0,
                h: (col.y - section_top).max(0.0),
                color: style.accent.tint(0.6),
            },
        );
    }
}

fn place_entry(col: &mut Column, entry: &EntryBlock, palette: Palette) {
    col.gap(4.0);
    col.write(&entry.heading, 13.0, FontWeight::Bold, palette.ink);
    if !entry.subheading.is_empty() {
        col.write(&entry.subheading, 12.0, FontWeight::Regular, palette.title);
    }
    let meta = [entry.period.as_str(), entry.location.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("  |  ");
    if !meta.is_empty() {
        col.write(&meta, 10.5, FontWeight::Regular, palette.muted);
    }
    for detail in &entry.details {
        col.write_indented(&format!("• {detail}"), 11.0, FontWeight::Regular, palette.ink, 6.0);
    }
    col.gap(6.0);
}

fn place_level(col: &mut Column, level: &LevelItem, palette: Palette) {
    col.write(
        &format!("{}  ·  {}", level.name, level.label),
        11.0,
        FontWeight::Regular,
        palette.ink,
    );
    col.gauge(level.percent, palette.track, palette.fill);
    col.gap(4.0);
}
