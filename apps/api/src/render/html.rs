//! HTML preview of a rendered document.

use std::fmt::Write;

use crate::render::document::{DocumentHeader, Item, RenderedDocument, Section};
use crate::render::templates::Layout;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout_class(layout: Layout) -> &'static str {
    match layout {
        Layout::Sidebar => "layout-sidebar",
        Layout::SingleColumn => "layout-single",
        Layout::Timeline => "layout-timeline",
        Layout::Minimal => "layout-minimal",
        Layout::Letter => "layout-letter",
    }
}

pub fn to_html(doc: &RenderedDocument) -> String {
    let accent = doc.style.accent.to_hex();
    let font = doc.style.font.css_stack();
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>\
         body{{margin:0;font-family:{font};color:#1f2937}}\
         .page{{width:794px;margin:0 auto;display:flex;background:#fff}}\
         .sidebar{{width:260px;padding:24px;background:{accent};color:#fff}}\
         .layout-timeline .sidebar{{background:#fff7ed;color:#1f2937;border-right:4px solid {accent}}}\
         .main{{flex:1;padding:32px}}\
         h1{{margin:0}} h2{{color:{accent};font-size:15px;text-transform:uppercase}}\
         .layout-minimal h2{{color:#111;border-bottom:1px solid #e5e7eb;font-weight:400}}\
         .gauge{{height:6px;background:#e5e7eb;border-radius:3px}}\
         .gauge span{{display:block;height:6px;background:{accent};border-radius:3px}}\
         .avatar{{width:96px;height:96px;border-radius:50%;object-fit:cover}}\
         .period{{color:#6b7280;font-size:12px}}\
         </style></head><body><div class=\"page {}\">",
        layout_class(doc.style.layout)
    );

    if !doc.sidebar.is_empty() {
        html.push_str("<aside class=\"sidebar\">");
        if let Some(header) = &doc.header {
            write_avatar(&mut html, header);
        }
        for section in &doc.sidebar {
            write_section(&mut html, section);
        }
        html.push_str("</aside>");
    }

    html.push_str("<main class=\"main\">");
    if let Some(header) = &doc.header {
        write_header(&mut html, header);
    }
    for section in &doc.main {
        write_section(&mut html, section);
    }
    html.push_str("</main></div></body></html>");
    html
}

fn write_avatar(html: &mut String, header: &DocumentHeader) {
    match &header.photo {
        Some(src) => {
            let _ = write!(
                html,
                "<img class=\"avatar\" src=\"{}\" alt=\"{}\">",
                escape(src),
                escape(&header.full_name)
            );
        }
        None if !header.initials.is_empty() => {
            let _ = write!(html, "<div class=\"avatar initials\">{}</div>", escape(&header.initials));
        }
        None => {}
    }
}

fn write_header(html: &mut String, header: &DocumentHeader) {
    html.push_str("<header>");
    let _ = write!(html, "<h1>{}</h1>", escape(&header.full_name));
    if !header.headline.is_empty() {
        let _ = write!(html, "<p class=\"headline\">{}</p>", escape(&header.headline));
    }
    if !header.contacts.is_empty() {
        let joined = header
            .contacts
            .iter()
            .map(|c| escape(c))
            .collect::<Vec<_>>()
            .join(" · ");
        let _ = write!(html, "<p class=\"contacts\">{joined}</p>");
    }
    html.push_str("</header>");
}

fn write_section(html: &mut String, section: &Section) {
    html.push_str("<section>");
    if !section.title.is_empty() {
        let _ = write!(html, "<h2>{}</h2>", escape(&section.title));
    }
    for item in &section.items {
        match item {
            Item::Paragraph { text } => {
                let body = text
                    .lines()
                    .map(escape)
                    .collect::<Vec<_>>()
                    .join("<br>");
                let _ = write!(html, "<p>{body}</p>");
            }
            Item::Entry(entry) => {
                let _ = write!(
                    html,
                    "<article><h3>{}</h3><p>{}</p><p class=\"period\">{}</p>",
                    escape(&entry.heading),
                    escape(&entry.subheading),
                    escape(&entry.period)
                );
                if !entry.location.is_empty() {
                    let _ = write!(html, "<p class=\"period\">{}</p>", escape(&entry.location));
                }
                if !entry.details.is_empty() {
                    html.push_str("<ul>");
                    for line in &entry.details {
                        let _ = write!(html, "<li>{}</li>", escape(line));
                    }
                    html.push_str("</ul>");
                }
                html.push_str("</article>");
            }
            Item::Level(level) => {
                let _ = write!(
                    html,
                    "<div class=\"level\"><span>{}</span> <small>{}</small>\
                     <div class=\"gauge\"><span style=\"width:{}%\"></span></div></div>",
                    escape(&level.name),
                    escape(&level.label),
                    level.percent
                );
            }
        }
    }
    html.push_str("</section>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{CvRecord, PersonalInfo};
    use crate::models::user::Locale;
    use crate::render::{render_cv, TemplateId};

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>R&D</b>"), "&lt;b&gt;R&amp;D&lt;/b&gt;");
        assert_eq!(escape("l'équipe"), "l&#39;équipe");
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut cv = CvRecord::new_editor();
        cv.personal_info = Some(PersonalInfo {
            first_name: "<script>".into(),
            last_name: "X".into(),
            ..Default::default()
        });
        let html = to_html(&render_cv(&cv, TemplateId::Classique, Locale::Fr));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt; X"));
        assert!(html.contains("layout-single"));
    }
}
