use crate::models::letter::LetterRecord;
use crate::render::document::{Item, RenderedDocument, Section, SectionKind};
use crate::render::templates::TemplateStyle;

/// Lays a letter out as a single column of paragraphs. Blank lines separate
/// paragraphs; single newlines stay inside the paragraph as line breaks.
pub fn render_letter(letter: &LetterRecord) -> RenderedDocument {
    let items = letter
        .content
        .replace("\r\n", "\n")
        .split("\n\n")
        .map(|block| block.trim_matches('\n'))
        .filter(|block| !block.trim().is_empty())
        .map(|block| Item::Paragraph {
            text: block.to_string(),
        })
        .collect();

    RenderedDocument {
        template: None,
        style: TemplateStyle::letter(),
        header: None,
        sidebar: Vec::new(),
        main: vec![Section {
            kind: SectionKind::Letter,
            title: String::new(),
            items,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::CvRecord;
    use crate::models::letter::{ApplicationDescriptor, ApplicationType};

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let letter = LetterRecord::new(
            &CvRecord::new_editor(),
            ApplicationDescriptor {
                job_title: "Comptable".into(),
                company_name: "BIA Niger".into(),
                job_description: "Comptabilité".into(),
                sector: "Banque".into(),
                application_type: ApplicationType::Offre,
            },
            "Marie Abdou\nNiamey, Niger\n\n\n\nMadame, Monsieur,\n\nCorps".into(),
        );
        let doc = render_letter(&letter);
        let items = &doc.main[0].items;
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            Item::Paragraph {
                text: "Marie Abdou\nNiamey, Niger".into()
            }
        );
        assert!(doc.template.is_none());
    }
}
