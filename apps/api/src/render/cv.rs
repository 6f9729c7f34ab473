use crate::models::cv::{CvRecord, PersonalInfo};
use crate::models::user::Locale;
use crate::render::dates::format_period;
use crate::render::document::{
    DocumentHeader, EntryBlock, Item, LevelItem, RenderedDocument, Section, SectionKind,
};
use crate::render::templates::{Layout, TemplateId, TemplateStyle};

fn section_title(kind: SectionKind, locale: Locale) -> &'static str {
    match (kind, locale) {
        (SectionKind::Contact, _) => "Contact",
        (SectionKind::Profile, Locale::Fr) => "Profil",
        (SectionKind::Profile, Locale::En) => "Profile",
        (SectionKind::Experience, Locale::Fr) => "Expérience professionnelle",
        (SectionKind::Experience, Locale::En) => "Professional experience",
        (SectionKind::Education, Locale::Fr) => "Formation",
        (SectionKind::Education, Locale::En) => "Education",
        (SectionKind::Skills, Locale::Fr) => "Compétences",
        (SectionKind::Skills, Locale::En) => "Skills",
        (SectionKind::Languages, Locale::Fr) => "Langues",
        (SectionKind::Languages, Locale::En) => "Languages",
        (SectionKind::Letter, _) => "",
    }
}

fn level_label(french: &'static str, locale: Locale) -> String {
    let label = match (locale, french) {
        (Locale::Fr, _) => french,
        (Locale::En, "Débutant") => "Beginner",
        (Locale::En, "Intermédiaire") => "Intermediate",
        (Locale::En, "Avancé") => "Advanced",
        (Locale::En, "Natif") => "Native",
        (Locale::En, other) => other,
    };
    label.to_string()
}

fn initials(info: &PersonalInfo) -> String {
    [&info.first_name, &info.last_name]
        .iter()
        .filter_map(|part| part.trim().chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

fn contact_lines(info: &PersonalInfo) -> Vec<String> {
    let place = [info.city.trim(), info.country.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    [
        info.email.trim().to_string(),
        info.phone.trim().to_string(),
        info.address.trim().to_string(),
        place,
    ]
    .into_iter()
    .filter(|line| !line.is_empty())
    .collect()
}

fn description_lines(description: &str) -> Vec<String> {
    description
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders a CV with the given template. Only entries carrying their
/// identifying fields are shown, and a section with none of them is omitted.
pub fn render_cv(cv: &CvRecord, template: TemplateId, locale: Locale) -> RenderedDocument {
    let style = template.style();
    let info = cv.personal_info.clone().unwrap_or_default();

    let headline = cv
        .experience
        .iter()
        .find(|e| e.is_filled())
        .map(|e| e.title.trim().to_string())
        .unwrap_or_default();

    let contacts = contact_lines(&info);
    let mut header = DocumentHeader {
        full_name: info.full_name(),
        headline,
        initials: initials(&info),
        contacts: contacts.clone(),
        photo: info.profile_image.clone().filter(|p| !p.is_empty()),
    };

    let mut sections = Vec::new();

    if !info.summary.trim().is_empty() {
        sections.push(Section {
            kind: SectionKind::Profile,
            title: section_title(SectionKind::Profile, locale).to_string(),
            items: vec![Item::Paragraph {
                text: info.summary.trim().to_string(),
            }],
        });
    }

    let experience: Vec<Item> = cv
        .experience
        .iter()
        .filter(|e| e.is_filled())
        .map(|e| {
            Item::Entry(EntryBlock {
                heading: e.title.trim().to_string(),
                subheading: e.company.trim().to_string(),
                period: format_period(e.start_date, e.end_date, e.current, &style, locale),
                location: e.location.trim().to_string(),
                details: description_lines(&e.description),
            })
        })
        .collect();
    push_section(&mut sections, SectionKind::Experience, experience, locale);

    let education: Vec<Item> = cv
        .education
        .iter()
        .filter(|e| e.is_filled())
        .map(|e| {
            Item::Entry(EntryBlock {
                heading: e.degree.trim().to_string(),
                subheading: e.institution.trim().to_string(),
                period: format_period(e.start_date, e.end_date, false, &style, locale),
                location: e.location.trim().to_string(),
                details: description_lines(&e.description),
            })
        })
        .collect();
    push_section(&mut sections, SectionKind::Education, education, locale);

    let skills: Vec<Item> = cv
        .skills
        .iter()
        .filter(|s| s.is_filled())
        .map(|s| {
            Item::Level(LevelItem {
                name: s.name.trim().to_string(),
                label: level_label(s.level.as_str(), locale),
                percent: s.level.percent(),
            })
        })
        .collect();
    push_section(&mut sections, SectionKind::Skills, skills, locale);

    let languages: Vec<Item> = cv
        .languages
        .iter()
        .filter(|l| l.is_filled())
        .map(|l| {
            Item::Level(LevelItem {
                name: l.name.trim().to_string(),
                label: level_label(l.level.as_str(), locale),
                percent: l.level.percent(),
            })
        })
        .collect();
    push_section(&mut sections, SectionKind::Languages, languages, locale);

    let (sidebar, main) = arrange(&style, sections, &contacts, locale);
    if style.layout.has_sidebar() {
        // contacts live in the sidebar for these layouts
        header.contacts.clear();
    }

    RenderedDocument {
        template: Some(template),
        style,
        header: Some(header),
        sidebar,
        main,
    }
}

fn push_section(sections: &mut Vec<Section>, kind: SectionKind, items: Vec<Item>, locale: Locale) {
    if !items.is_empty() {
        sections.push(Section {
            kind,
            title: section_title(kind, locale).to_string(),
            items,
        });
    }
}

/// Splits sections between sidebar and main column according to the layout.
fn arrange(
    style: &TemplateStyle,
    sections: Vec<Section>,
    contacts: &[String],
    locale: Locale,
) -> (Vec<Section>, Vec<Section>) {
    if !style.layout.has_sidebar() {
        return (Vec::new(), sections);
    }

    let mut sidebar = Vec::new();
    if !contacts.is_empty() {
        sidebar.push(Section {
            kind: SectionKind::Contact,
            title: section_title(SectionKind::Contact, locale).to_string(),
            items: contacts
                .iter()
                .map(|c| Item::Paragraph { text: c.clone() })
                .collect(),
        });
    }
    let mut main = Vec::new();
    for section in sections {
        let in_sidebar = match style.layout {
            Layout::Sidebar => matches!(
                section.kind,
                SectionKind::Skills | SectionKind::Languages
            ),
            Layout::Timeline => matches!(
                section.kind,
                SectionKind::Profile | SectionKind::Skills | SectionKind::Languages
            ),
            _ => false,
        };
        if in_sidebar {
            sidebar.push(section);
        } else {
            main.push(section);
        }
    }
    (sidebar, main)
}
