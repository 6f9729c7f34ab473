//! Heuristic CV text parser.
//!
//! One pass over the trimmed, non-empty lines. Contact fields are first-match
//! wins; a small state machine driven by section headings collects entries.
//! Parsing never fails: whatever is not recognised stays empty.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::models::cv::{
    fold_accents, Education, Experience, ExtractedCvData, Language, LanguageLevel, PersonalInfo,
    Skill, SkillLevel, YearMonth,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+\d{1,3}(?:[\s.-]?\d{2,4}){2,5}|\b(?:\d{2}[\s.-]){3,4}\d{2}\b")
        .expect("valid phone regex")
});

static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\b(?P<n1>\d{1,2})[/.]|\b(?P<w1>[a-zà-ÿ]+\.?)\s+)?\b(?P<y1>\d{4})\b\s*(?:[-–—]|à|au|to)\s*(?:(?:\b(?P<n2>\d{1,2})[/.]|\b(?P<w2>[a-zà-ÿ]+\.?)\s+)?(?P<y2>\d{4})\b|(?P<present>présent|present|aujourd'hui|en cours|actuellement|actuel|current|now))",
    )
    .expect("valid date range regex")
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));

static LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*\((.+?)\)").expect("valid level regex"));

const BULLETS: [char; 6] = ['•', '*', '–', '·', '▪', '-'];

/// Countries recognised on the location line.
const COUNTRIES: &[&str] = &[
    "niger",
    "nigeria",
    "france",
    "senegal",
    "mali",
    "burkina faso",
    "benin",
    "cote d'ivoire",
    "togo",
    "tchad",
    "cameroun",
    "cameroon",
    "guinee",
    "mauritanie",
    "maroc",
    "morocco",
    "algerie",
    "tunisie",
    "belgique",
    "belgium",
    "suisse",
    "switzerland",
    "canada",
    "ghana",
    "usa",
    "united states",
    "royaume-uni",
    "united kingdom",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Experience,
    Education,
    Skills,
    Languages,
}

/// Returns the text after a leading bullet marker, if any.
fn strip_bullet(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    if !BULLETS.contains(&first) {
        return None;
    }
    let rest = &line[first.len_utf8()..];
    // "-5%" or "*args" are not bullets
    if matches!(first, '-' | '*') && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

fn is_bullet(line: &str) -> bool {
    strip_bullet(line).is_some()
}

/// Section headings are short standalone lines, never bullets or entries.
fn section_heading(line: &str) -> Option<Section> {
    if is_bullet(line)
        || line.contains(" - ")
        || line.contains('(')
        || line.split_whitespace().count() > 5
    {
        return None;
    }
    let folded = fold_accents(line);
    if folded.contains("experience") {
        Some(Section::Experience)
    } else if folded.contains("formation") || folded.contains("education") {
        Some(Section::Education)
    } else if folded.contains("competences") {
        Some(Section::Skills)
    } else if folded.contains("langues") {
        Some(Section::Languages)
    } else {
        None
    }
}

/// Whole-word match over the accent-folded line.
static COUNTRY_RE: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<String> = COUNTRIES.iter().map(|c| regex::escape(c)).collect();
    Regex::new(&format!(r"\b(?:{})\b", names.join("|"))).expect("valid country regex")
});

fn mentions_country(line: &str) -> bool {
    COUNTRY_RE.is_match(&fold_accents(line))
}

/// French and English month names and their usual abbreviations.
pub fn month_number(word: &str) -> Option<u32> {
    let folded = fold_accents(word);
    let m = match folded.trim_end_matches('.') {
        "janvier" | "janv" | "january" | "jan" => 1,
        "fevrier" | "fevr" | "fev" | "february" | "feb" => 2,
        "mars" | "march" | "mar" => 3,
        "avril" | "avr" | "april" | "apr" => 4,
        "mai" | "may" => 5,
        "juin" | "june" | "jun" => 6,
        "juillet" | "juil" | "july" | "jul" => 7,
        "aout" | "august" | "aug" => 8,
        "septembre" | "sept" | "september" | "sep" => 9,
        "octobre" | "october" | "oct" => 10,
        "novembre" | "november" | "nov" => 11,
        "decembre" | "december" | "dec" => 12,
        _ => return None,
    };
    Some(m)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DateRange {
    start: Option<YearMonth>,
    /// `None` with `present == true` means ongoing.
    end: Option<YearMonth>,
    present: bool,
}

/// The month is either numeric (`01/2019`) or a month name (`Janvier 2019`).
fn year_month(
    year: Option<regex::Match<'_>>,
    numeric: Option<regex::Match<'_>>,
    word: Option<regex::Match<'_>>,
) -> Option<YearMonth> {
    let year = year?.as_str().parse().ok()?;
    let month = match (numeric, word) {
        (Some(n), _) => Some(n.as_str().parse().ok()?),
        (None, Some(w)) => month_number(w.as_str()),
        (None, None) => None,
    };
    YearMonth::new(year, month)
}

/// Finds a date range anywhere in the line; trailing text such as "(5 ans)" is ignored.
fn parse_date_range(line: &str) -> Option<DateRange> {
    let caps = DATE_RANGE_RE.captures(line)?;
    let present = caps.name("present").is_some();
    Some(DateRange {
        start: year_month(caps.name("y1"), caps.name("n1"), caps.name("w1")),
        end: if present {
            None
        } else {
            year_month(caps.name("y2"), caps.name("n2"), caps.name("w2"))
        },
        present,
    })
}

/// Bullets are description text even when they mention years.
fn date_line(line: &str) -> Option<DateRange> {
    if is_bullet(line) {
        return None;
    }
    parse_date_range(line)
}

fn parse_level_line(line: &str) -> Option<(String, Option<String>)> {
    let body = strip_bullet(line).unwrap_or(line).trim();
    if let Some(caps) = LEVEL_RE.captures(body) {
        let name = caps[1].trim().to_string();
        let level = caps[2].trim().to_string();
        return (!name.is_empty()).then_some((name, Some(level)));
    }
    (!body.is_empty()).then(|| (body.to_string(), None))
}

#[derive(Default)]
struct ParserState {
    info: PersonalInfo,
    experience: Vec<Experience>,
    education: Vec<Education>,
    skills: Vec<Skill>,
    languages: Vec<Language>,
    open_experience: Option<Experience>,
    open_education: Option<Education>,
}

impl ParserState {
    fn close_entries(&mut self) {
        if let Some(e) = self.open_experience.take() {
            self.experience.push(e);
        }
        if let Some(e) = self.open_education.take() {
            self.education.push(e);
        }
    }

    fn experience_line(&mut self, line: &str) {
        if let Some(range) = date_line(line) {
            if let Some(open) = self.open_experience.as_mut() {
                open.start_date = range.start;
                open.end_date = range.end;
                open.current = range.present;
            }
        } else if let (Some((title, company)), false) = (line.split_once(" - "), is_bullet(line)) {
            if let Some(done) = self.open_experience.take() {
                self.experience.push(done);
            }
            self.open_experience = Some(Experience {
                id: Uuid::new_v4(),
                title: title.trim().to_string(),
                company: company.trim().to_string(),
                ..Experience::blank()
            });
        } else if is_bullet(line) {
            if let Some(open) = self.open_experience.as_mut() {
                if !open.description.is_empty() {
                    open.description.push('\n');
                }
                open.description.push_str(line);
            }
        }
    }

    fn education_line(&mut self, line: &str) {
        if let Some(range) = date_line(line) {
            if let Some(open) = self.open_education.as_mut() {
                open.start_date = range.start;
                open.end_date = range.end;
            }
        } else if let (Some((degree, institution)), false) =
            (line.split_once(" - "), is_bullet(line))
        {
            if let Some(done) = self.open_education.take() {
                self.education.push(done);
            }
            self.open_education = Some(Education {
                id: Uuid::new_v4(),
                degree: degree.trim().to_string(),
                institution: institution.trim().to_string(),
                ..Education::blank()
            });
        } else if !YEAR_RE.is_match(line) {
            if let Some(open) = self.open_education.as_mut() {
                let text = strip_bullet(line).unwrap_or(line);
                if !open.description.is_empty() {
                    open.description.push(' ');
                }
                open.description.push_str(text);
            }
        }
    }

    fn level_line(&mut self, line: &str, section: Section) {
        if !is_bullet(line) && !line.contains('(') {
            return;
        }
        let Some((name, level)) = parse_level_line(line) else {
            return;
        };
        let level = level.unwrap_or_default();
        match section {
            Section::Skills => self.skills.push(Skill {
                id: Uuid::new_v4(),
                name,
                level: SkillLevel::parse_lenient(&level),
            }),
            Section::Languages => self.languages.push(Language {
                id: Uuid::new_v4(),
                name,
                level: LanguageLevel::parse_lenient(&level),
            }),
            _ => {}
        }
    }
}

/// Only the first line may carry the name: two or more tokens, no contact data, not a heading.
fn name_line(line: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if is_bullet(line)
        || tokens.len() < 2
        || line.contains('@')
        || line.chars().any(|c| c.is_ascii_digit())
        || section_heading(line).is_some()
    {
        return None;
    }
    Some((tokens[0].to_string(), tokens[1..].join(" ")))
}

/// Turns raw CV text into structured fields for review.
pub fn parse_cv_text(text: &str) -> ExtractedCvData {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut state = ParserState::default();
    let mut section = Section::None;
    // index of the first section heading; the summary is searched above it
    let mut header_end = lines.len();

    if let Some((first, last)) = lines.first().and_then(|line| name_line(line)) {
        state.info.first_name = first;
        state.info.last_name = last;
    }

    for (i, &line) in lines.iter().enumerate() {
        if state.info.email.is_empty() {
            if let Some(m) = EMAIL_RE.find(line) {
                state.info.email = m.as_str().to_string();
            }
        }

        if state.info.phone.is_empty() && !line.contains('@') {
            if let Some(m) = PHONE_RE.find(line) {
                state.info.phone = m.as_str().trim().to_string();
            }
        }

        if state.info.city.is_empty() && mentions_country(line) {
            if let Some((city, country)) = line.split_once(',') {
                state.info.city = city.trim().to_string();
                state.info.country = country.trim().to_string();
            }
        }

        if let Some(next) = section_heading(line) {
            state.close_entries();
            section = next;
            header_end = header_end.min(i);
            continue;
        }

        match section {
            Section::Experience => state.experience_line(line),
            Section::Education => state.education_line(line),
            Section::Skills | Section::Languages => state.level_line(line, section),
            Section::None => {}
        }
    }
    state.close_entries();

    let info = &state.info;
    let summary = lines
        .iter()
        .take(10)
        .take(header_end)
        .find(|line| {
            line.chars().count() > 20
                && !is_bullet(line)
                && parse_date_range(line).is_none()
                && (info.email.is_empty() || !line.contains(info.email.as_str()))
                && !line.contains('@')
                && (info.phone.is_empty() || !line.contains(info.phone.as_str()))
                && !mentions_country(line)
                && (info.first_name.is_empty() || !line.contains(info.first_name.as_str()))
        })
        .map(|s| s.to_string())
        .unwrap_or_default();
    state.info.summary = summary;

    ExtractedCvData {
        personal_info: state.info,
        education: state.education,
        experience: state.experience,
        skills: state.skills,
        languages: state.languages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const JOHN_DOE: &str = "
        John Doe
        john.doe@email.com
        +227 20 12 34 56
        Niamey, Niger

        EXPÉRIENCE PROFESSIONNELLE

        Développeur Web Senior - Tech Solutions Niger
        Janvier 2022 - Présent
        • Développement d'applications web avec React et Node.js
        • Gestion d'équipe de 3 développeurs
        • Amélioration des performances des applications existantes

        Développeur Junior - Digital Niger
        Mars 2020 - Décembre 2021
        • Création de sites web responsives
        • Maintenance et debugging d'applications

        FORMATION

        Licence en Informatique - Université Abdou Moumouni
        2017 - 2020
        Spécialisation en développement web et bases de données

        COMPÉTENCES
        • JavaScript (Avancé)
        • React (Avancé)
        • Node.js (Intermédiaire)
        • Python (Intermédiaire)

        LANGUES
        • Français (Natif)
        • Anglais (Avancé)
        • Haoussa (Intermédiaire)
    ";

    const MARIE_ABDOU: &str = "
        Marie Abdou
        marie.abdou@email.com
        +227 20 98 76 54
        Niamey, Niger

        Profil professionnel motivé avec 3 ans d'expérience en marketing digital

        EXPÉRIENCE PROFESSIONNELLE

        Marketing Manager - StartupNiger
        Juin 2021 - Présent
        • Gestion des campagnes publicitaires digitales
        • Augmentation du trafic web de 150%
        • Management d'une équipe de 2 personnes

        Assistant Marketing - Commerce Plus
        Septembre 2020 - Mai 2021
        • Création de contenu pour les réseaux sociaux
        • Analyse des performances marketing

        FORMATION

        Master en Marketing - Institut Supérieur de Commerce
        2018 - 2020
        Mention Bien

        COMPÉTENCES
        • Google Ads (Expert)
        • Facebook Ads (Avancé)
        • Analytics (Avancé)
        • Photoshop (Intermédiaire)

        LANGUES
        • Français (Natif)
        • Anglais (Avancé)
    ";

    #[test]
    fn test_john_doe_contact_and_entries() {
        let data = parse_cv_text(JOHN_DOE);
        let info = &data.personal_info;
        assert_eq!(info.first_name, "John");
        assert_eq!(info.last_name, "Doe");
        assert_eq!(info.email, "john.doe@email.com");
        assert_eq!(info.phone, "+227 20 12 34 56");
        assert_eq!(info.city, "Niamey");
        assert_eq!(info.country, "Niger");
        assert_eq!(info.summary, "");

        assert_eq!(data.experience.len(), 2);
        let senior = &data.experience[0];
        assert_eq!(senior.title, "Développeur Web Senior");
        assert_eq!(senior.company, "Tech Solutions Niger");
        assert_eq!(senior.start_date, YearMonth::new(2022, Some(1)));
        assert_eq!(senior.end_date, None);
        assert!(senior.current);
        assert_eq!(senior.description.lines().count(), 3);

        let junior = &data.experience[1];
        assert_eq!(junior.start_date, YearMonth::new(2020, Some(3)));
        assert_eq!(junior.end_date, YearMonth::new(2021, Some(12)));
        assert!(!junior.current);

        assert_eq!(data.education.len(), 1);
        assert_eq!(data.education[0].degree, "Licence en Informatique");
        assert_eq!(data.education[0].institution, "Université Abdou Moumouni");
        assert_eq!(data.education[0].start_date, YearMonth::new(2017, None));
        assert_eq!(data.education[0].end_date, YearMonth::new(2020, None));
        assert_eq!(
            data.education[0].description,
            "Spécialisation en développement web et bases de données"
        );

        let skills: Vec<(&str, SkillLevel)> =
            data.skills.iter().map(|s| (s.name.as_str(), s.level)).collect();
        assert_eq!(
            skills,
            vec![
                ("JavaScript", SkillLevel::Avance),
                ("React", SkillLevel::Avance),
                ("Node.js", SkillLevel::Intermediaire),
                ("Python", SkillLevel::Intermediaire),
            ]
        );
        assert_eq!(data.languages.len(), 3);
        assert_eq!(data.languages[2].name, "Haoussa");
    }

    #[test]
    fn test_marie_abdou_scenario() {
        let data = parse_cv_text(MARIE_ABDOU);
        let info = &data.personal_info;
        assert_eq!(info.first_name, "Marie");
        assert_eq!(info.last_name, "Abdou");
        assert_eq!(
            info.summary,
            "Profil professionnel motivé avec 3 ans d'expérience en marketing digital"
        );

        assert_eq!(data.experience.len(), 2);
        assert_eq!(data.experience[0].title, "Marketing Manager");
        assert_eq!(data.experience[0].company, "StartupNiger");
        assert!(data.experience[0].current);
        assert_eq!(data.experience[0].start_date, YearMonth::new(2021, Some(6)));
        assert_eq!(data.experience[1].end_date, YearMonth::new(2021, Some(5)));

        assert_eq!(data.education[0].description, "Mention Bien");
        assert_eq!(data.skills[0].name, "Google Ads");
        assert_eq!(data.skills[0].level, SkillLevel::Expert);
        assert_eq!(
            data.languages.iter().map(|l| l.level).collect::<Vec<_>>(),
            vec![LanguageLevel::Natif, LanguageLevel::Avance]
        );
    }

    #[test]
    fn test_first_email_wins() {
        let data = parse_cv_text("Awa Diallo\nawa@first.ne\ncontact: awa.pro@second.com");
        assert_eq!(data.personal_info.email, "awa@first.ne");
    }

    #[test]
    fn test_skill_without_level_defaults_to_intermediate() {
        let data = parse_cv_text("COMPÉTENCES\n• Excel\n• Word (Expert)\nLANGUES\n• Zarma");
        assert_eq!(data.skills[0].name, "Excel");
        assert_eq!(data.skills[0].level, SkillLevel::Intermediaire);
        assert_eq!(data.skills[1].level, SkillLevel::Expert);
        assert_eq!(data.languages[0].level, LanguageLevel::Intermediaire);
    }

    #[test]
    fn test_unstructured_text_yields_empty_fields() {
        let data = parse_cv_text("bonjour\n\n\nrien");
        assert_eq!(data.personal_info.first_name, "");
        assert!(data.experience.is_empty());
        assert!(data.skills.is_empty());
        assert_eq!(parse_cv_text(""), ExtractedCvData::default());
    }

    #[test]
    fn test_english_dates_and_present_tokens() {
        let range = parse_date_range("March 2019 - now").unwrap();
        assert_eq!(range.start, YearMonth::new(2019, Some(3)));
        assert!(range.present);
        assert_eq!(
            parse_date_range("sept. 2015 – août 2018").unwrap().end,
            YearMonth::new(2018, Some(8))
        );
        assert!(date_line("• 2019 - 2020 projet").is_none());
    }

    #[test]
    fn test_date_line_with_trailing_duration() {
        let data = parse_cv_text(
            "EXPÉRIENCE\nComptable - Sonidep\nJanvier 2019 - Présent (5 ans)\n• Bilans",
        );
        assert_eq!(data.experience.len(), 1);
        let entry = &data.experience[0];
        assert_eq!(entry.title, "Comptable");
        assert_eq!(entry.company, "Sonidep");
        assert_eq!(entry.start_date, YearMonth::new(2019, Some(1)));
        assert!(entry.current);
        assert_eq!(entry.description, "• Bilans");
    }

    #[test]
    fn test_numeric_month_dates() {
        let data = parse_cv_text(
            "EXPÉRIENCE\nComptable - Sonidep\n01/2019 - 12/2021\nFORMATION\nBTS - Lycée\n09/2015 - 06/2017",
        );
        assert_eq!(data.experience.len(), 1);
        assert_eq!(data.experience[0].start_date, YearMonth::new(2019, Some(1)));
        assert_eq!(data.experience[0].end_date, YearMonth::new(2021, Some(12)));
        assert!(!data.experience[0].current);
        assert_eq!(data.education[0].start_date, YearMonth::new(2015, Some(9)));
        assert_eq!(data.education[0].end_date, YearMonth::new(2017, Some(6)));

        let range = parse_date_range("Stage 2018 - 2019 à Niamey").unwrap();
        assert_eq!(range.start, YearMonth::new(2018, None));
        assert_eq!(range.end, YearMonth::new(2019, None));
        assert!(parse_date_range("13/2019 - 2020").unwrap().start.is_none());
    }

    #[test]
    fn test_name_comes_only_from_first_line() {
        let data = parse_cv_text(
            "Moussa\nProfil professionnel motivé en gestion de projets\nmoussa@mail.ne",
        );
        assert_eq!(data.personal_info.first_name, "");
        assert_eq!(data.personal_info.last_name, "");
        assert_eq!(data.personal_info.email, "moussa@mail.ne");
        assert_eq!(
            data.personal_info.summary,
            "Profil professionnel motivé en gestion de projets"
        );
    }

    #[test]
    fn test_comma_line_without_country_is_not_the_location() {
        let data = parse_cv_text("Awa Diallo\nCertifiée Normalisation, qualité ISO\nNiamey, Niger");
        assert_eq!(data.personal_info.city, "Niamey");
        assert_eq!(data.personal_info.country, "Niger");
        assert!(!mentions_country("Usage avancé, Nigerian"));
        assert!(mentions_country("Abidjan, Côte d'Ivoire"));
    }

    #[test]
    fn test_title_split_on_first_separator() {
        let data = parse_cv_text("EXPÉRIENCE\nChef de projet - Orange Niger - Niamey\n2019 - 2021");
        assert_eq!(data.experience[0].title, "Chef de projet");
        assert_eq!(data.experience[0].company, "Orange Niger - Niamey");
        assert_eq!(data.experience[0].end_date, YearMonth::new(2021, None));
    }

    #[test]
    fn test_entry_title_containing_keyword_is_not_a_heading() {
        let data = parse_cv_text(
            "EXPÉRIENCE\nResponsable Formation - Orange Niger\n2019 - 2021\nFORMATION\nBTS - Lycée",
        );
        assert_eq!(data.experience.len(), 1);
        assert_eq!(data.experience[0].title, "Responsable Formation");
        assert_eq!(data.education[0].degree, "BTS");
    }
}
