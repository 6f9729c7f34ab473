//! CV data model shared by the editor, the extraction pipeline, the renderer
//! and the letter composer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::render::TemplateId;

// ────────────────────────────────────────────────────────────────────────────
// Year-month dates
// ────────────────────────────────────────────────────────────────────────────

/// A year with an optional month, as entered in `<input type="month">`
/// fields or recovered from free text. Serialized as `"YYYY-MM"` or `"YYYY"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: Option<u32>,
}

impl YearMonth {
    pub fn new(year: i32, month: Option<u32>) -> Option<Self> {
        match month {
            Some(m) if !(1..=12).contains(&m) => None,
            _ => Some(YearMonth { year, month }),
        }
    }

    /// Accepts `YYYY-MM`, `YYYY` and `MM/YYYY`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some((year, month)) = raw.split_once('-') {
            return YearMonth::new(year.parse().ok()?, Some(month.parse().ok()?));
        }
        if let Some((month, year)) = raw.split_once('/') {
            return YearMonth::new(year.parse().ok()?, Some(month.parse().ok()?));
        }
        if raw.len() == 4 {
            return YearMonth::new(raw.parse().ok()?, None);
        }
        None
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{:04}-{:02}", self.year, m),
            None => write!(f, "{:04}", self.year),
        }
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        YearMonth::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid year-month '{raw}'")))
    }
}

/// Form inputs send `""` for an untouched month field.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<YearMonth>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => YearMonth::parse(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid year-month '{s}'"))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Proficiency levels
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SkillLevel {
    #[serde(rename = "Débutant")]
    Debutant,
    #[default]
    #[serde(rename = "Intermédiaire")]
    Intermediaire,
    #[serde(rename = "Avancé")]
    Avance,
    #[serde(rename = "Expert")]
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LanguageLevel {
    #[serde(rename = "Débutant")]
    Debutant,
    #[default]
    #[serde(rename = "Intermédiaire")]
    Intermediaire,
    #[serde(rename = "Avancé")]
    Avance,
    #[serde(rename = "Natif")]
    Natif,
}

/// Folds case and the French accents found in level names.
pub fn fold_accents(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// 1 = beginner .. 4 = top level.
fn level_rank(raw: &str) -> Option<u8> {
    match fold_accents(raw).as_str() {
        "debutant" | "debutante" | "beginner" | "notions" | "elementaire" | "basic" => Some(1),
        "intermediaire" | "intermediate" | "moyen" => Some(2),
        "avance" | "avancee" | "advanced" | "courant" | "fluent" | "confirme" => Some(3),
        "expert" | "experte" | "natif" | "native" | "maternelle" | "langue maternelle"
        | "bilingue" => Some(4),
        _ => None,
    }
}

impl SkillLevel {
    /// Unknown labels fall back to `Intermédiaire`.
    pub fn parse_lenient(raw: &str) -> Self {
        match level_rank(raw) {
            Some(1) => SkillLevel::Debutant,
            Some(3) => SkillLevel::Avance,
            Some(4) => SkillLevel::Expert,
            _ => SkillLevel::Intermediaire,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Debutant => "Débutant",
            SkillLevel::Intermediaire => "Intermédiaire",
            SkillLevel::Avance => "Avancé",
            SkillLevel::Expert => "Expert",
        }
    }

    /// Gauge fill as a percentage.
    pub fn percent(&self) -> u8 {
        match self {
            SkillLevel::Expert => 100,
            SkillLevel::Avance => 80,
            SkillLevel::Intermediaire => 60,
            SkillLevel::Debutant => 40,
        }
    }
}

impl LanguageLevel {
    pub fn parse_lenient(raw: &str) -> Self {
        match level_rank(raw) {
            Some(1) => LanguageLevel::Debutant,
            Some(3) => LanguageLevel::Avance,
            Some(4) => LanguageLevel::Natif,
            _ => LanguageLevel::Intermediaire,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLevel::Debutant => "Débutant",
            LanguageLevel::Intermediaire => "Intermédiaire",
            LanguageLevel::Avance => "Avancé",
            LanguageLevel::Natif => "Natif",
        }
    }

    pub fn percent(&self) -> u8 {
        match self {
            LanguageLevel::Natif => 100,
            LanguageLevel::Avance => 80,
            LanguageLevel::Intermediaire => 60,
            LanguageLevel::Debutant => 40,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub summary: String,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: Uuid,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<YearMonth>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<YearMonth>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<YearMonth>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<YearMonth>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: LanguageLevel,
}

impl Education {
    pub fn blank() -> Self {
        Education {
            id: Uuid::new_v4(),
            degree: String::new(),
            institution: String::new(),
            location: String::new(),
            start_date: None,
            end_date: None,
            description: String::new(),
        }
    }

    /// Degree and institution are what make an entry worth showing.
    pub fn is_filled(&self) -> bool {
        !self.degree.trim().is_empty() && !self.institution.trim().is_empty()
    }
}

impl Experience {
    pub fn blank() -> Self {
        Experience {
            id: Uuid::new_v4(),
            title: String::new(),
            company: String::new(),
            location: String::new(),
            start_date: None,
            end_date: None,
            current: false,
            description: String::new(),
        }
    }

    pub fn is_filled(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }
}

impl Skill {
    pub fn blank() -> Self {
        Skill {
            id: Uuid::new_v4(),
            name: String::new(),
            level: SkillLevel::Intermediaire,
        }
    }

    pub fn is_filled(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl Language {
    /// New language rows start as native French.
    pub fn blank() -> Self {
        Language {
            id: Uuid::new_v4(),
            name: "Français".to_string(),
            level: LanguageLevel::Natif,
        }
    }

    pub fn is_filled(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

/// The four repeatable entry collections of a CV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvSection {
    Education,
    Experience,
    Skills,
    Languages,
}

impl CvSection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "education" => Some(CvSection::Education),
            "experience" => Some(CvSection::Experience),
            "skills" => Some(CvSection::Skills),
            "languages" => Some(CvSection::Languages),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CvSection::Education => "education",
            CvSection::Experience => "experience",
            CvSection::Skills => "skills",
            CvSection::Languages => "languages",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvRecord {
    pub id: Uuid,
    #[serde(default)]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub selected_template: Option<TemplateId>,
    pub updated_at: DateTime<Utc>,
}

impl CvRecord {
    /// A fresh record as the builder first shows it: no personal info yet and
    /// one blank row in every collection.
    pub fn new_editor() -> Self {
        CvRecord {
            id: Uuid::new_v4(),
            personal_info: None,
            education: vec![Education::blank()],
            experience: vec![Experience::blank()],
            skills: vec![Skill::blank()],
            languages: vec![Language::blank()],
            selected_template: None,
            updated_at: Utc::now(),
        }
    }

    pub fn section_len(&self, section: CvSection) -> usize {
        match section {
            CvSection::Education => self.education.len(),
            CvSection::Experience => self.experience.len(),
            CvSection::Skills => self.skills.len(),
            CvSection::Languages => self.languages.len(),
        }
    }

    /// Re-seeds any collection that ended up empty.
    pub fn ensure_floor(&mut self) {
        if self.education.is_empty() {
            self.education.push(Education::blank());
        }
        if self.experience.is_empty() {
            self.experience.push(Experience::blank());
        }
        if self.skills.is_empty() {
            self.skills.push(Skill::blank());
        }
        if self.languages.is_empty() {
            self.languages.push(Language::blank());
        }
    }

    /// Promotes reviewed extraction output into this record. Collections the
    /// parser found nothing for keep their current rows.
    pub fn apply_extracted(&mut self, data: ExtractedCvData) {
        self.personal_info = Some(data.personal_info);
        if !data.education.is_empty() {
            self.education = data.education;
        }
        if !data.experience.is_empty() {
            self.experience = data.experience;
        }
        if !data.skills.is_empty() {
            self.skills = data.skills;
        }
        if !data.languages.is_empty() {
            self.languages = data.languages;
        }
        self.ensure_floor();
        self.updated_at = Utc::now();
    }

    /// Overlays the parts present in `patch`.
    pub fn apply_patch(&mut self, patch: CvPatch) {
        if let Some(info) = patch.personal_info {
            self.personal_info = Some(info);
        }
        if let Some(education) = patch.education {
            self.education = education;
        }
        if let Some(experience) = patch.experience {
            self.experience = experience;
        }
        if let Some(skills) = patch.skills {
            self.skills = skills;
        }
        if let Some(languages) = patch.languages {
            self.languages = languages;
        }
        if let Some(template) = patch.selected_template {
            self.selected_template = Some(template);
        }
        self.ensure_floor();
        self.updated_at = Utc::now();
    }

    /// `CV_First_Last.pdf`
    pub fn export_file_name(&self) -> String {
        let (first, last) = self
            .personal_info
            .as_ref()
            .map(|p| (p.first_name.as_str(), p.last_name.as_str()))
            .unwrap_or(("", ""));
        format!("CV_{}_{}.pdf", file_token(first), file_token(last))
    }
}

/// Collapses whitespace to `_` and drops characters unsafe in a file name.
pub fn file_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|'))
        .collect()
}

/// A partial update of the CV, as sent by one builder step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvPatch {
    pub personal_info: Option<PersonalInfo>,
    pub education: Option<Vec<Education>>,
    pub experience: Option<Vec<Experience>>,
    pub skills: Option<Vec<Skill>>,
    pub languages: Option<Vec<Language>>,
    pub selected_template: Option<TemplateId>,
}

impl CvPatch {
    /// Later fields win, so a burst of edits collapses into one write.
    pub fn merge(&mut self, later: CvPatch) {
        if later.personal_info.is_some() {
            self.personal_info = later.personal_info;
        }
        if later.education.is_some() {
            self.education = later.education;
        }
        if later.experience.is_some() {
            self.experience = later.experience;
        }
        if later.skills.is_some() {
            self.skills = later.skills;
        }
        if later.languages.is_some() {
            self.languages = later.languages;
        }
        if later.selected_template.is_some() {
            self.selected_template = later.selected_template;
        }
    }
}

/// Parser output, shown to the user for review before it touches the CV.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedCvData {
    pub personal_info: PersonalInfo,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
}
