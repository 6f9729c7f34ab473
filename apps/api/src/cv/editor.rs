//! Builder rules: adding and removing entries, and per-step validation.

use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::{
    CvRecord, CvSection, Education, Experience, Language, LanguageLevel, Skill,
};

pub const TOTAL_STEPS: u8 = 4;

/// Appends a blank entry and returns its id.
pub fn add_entry(cv: &mut CvRecord, section: CvSection) -> Uuid {
    match section {
        CvSection::Education => {
            let entry = Education::blank();
            let id = entry.id;
            cv.education.push(entry);
            id
        }
        CvSection::Experience => {
            let entry = Experience::blank();
            let id = entry.id;
            cv.experience.push(entry);
            id
        }
        CvSection::Skills => {
            let entry = Skill::blank();
            let id = entry.id;
            cv.skills.push(entry);
            id
        }
        CvSection::Languages => {
            let id = Uuid::new_v4();
            cv.languages.push(Language {
                id,
                name: String::new(),
                level: LanguageLevel::Intermediaire,
            });
            id
        }
    }
}

fn position_of<T>(entries: &[T], id: Uuid, entry_id: impl Fn(&T) -> Uuid) -> Option<usize> {
    entries.iter().position(|e| entry_id(e) == id)
}

/// Removes an entry. The last remaining entry of a section cannot go.
pub fn remove_entry(cv: &mut CvRecord, section: CvSection, id: Uuid) -> Result<(), AppError> {
    let pos = match section {
        CvSection::Education => position_of(&cv.education, id, |e| e.id),
        CvSection::Experience => position_of(&cv.experience, id, |e| e.id),
        CvSection::Skills => position_of(&cv.skills, id, |e| e.id),
        CvSection::Languages => position_of(&cv.languages, id, |e| e.id),
    }
    .ok_or_else(|| AppError::NotFound(format!("No {} entry {id}", section.as_str())))?;

    if cv.section_len(section) <= 1 {
        return Err(AppError::Validation(
            "Au moins une entrée est requise dans chaque section".to_string(),
        ));
    }
    match section {
        CvSection::Education => {
            cv.education.remove(pos);
        }
        CvSection::Experience => {
            cv.experience.remove(pos);
        }
        CvSection::Skills => {
            cv.skills.remove(pos);
        }
        CvSection::Languages => {
            cv.languages.remove(pos);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: u8,
    pub valid: bool,
    /// Fields or sections still needed before the user may continue.
    pub missing: Vec<&'static str>,
    pub is_last: bool,
}

/// Checks whether `step` (1-based) may be left.
///
/// 1: first name, last name, email, phone and city.
/// 2: one education entry with degree and institution.
/// 3: one experience entry with title and company.
/// 4: one named skill and one named language.
pub fn validate_step(cv: &CvRecord, step: u8) -> Result<StepReport, AppError> {
    let mut missing = Vec::new();
    match step {
        1 => {
            let info = cv.personal_info.clone().unwrap_or_default();
            let required = [
                ("firstName", &info.first_name),
                ("lastName", &info.last_name),
                ("email", &info.email),
                ("phone", &info.phone),
                ("city", &info.city),
            ];
            for (name, value) in required {
                if value.trim().is_empty() {
                    missing.push(name);
                }
            }
        }
        2 => {
            if !cv.education.iter().any(Education::is_filled) {
                missing.push("education");
            }
        }
        3 => {
            if !cv.experience.iter().any(Experience::is_filled) {
                missing.push("experience");
            }
        }
        4 => {
            if !cv.skills.iter().any(Skill::is_filled) {
                missing.push("skills");
            }
            if !cv.languages.iter().any(Language::is_filled) {
                missing.push("languages");
            }
        }
        other => {
            return Err(AppError::Validation(format!(
                "Step {other} does not exist (1 to {TOTAL_STEPS})"
            )))
        }
    }
    Ok(StepReport {
        step,
        valid: missing.is_empty(),
        missing,
        is_last: step == TOTAL_STEPS,
    })
}
