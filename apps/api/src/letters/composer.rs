//! Cover letter composition from a CV and an application descriptor.
//!
//! Pure and deterministic: the date is passed in, nothing is looked up.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::cv::{CvRecord, Education, Experience, PersonalInfo, Skill};
use crate::models::letter::{ApplicationDescriptor, ApplicationType};

const EXPERIENCE_EXCERPT_CHARS: usize = 200;
const EDUCATION_EXCERPT_CHARS: usize = 150;

/// Skills with at least one name token present in the job description.
pub fn relevant_skills<'a>(skills: &'a [Skill], job_description: &str) -> Vec<&'a Skill> {
    let description = job_description.to_lowercase();
    let keywords: HashSet<&str> = description.split_whitespace().collect();
    skills
        .iter()
        .filter(|skill| {
            skill
                .name
                .to_lowercase()
                .split_whitespace()
                .any(|word| keywords.contains(word))
        })
        .collect()
}

/// Cuts to `max` characters and marks the cut with `...`.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

fn skill_names(skills: &[&Skill]) -> String {
    skills
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn subject(kind: ApplicationType, job_title: &str) -> String {
    match kind {
        ApplicationType::Offre => format!("Candidature pour le poste de {job_title}"),
        ApplicationType::Spontanee => format!("Candidature spontanée - {job_title}"),
        ApplicationType::Stage => format!("Demande de stage - {job_title}"),
    }
}

fn opening(kind: ApplicationType, job_title: &str, company: &str) -> String {
    match kind {
        ApplicationType::Offre => format!(
            "J'ai l'honneur de vous adresser ma candidature pour le poste de {job_title} au sein de {company}. \
             Votre annonce a particulièrement retenu mon attention car elle correspond parfaitement à mon profil \
             professionnel et à mes aspirations de carrière."
        ),
        ApplicationType::Spontanee => format!(
            "Passionné(e) par le secteur d'activité de {company}, je me permets de vous adresser ma candidature \
             spontanée pour un poste de {job_title}. Votre entreprise jouit d'une excellente réputation et \
             j'aimerais contribuer à son développement."
        ),
        ApplicationType::Stage => format!(
            "Actuellement en formation, je sollicite un stage de {job_title} au sein de {company}. Cette \
             opportunité représenterait pour moi l'occasion idéale d'appliquer mes connaissances théoriques \
             dans un contexte professionnel stimulant."
        ),
    }
}

fn experience_paragraph(head: Option<&Experience>, skills: &[&Skill], job_title: &str) -> String {
    let Some(exp) = head.filter(|e| !e.title.trim().is_empty()) else {
        return format!(
            "Bien que débutant(e) dans ce domaine, je possède une forte motivation et une capacité \
             d'apprentissage rapide qui me permettront de m'adapter efficacement aux exigences du poste \
             de {job_title}."
        );
    };
    let company = if exp.company.trim().is_empty() {
        "une entreprise du secteur"
    } else {
        exp.company.as_str()
    };
    let mut paragraph = format!(
        "Fort(e) de mon expérience en tant que {} chez {company}, j'ai acquis une solide expertise qui me \
         permettra de réussir dans le poste de {job_title}.",
        exp.title
    );
    if !skills.is_empty() {
        paragraph.push_str(&format!(
            " J'ai notamment développé des compétences en {}.",
            skill_names(skills)
        ));
    }
    let description = excerpt(exp.description.trim(), EXPERIENCE_EXCERPT_CHARS);
    if !description.is_empty() {
        paragraph.push(' ');
        paragraph.push_str(&description);
    }
    paragraph
}

fn education_paragraph(head: Option<&Education>, sector: &str) -> String {
    let Some(edu) = head.filter(|e| !e.degree.trim().is_empty()) else {
        return format!(
            "Ma formation autodidacte et mon expérience pratique m'ont permis d'acquérir les compétences \
             nécessaires pour évoluer dans le secteur {sector}."
        );
    };
    let institution = if edu.institution.trim().is_empty() {
        "un établissement reconnu"
    } else {
        edu.institution.as_str()
    };
    let mut paragraph = format!(
        "Ma formation en {} obtenue à {institution} m'a donné les bases théoriques solides nécessaires pour \
         exceller dans ce domaine.",
        edu.degree
    );
    let description = excerpt(edu.description.trim(), EDUCATION_EXCERPT_CHARS);
    if !description.is_empty() {
        paragraph.push(' ');
        paragraph.push_str(&description);
    }
    paragraph
}

fn skills_paragraph(skills: &[&Skill]) -> String {
    if skills.is_empty() {
        return "Je suis convaincu(e) que ma polyvalence, ma capacité d'adaptation et mon enthousiasme seront \
                des atouts précieux pour votre équipe."
            .to_string();
    }
    format!(
        "Mes compétences en {} correspondent parfaitement aux exigences mentionnées dans votre offre. Je suis \
         confiant(e) de pouvoir apporter une valeur ajoutée significative à votre équipe.",
        skill_names(skills)
    )
}

fn closing(kind: ApplicationType) -> String {
    let first = match kind {
        ApplicationType::Stage => {
            "Je serais ravi(e) de discuter de cette opportunité de stage lors d'un entretien."
        }
        ApplicationType::Offre | ApplicationType::Spontanee => {
            "Je serais honoré(e) de contribuer au succès de votre entreprise et de développer ma carrière au \
             sein de votre équipe."
        }
    };
    format!(
        "{first} Je reste à votre disposition pour tout complément d'information et espère avoir l'opportunité \
         de vous rencontrer prochainement.\n\n\
         Je vous prie d'agréer, Madame, Monsieur, l'expression de mes salutations distinguées."
    )
}

fn sender_block(info: &PersonalInfo) -> String {
    let locality = [info.city.trim(), info.country.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    [
        info.full_name(),
        info.address.trim().to_string(),
        locality,
        info.email.trim().to_string(),
        info.phone.trim().to_string(),
    ]
    .into_iter()
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::MissingData(format!(
            "Données de génération incomplètes: {field}"
        )));
    }
    Ok(())
}

/// Composes the full letter text. Paragraphs are separated by blank lines.
pub fn compose_letter(
    cv: &CvRecord,
    descriptor: &ApplicationDescriptor,
    date: NaiveDate,
) -> Result<String, AppError> {
    let info = cv.personal_info.as_ref().ok_or_else(|| {
        AppError::MissingData("Données CV manquantes: informations personnelles".to_string())
    })?;
    require(&descriptor.job_title, "intitulé du poste")?;
    require(&descriptor.company_name, "entreprise")?;
    require(&descriptor.job_description, "description du poste")?;
    require(&descriptor.sector, "secteur")?;

    let job_title = descriptor.job_title.trim();
    let company = descriptor.company_name.trim();
    let skills = relevant_skills(&cv.skills, &descriptor.job_description);

    let parts = [
        sender_block(info),
        format!("{company}\n{}", date.format("%d/%m/%Y")),
        format!("Objet : {}", subject(descriptor.application_type, job_title)),
        "Madame, Monsieur,".to_string(),
        opening(descriptor.application_type, job_title, company),
        experience_paragraph(cv.experience.first(), &skills, job_title),
        education_paragraph(cv.education.first(), descriptor.sector.trim()),
        skills_paragraph(&skills),
        closing(descriptor.application_type),
        info.full_name(),
    ];
    Ok(parts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::SkillLevel;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    fn cv() -> CvRecord {
        let mut cv = CvRecord::new_editor();
        cv.personal_info = Some(PersonalInfo {
            first_name: "Marie".into(),
            last_name: "Abdou".into(),
            email: "marie.abdou@email.com".into(),
            phone: "+227 20 98 76 54".into(),
            city: "Niamey".into(),
            country: "Niger".into(),
            ..Default::default()
        });
        cv.experience[0] = Experience {
            title: "Marketing Manager".into(),
            company: "StartupNiger".into(),
            description: "x".repeat(250),
            ..Experience::blank()
        };
        cv.education[0] = Education {
            degree: "Master en Marketing".into(),
            institution: "Institut Supérieur de Commerce".into(),
            description: "Mention Bien".into(),
            ..Education::blank()
        };
        cv.skills = vec![
            Skill {
                name: "Google Ads".into(),
                level: SkillLevel::Expert,
                ..Skill::blank()
            },
            Skill {
                name: "Photoshop".into(),
                ..Skill::blank()
            },
        ];
        cv
    }

    fn descriptor(kind: ApplicationType, description: &str) -> ApplicationDescriptor {
        ApplicationDescriptor {
            job_title: "Chef de projet digital".into(),
            company_name: "Orange Niger".into(),
            job_description: description.into(),
            sector: "Télécommunications".into(),
            application_type: kind,
        }
    }

    #[test]
    fn test_openings_differ_by_application_type() {
        let cv = cv();
        let letters: Vec<String> = [
            ApplicationType::Offre,
            ApplicationType::Spontanee,
            ApplicationType::Stage,
        ]
        .into_iter()
        .map(|kind| compose_letter(&cv, &descriptor(kind, "campagnes ads"), date()).unwrap())
        .collect();

        assert!(letters[0].contains("Objet : Candidature pour le poste de Chef de projet digital"));
        assert!(letters[1].contains("Objet : Candidature spontanée - Chef de projet digital"));
        assert!(letters[2].contains("Objet : Demande de stage - Chef de projet digital"));
        assert!(letters[0].contains("J'ai l'honneur de vous adresser"));
        assert!(letters[1].contains("Passionné(e) par le secteur d'activité de Orange Niger"));
        assert!(letters[2].contains("Actuellement en formation"));
        assert_ne!(letters[0], letters[1]);
        assert_ne!(letters[1], letters[2]);
    }

    #[test]
    fn test_layout_and_truncation() {
        let letter =
            compose_letter(&cv(), &descriptor(ApplicationType::Offre, "Google Ads"), date()).unwrap();
        let paragraphs: Vec<&str> = letter.split("\n\n").collect();
        assert_eq!(
            paragraphs[0],
            "Marie Abdou\nNiamey, Niger\nmarie.abdou@email.com\n+227 20 98 76 54"
        );
        assert_eq!(paragraphs[1], "Orange Niger\n07/03/2024");
        assert_eq!(paragraphs[3], "Madame, Monsieur,");
        assert_eq!(*paragraphs.last().unwrap(), "Marie Abdou");

        let experience = paragraphs[5];
        assert!(experience.contains("J'ai notamment développé des compétences en Google Ads."));
        assert!(experience.ends_with(&format!("{}...", "x".repeat(200))));
        assert!(paragraphs[6].ends_with("exceller dans ce domaine. Mention Bien"));
    }

    #[test]
    fn test_internship_without_matching_skills() {
        let mut cv = cv();
        cv.experience = vec![Experience::blank()];
        let letter = compose_letter(
            &cv,
            &descriptor(ApplicationType::Stage, "Rédaction de rapports"),
            date(),
        )
        .unwrap();
        assert!(letter.contains("Bien que débutant(e) dans ce domaine"));
        assert!(letter.contains("ma polyvalence, ma capacité d'adaptation et mon enthousiasme"));
        assert!(letter.contains("opportunité de stage lors d'un entretien"));
        assert!(!letter.contains("Mes compétences en"));
    }

    #[test]
    fn test_missing_personal_info_or_descriptor_field() {
        let mut no_info = cv();
        no_info.personal_info = None;
        let desc = descriptor(ApplicationType::Offre, "ads");
        assert!(matches!(
            compose_letter(&no_info, &desc, date()),
            Err(AppError::MissingData(_))
        ));

        let mut blank_sector = desc.clone();
        blank_sector.sector = "  ".into();
        assert!(matches!(
            compose_letter(&cv(), &blank_sector, date()),
            Err(AppError::MissingData(_))
        ));
    }

    #[test]
    fn test_relevant_skills_match_on_any_token() {
        let cv = cv();
        let found = relevant_skills(&cv.skills, "Maîtrise de google et des réseaux");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Google Ads");
        assert!(relevant_skills(&cv.skills, "").is_empty());
    }

    #[test]
    fn test_excerpt_counts_characters() {
        assert_eq!(excerpt("éééé", 3), "ééé...");
        assert_eq!(excerpt("court", 10), "court");
    }
}
