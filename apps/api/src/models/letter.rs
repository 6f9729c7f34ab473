use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::cv::{file_token, CvRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    /// Reply to a published job offer.
    Offre,
    /// Unsolicited application.
    Spontanee,
    /// Internship request.
    Stage,
}

/// What the user tells us about the position before a letter is composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDescriptor {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub sector: String,
    pub application_type: ApplicationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterRecord {
    pub id: Uuid,
    pub cv_id: Uuid,
    #[serde(flatten)]
    pub descriptor: ApplicationDescriptor,
    pub content: String,
    /// The CV exactly as it was when the letter was generated.
    pub cv_snapshot: CvRecord,
    pub generated_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl LetterRecord {
    pub fn new(cv: &CvRecord, descriptor: ApplicationDescriptor, content: String) -> Self {
        let now = Utc::now();
        LetterRecord {
            id: Uuid::new_v4(),
            cv_id: cv.id,
            descriptor,
            content,
            cv_snapshot: cv.clone(),
            generated_at: now,
            last_modified: now,
        }
    }

    /// `Lettre_Company_Job_Title.pdf`
    pub fn export_file_name(&self) -> String {
        format!(
            "Lettre_{}_{}.pdf",
            file_token(&self.descriptor.company_name),
            file_token(&self.descriptor.job_title)
        )
    }
}
