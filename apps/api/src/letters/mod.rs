// Cover letters: composition from the stored CV, persistence, the handoff to
// the preview screen, and export.

pub mod composer;
pub mod handlers;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{export_pdf, ExportedPdf, Rasterizer};
use crate::models::letter::{ApplicationDescriptor, LetterRecord};
use crate::render::render_letter;
use crate::storage::Repository;

pub use composer::compose_letter;

/// Composes a letter from the stored CV, saves it and puts its id in the
/// handoff slot for the preview screen. Nothing is written on failure.
pub async fn generate_letter(
    repo: &Repository,
    descriptor: ApplicationDescriptor,
    date: NaiveDate,
) -> Result<LetterRecord, AppError> {
    let cv = repo
        .load_cv()
        .await?
        .ok_or_else(|| AppError::MissingData("Données CV manquantes".to_string()))?;
    let content = compose_letter(&cv, &descriptor, date)?;
    let letter = LetterRecord::new(&cv, descriptor, content);
    repo.save_letter(&letter).await?;
    repo.set_current_letter(letter.id).await?;
    info!(
        "Generated letter {} for {} ({:?})",
        letter.id, letter.descriptor.company_name, letter.descriptor.application_type
    );
    Ok(letter)
}

pub async fn find_letter(repo: &Repository, id: Uuid) -> Result<LetterRecord, AppError> {
    repo.get_letter(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Letter {id} not found")))
}

/// Replaces the body text after the user edited it.
pub async fn edit_letter(
    repo: &Repository,
    id: Uuid,
    content: String,
) -> Result<LetterRecord, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "Le contenu de la lettre ne peut pas être vide".to_string(),
        ));
    }
    repo.update_letter(id, move |letter| letter.content = content)
        .await
}

/// The letter waiting in the handoff slot, if it still exists.
pub async fn take_current_letter(repo: &Repository) -> Result<Option<LetterRecord>, AppError> {
    match repo.take_current_letter().await? {
        Some(id) => repo.get_letter(id).await,
        None => Ok(None),
    }
}

pub async fn export_letter(
    rasterizer: &dyn Rasterizer,
    letter: &LetterRecord,
    limit: usize,
) -> Result<ExportedPdf, AppError> {
    export_pdf(rasterizer, &render_letter(letter), limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::LayoutRasterizer;
    use crate::models::cv::{CvRecord, PersonalInfo};
    use crate::models::letter::ApplicationType;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn descriptor() -> ApplicationDescriptor {
        ApplicationDescriptor {
            job_title: "Comptable".into(),
            company_name: "Sonidep".into(),
            job_description: "Tenue de la comptabilité".into(),
            sector: "Énergie".into(),
            application_type: ApplicationType::Offre,
        }
    }

    async fn repo_with_cv() -> (Repository, CvRecord) {
        let repo = Repository::in_memory();
        let mut cv = CvRecord::new_editor();
        cv.personal_info = Some(PersonalInfo {
            first_name: "Ibrahim".into(),
            last_name: "Moussa".into(),
            ..Default::default()
        });
        repo.save_cv(&cv).await.unwrap();
        (repo, cv)
    }

    #[tokio::test]
    async fn test_generate_saves_snapshot_and_handoff() {
        let (repo, cv) = repo_with_cv().await;
        let letter = generate_letter(&repo, descriptor(), date()).await.unwrap();
        assert_eq!(letter.cv_id, cv.id);
        assert_eq!(letter.cv_snapshot, cv);

        // later CV edits do not reach the snapshot
        repo.update_cv(|cv| {
            cv.personal_info = None;
            Ok(())
        })
        .await
        .unwrap();
        let stored = find_letter(&repo, letter.id).await.unwrap();
        assert!(stored.cv_snapshot.personal_info.is_some());

        let current = take_current_letter(&repo).await.unwrap().unwrap();
        assert_eq!(current.id, letter.id);
        assert!(take_current_letter(&repo).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generate_without_cv_writes_nothing() {
        let repo = Repository::in_memory();
        let err = generate_letter(&repo, descriptor(), date()).await.unwrap_err();
        assert!(matches!(err, AppError::MissingData(_)));
        assert!(repo.list_letters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_descriptor_writes_nothing() {
        let (repo, _) = repo_with_cv().await;
        let mut desc = descriptor();
        desc.job_description.clear();
        assert!(generate_letter(&repo, desc, date()).await.is_err());
        assert!(repo.list_letters().await.unwrap().is_empty());
        assert!(repo.take_current_letter().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edit_and_export() {
        let (repo, _) = repo_with_cv().await;
        let letter = generate_letter(&repo, descriptor(), date()).await.unwrap();

        assert!(matches!(
            edit_letter(&repo, letter.id, "   ".into()).await,
            Err(AppError::Validation(_))
        ));
        let edited = edit_letter(&repo, letter.id, "Bonjour,\n\nMerci.".into())
            .await
            .unwrap();
        assert_eq!(edited.content, "Bonjour,\n\nMerci.");
        assert!(edited.last_modified >= letter.last_modified);

        let pdf = export_letter(&LayoutRasterizer, &edited, 5 * 1024 * 1024)
            .await
            .unwrap();
        assert_eq!(pdf.page_count, 1);
        assert!(pdf.within_limit);
    }
}
