use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::{CvPatch, CvRecord};
use crate::models::letter::LetterRecord;
use crate::models::user::{AppPreferences, AuthState, StoredUser};
use crate::storage::{KvStore, MemoryStore, StorageKeys};

/// Typed access to the persisted documents.
///
/// Mutations go through `write_lock` so that two requests touching the same
/// document cannot interleave their load and save.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn KvStore>,
    keys: StorageKeys,
    write_lock: Arc<Mutex<()>>,
}

impl Repository {
    pub fn new(store: Arc<dyn KvStore>, keys: StorageKeys) -> Self {
        Repository {
            store,
            keys,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), StorageKeys::new("cvstudio"))
    }

    /// Unreadable documents are treated as absent.
    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable document under '{key}': {e}");
                Ok(None)
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw).await
    }

    // ── CV ──────────────────────────────────────────────────────────────────

    pub async fn load_cv(&self) -> Result<Option<CvRecord>, AppError> {
        self.read(&self.keys.cv()).await
    }

    pub async fn save_cv(&self, cv: &CvRecord) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write(&self.keys.cv(), cv).await
    }

    /// Returns the stored CV, creating the blank editor record on first use.
    pub async fn load_or_create_cv(&self) -> Result<CvRecord, AppError> {
        let _guard = self.write_lock.lock().await;
        if let Some(cv) = self.load_cv().await? {
            return Ok(cv);
        }
        let cv = CvRecord::new_editor();
        self.write(&self.keys.cv(), &cv).await?;
        debug!("Created CV record {}", cv.id);
        Ok(cv)
    }

    /// Applies `f` to a copy of the CV and stores the result. If `f` fails the
    /// stored record is left as it was.
    pub async fn update_cv<F>(&self, f: F) -> Result<CvRecord, AppError>
    where
        F: FnOnce(&mut CvRecord) -> Result<(), AppError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut cv = self
            .load_cv()
            .await?
            .unwrap_or_else(CvRecord::new_editor);
        f(&mut cv)?;
        cv.updated_at = Utc::now();
        self.write(&self.keys.cv(), &cv).await?;
        Ok(cv)
    }

    pub async fn apply_patch(&self, patch: CvPatch) -> Result<CvRecord, AppError> {
        self.update_cv(|cv| {
            cv.apply_patch(patch);
            Ok(())
        })
        .await
    }

    // ── Letters ─────────────────────────────────────────────────────────────

    pub async fn list_letters(&self) -> Result<Vec<LetterRecord>, AppError> {
        Ok(self.read(&self.keys.letters()).await?.unwrap_or_default())
    }

    pub async fn get_letter(&self, id: Uuid) -> Result<Option<LetterRecord>, AppError> {
        Ok(self.list_letters().await?.into_iter().find(|l| l.id == id))
    }

    /// Inserts the letter or replaces the one with the same id.
    pub async fn save_letter(&self, letter: &LetterRecord) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut letters = self.list_letters().await?;
        letters.retain(|l| l.id != letter.id);
        letters.push(letter.clone());
        self.write(&self.keys.letters(), &letters).await
    }

    pub async fn update_letter<F>(&self, id: Uuid, f: F) -> Result<LetterRecord, AppError>
    where
        F: FnOnce(&mut LetterRecord) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut letters = self.list_letters().await?;
        let letter = letters
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Letter {id} not found")))?;
        f(letter);
        letter.last_modified = Utc::now();
        let updated = letter.clone();
        self.write(&self.keys.letters(), &letters).await?;
        Ok(updated)
    }

    /// Returns whether a letter was removed.
    pub async fn delete_letter(&self, id: Uuid) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut letters = self.list_letters().await?;
        let before = letters.len();
        letters.retain(|l| l.id != id);
        if letters.len() == before {
            return Ok(false);
        }
        self.write(&self.keys.letters(), &letters).await?;
        Ok(true)
    }

    pub async fn set_current_letter(&self, id: Uuid) -> Result<(), AppError> {
        self.write(&self.keys.current_letter(), &id).await
    }

    /// Reads and clears the handoff slot.
    pub async fn take_current_letter(&self) -> Result<Option<Uuid>, AppError> {
        let _guard = self.write_lock.lock().await;
        let key = self.keys.current_letter();
        let id = self.read(&key).await?;
        if id.is_some() {
            self.store.delete(&key).await?;
        }
        Ok(id)
    }

    // ── Session and users ───────────────────────────────────────────────────

    pub async fn load_session(&self) -> Result<AuthState, AppError> {
        Ok(self.read(&self.keys.session()).await?.unwrap_or_default())
    }

    pub async fn save_session(&self, state: &AuthState) -> Result<(), AppError> {
        self.write(&self.keys.session(), state).await
    }

    pub async fn clear_session(&self) -> Result<(), AppError> {
        self.store.delete(&self.keys.session()).await
    }

    pub async fn load_users(&self) -> Result<Vec<StoredUser>, AppError> {
        Ok(self.read(&self.keys.users()).await?.unwrap_or_default())
    }

    /// Runs `f` against the user catalog and persists it when `f` succeeds.
    pub async fn update_users<F, R>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Vec<StoredUser>) -> Result<R, AppError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut users = self.load_users().await?;
        let out = f(&mut users)?;
        self.write(&self.keys.users(), &users).await?;
        Ok(out)
    }

    // ── Preferences ─────────────────────────────────────────────────────────

    pub async fn load_preferences(&self) -> Result<AppPreferences, AppError> {
        Ok(self.read(&self.keys.preferences()).await?.unwrap_or_default())
    }

    pub async fn save_preferences(&self, prefs: &AppPreferences) -> Result<(), AppError> {
        self.write(&self.keys.preferences(), prefs).await
    }

    /// Drops everything tied to the signed-in user: CV, letters, session and
    /// the handoff slot. Device preferences survive.
    pub async fn purge_user_data(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        for key in [
            self.keys.cv(),
            self.keys.letters(),
            self.keys.session(),
            self.keys.current_letter(),
        ] {
            self.store.delete(&key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{Experience, PersonalInfo, Skill, SkillLevel, YearMonth};
    use crate::models::letter::{ApplicationDescriptor, ApplicationType};
    use crate::render::TemplateId;
    use pretty_assertions::assert_eq;

    fn sample_cv() -> CvRecord {
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
        cv.experience = vec![Experience {
            title: "Marketing Manager".into(),
            company: "StartupNiger".into(),
            start_date: YearMonth::new(2021, Some(6)),
            current: true,
            ..Experience::blank()
        }];
        cv.skills.push(Skill {
            name: "Google Ads".into(),
            level: SkillLevel::Expert,
            ..Skill::blank()
        });
        cv.selected_template = Some(TemplateId::Creatif);
        cv
    }

    fn sample_letter(cv: &CvRecord) -> LetterRecord {
        LetterRecord::new(
            cv,
            ApplicationDescriptor {
                job_title: "Responsable marketing".into(),
                company_name: "Sahel Media".into(),
                job_description: "Google Ads et analytics".into(),
                sector: "Médias".into(),
                application_type: ApplicationType::Offre,
            },
            "Madame, Monsieur,".into(),
        )
    }

    #[tokio::test]
    async fn test_cv_round_trip() {
        let repo = Repository::in_memory();
        let cv = sample_cv();
        repo.save_cv(&cv).await.unwrap();
        let loaded = repo.load_cv().await.unwrap().unwrap();
        assert_eq!(loaded, cv);
    }

    #[tokio::test]
    async fn test_load_or_create_is_stable() {
        let repo = Repository::in_memory();
        let first = repo.load_or_create_cv().await.unwrap();
        let second = repo.load_or_create_cv().await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_untouched() {
        let repo = Repository::in_memory();
        let cv = sample_cv();
        repo.save_cv(&cv).await.unwrap();
        let result = repo
            .update_cv(|cv| {
                cv.skills.clear();
                Err(AppError::Validation("nope".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(repo.load_cv().await.unwrap().unwrap(), cv);
    }

    #[tokio::test]
    async fn test_corrupt_document_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        let keys = StorageKeys::new("t");
        store.set(&keys.letters(), "{not json".into()).await.unwrap();
        let repo = Repository::new(store, keys);
        assert!(repo.list_letters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_letters_replace_by_id() {
        let repo = Repository::in_memory();
        let cv = sample_cv();
        let mut letter = sample_letter(&cv);
        repo.save_letter(&letter).await.unwrap();
        letter.content = "Nouveau contenu".into();
        repo.save_letter(&letter).await.unwrap();

        let letters = repo.list_letters().await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].content, "Nouveau contenu");

        assert!(repo.delete_letter(letter.id).await.unwrap());
        assert!(!repo.delete_letter(letter.id).await.unwrap());
        assert!(repo.get_letter(letter.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_letter_bumps_last_modified() {
        let repo = Repository::in_memory();
        let letter = sample_letter(&sample_cv());
        repo.save_letter(&letter).await.unwrap();
        let updated = repo
            .update_letter(letter.id, |l| l.content = "Edité".into())
            .await
            .unwrap();
        assert_eq!(updated.content, "Edité");
        assert!(updated.last_modified >= letter.last_modified);

        let missing = repo.update_letter(Uuid::new_v4(), |_| {}).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_handoff_slot_is_read_once() {
        let repo = Repository::in_memory();
        let id = Uuid::new_v4();
        repo.set_current_letter(id).await.unwrap();
        assert_eq!(repo.take_current_letter().await.unwrap(), Some(id));
        assert_eq!(repo.take_current_letter().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_keeps_preferences() {
        let repo = Repository::in_memory();
        let cv = sample_cv();
        repo.save_cv(&cv).await.unwrap();
        repo.save_letter(&sample_letter(&cv)).await.unwrap();
        let prefs = AppPreferences {
            last_visit: Some(Utc::now()),
            ..Default::default()
        };
        repo.save_preferences(&prefs).await.unwrap();

        repo.purge_user_data().await.unwrap();

        assert!(repo.load_cv().await.unwrap().is_none());
        assert!(repo.list_letters().await.unwrap().is_empty());
        assert_eq!(repo.load_preferences().await.unwrap(), prefs);
    }
}
