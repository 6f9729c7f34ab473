//! Debounced CV autosave.
//!
//! Builder steps stage partial updates on every keystroke; a background task
//! coalesces them and writes once the edits have been quiet for the debounce
//! delay. `flush` forces the pending write, e.g. before an export.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::cv::CvPatch;
use crate::storage::Repository;

enum Command {
    Stage(CvPatch),
    Flush(oneshot::Sender<Result<(), AppError>>),
}

#[derive(Clone)]
pub struct Autosave {
    tx: mpsc::UnboundedSender<Command>,
}

impl Autosave {
    /// Spawns the debounce task on the current runtime.
    pub fn spawn(repo: Repository, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(repo, delay, rx));
        Autosave { tx }
    }

    pub fn stage(&self, patch: CvPatch) -> Result<(), AppError> {
        self.tx
            .send(Command::Stage(patch))
            .map_err(|_| AppError::Internal(anyhow::anyhow!("autosave task has stopped")))
    }

    /// Writes whatever is pending and waits for the write to finish.
    pub async fn flush(&self) -> Result<(), AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .map_err(|_| AppError::Internal(anyhow::anyhow!("autosave task has stopped")))?;
        reply_rx
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("autosave task dropped a flush")))?
    }
}

async fn run(repo: Repository, delay: Duration, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut pending: Option<CvPatch> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                cmd = rx.recv() => cmd,
                _ = tokio::time::sleep(delay) => {
                    write_pending(&repo, &mut pending).await;
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Stage(patch)) => match pending.as_mut() {
                Some(current) => current.merge(patch),
                None => pending = Some(patch),
            },
            Some(Command::Flush(reply)) => {
                let result = match pending.take() {
                    Some(patch) => repo.apply_patch(patch).await.map(|_| ()),
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
            None => {
                write_pending(&repo, &mut pending).await;
                debug!("Autosave task stopped");
                break;
            }
        }
    }
}

async fn write_pending(repo: &Repository, pending: &mut Option<CvPatch>) {
    if let Some(patch) = pending.take() {
        match repo.apply_patch(patch).await {
            Ok(cv) => debug!("Autosaved CV {}", cv.id),
            Err(e) => error!("Autosave failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::PersonalInfo;
    use crate::render::TemplateId;

    fn named(first: &str) -> CvPatch {
        CvPatch {
            personal_info: Some(PersonalInfo {
                first_name: first.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_after_quiet_period() {
        let repo = Repository::in_memory();
        let autosave = Autosave::spawn(repo.clone(), Duration::from_millis(1000));

        autosave.stage(named("Ma")).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        autosave.stage(named("Marie")).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        // 1.2s since the first edit, only 0.6s since the last one
        assert!(repo.load_cv().await.unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let cv = repo.load_cv().await.unwrap().unwrap();
        assert_eq!(cv.personal_info.unwrap().first_name, "Marie");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced() {
        let repo = Repository::in_memory();
        let autosave = Autosave::spawn(repo.clone(), Duration::from_millis(1000));

        autosave.stage(named("Marie")).unwrap();
        autosave
            .stage(CvPatch {
                selected_template: Some(TemplateId::Minimaliste),
                ..Default::default()
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let cv = repo.load_cv().await.unwrap().unwrap();
        assert_eq!(cv.personal_info.unwrap().first_name, "Marie");
        assert_eq!(cv.selected_template, Some(TemplateId::Minimaliste));
    }

    #[tokio::test]
    async fn test_flush_writes_immediately() {
        let repo = Repository::in_memory();
        let autosave = Autosave::spawn(repo.clone(), Duration::from_secs(60));
        autosave.stage(named("Aïcha")).unwrap();
        autosave.flush().await.unwrap();
        let cv = repo.load_cv().await.unwrap().unwrap();
        assert_eq!(cv.personal_info.unwrap().first_name, "Aïcha");
    }
}
