use crate::domain::{ContentRef, NewReport, Report, Viewer};
use crate::infrastructure::security::{InputSanitizer, MAX_REPORT_NOTE_CHARS};
use crate::infrastructure::DataBackend;
use neighborly_errors::AppError;
use std::sync::Arc;

const DUPLICATE_WINDOW_HOURS: i64 = 48;

pub struct ReportService {
    backend: Arc<dyn DataBackend>,
}

impl ReportService {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    /// Files a pending report against live content or an existing user.
    /// Signed-in reporters cannot report themselves or the same target twice
    /// within 48 hours.
    pub async fn file(&self, viewer: &Viewer, input: NewReport) -> Result<Report, AppError> {
        let note = InputSanitizer::optional_text("Note", input.note.as_deref(), MAX_REPORT_NOTE_CHARS)?;
        let reporter_id = viewer.user_id();

        if let Some(reporter_id) = reporter_id {
            if input.target == ContentRef::User(reporter_id) {
                return Err(AppError::invalid("You cannot report yourself"));
            }

            let since = chrono::Utc::now() - chrono::Duration::hours(DUPLICATE_WINDOW_HOURS);
            if self
                .backend
                .find_recent_report(reporter_id, input.target, since)
                .await?
                .is_some()
            {
                return Err(AppError::DuplicateReport(format!(
                    "this {} was already reported in the last {DUPLICATE_WINDOW_HOURS} hours",
                    input.target.kind()
                )));
            }
        }

        self.require_target(input.target).await?;

        let report = self
            .backend
            .insert_report(NewReport { note, ..input }.into_report(reporter_id))
            .await?;
        tracing::info!(
            report = %report.id,
            kind = report.target.kind(),
            target_id = %report.target.id(),
            reason = report.reason.label(),
            "report filed"
        );
        Ok(report)
    }

    async fn require_target(&self, target: ContentRef) -> Result<(), AppError> {
        let found = match target {
            ContentRef::Need(id) => self.backend.find_need(id).await?.is_some_and(|n| !n.is_deleted()),
            ContentRef::Comment(id) => self.backend.find_comment(id).await?.is_some_and(|c| !c.is_deleted()),
            ContentRef::User(id) => self.backend.find_user(id).await?.is_some(),
        };
        if found {
            Ok(())
        } else {
            Err(AppError::not_found(match target {
                ContentRef::Need(_) => "Need",
                ContentRef::Comment(_) => "Comment",
                ContentRef::User(_) => "User",
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{comment, need};
    use crate::domain::{ReportReason, ReportStatus, User};
    use crate::infrastructure::MemoryBackend;
    use uuid::Uuid;

    async fn setup() -> (Arc<MemoryBackend>, ReportService, ContentRef) {
        let backend = Arc::new(MemoryBackend::new());
        let n = backend.insert_need(need("Pharmacy", 0, 0)).await.unwrap();
        (backend.clone(), ReportService::new(backend), ContentRef::Need(n.id))
    }

    fn report(target: ContentRef, note: Option<&str>) -> NewReport {
        NewReport {
            target,
            reason: ReportReason::Harassment,
            note: note.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_file_report_is_pending() {
        let backend = Arc::new(MemoryBackend::new());
        let service = ReportService::new(backend.clone());
        let viewer = Viewer::signed_in(User::new("Hana".to_string(), None));
        let c = backend.insert_comment(comment(Uuid::new_v4(), None, 0)).await.unwrap();
        let target = ContentRef::Comment(c.id);

        let filed = service.file(&viewer, report(target, Some(" rude "))).await.unwrap();
        assert_eq!(filed.status, ReportStatus::Pending);
        assert_eq!(filed.note.as_deref(), Some("rude"));
        assert_eq!(filed.reporter_id, viewer.user_id());
    }

    #[tokio::test]
    async fn test_cannot_report_self() {
        let service = ReportService::new(Arc::new(MemoryBackend::new()));
        let user = User::new("Hana".to_string(), None);
        let target = ContentRef::User(user.id);

        let result = service.file(&Viewer::signed_in(user), report(target, None)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_duplicate_within_window_is_rejected() {
        let (_, service, target) = setup().await;
        let viewer = Viewer::signed_in(User::new("Hana".to_string(), None));

        service.file(&viewer, report(target, None)).await.unwrap();
        let again = service.file(&viewer, report(target, None)).await;
        assert!(matches!(again, Err(AppError::DuplicateReport(_))));

        // Someone else may still report it.
        let other = Viewer::signed_in(User::new("Yusuf".to_string(), None));
        assert!(service.file(&other, report(target, None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_old_report_does_not_block() {
        let (backend, service, target) = setup().await;
        let viewer = Viewer::signed_in(User::new("Hana".to_string(), None));

        let mut old = report(target, None).into_report(viewer.user_id());
        old.created_at = chrono::Utc::now() - chrono::Duration::hours(49);
        backend.insert_report(old).await.unwrap();

        assert!(service.file(&viewer, report(target, None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_long_note_is_rejected() {
        let (_, service, target) = setup().await;
        let note = "x".repeat(MAX_REPORT_NOTE_CHARS + 1);
        let result = service.file(&Viewer::anonymous(), report(target, Some(&note))).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_or_trashed_target_is_not_found() {
        let (backend, service, target) = setup().await;
        let viewer = Viewer::signed_in(User::new("Hana".to_string(), None));

        let missing = service.file(&viewer, report(ContentRef::Need(Uuid::new_v4()), None)).await;
        assert_eq!(missing, Err(AppError::not_found("Need")));
        let nobody = service.file(&viewer, report(ContentRef::User(Uuid::new_v4()), None)).await;
        assert_eq!(nobody, Err(AppError::not_found("User")));

        backend.set_deleted(target, Some(chrono::Utc::now())).await.unwrap();
        let trashed = service.file(&viewer, report(target, None)).await;
        assert_eq!(trashed, Err(AppError::not_found("Need")));
        assert!(backend.list_reports(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_users_can_be_reported() {
        let backend = Arc::new(MemoryBackend::new());
        let service = ReportService::new(backend.clone());
        let spammer = backend.upsert_user(User::new("Spam".to_string(), None)).await.unwrap();
        let viewer = Viewer::signed_in(User::new("Hana".to_string(), None));

        assert!(service.file(&viewer, report(ContentRef::User(spammer.id), None)).await.is_ok());
    }
}
