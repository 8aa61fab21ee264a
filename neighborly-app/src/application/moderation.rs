use crate::domain::{ContentRef, Report, ReportStatus, Role, TrashedItem, User, Viewer};
use crate::infrastructure::DataBackend;
use neighborly_errors::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// Trash, report review and role changes. Everything needs a moderator or
/// admin; role changes need an admin.
pub struct ModerationService {
    backend: Arc<dyn DataBackend>,
}

impl ModerationService {
    pub fn new(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    pub async fn soft_delete(&self, viewer: &Viewer, target: ContentRef) -> Result<(), AppError> {
        require_moderator(viewer)?;
        self.backend.set_deleted(target, Some(chrono::Utc::now())).await?;
        tracing::info!(kind = target.kind(), id = %target.id(), by = ?viewer.user_id(), "moved to trash");
        Ok(())
    }

    pub async fn restore(&self, viewer: &Viewer, target: ContentRef) -> Result<(), AppError> {
        require_moderator(viewer)?;
        self.backend.set_deleted(target, None).await?;
        tracing::info!(kind = target.kind(), id = %target.id(), by = ?viewer.user_id(), "restored from trash");
        Ok(())
    }

    pub async fn list_trash(&self, viewer: &Viewer) -> Result<Vec<TrashedItem>, AppError> {
        require_moderator(viewer)?;
        self.backend.list_trash().await
    }

    /// Permanent removal. Only items already in the trash qualify.
    pub async fn purge(&self, viewer: &Viewer, target: ContentRef) -> Result<(), AppError> {
        require_moderator(viewer)?;

        let deleted = match target {
            ContentRef::Need(id) => self
                .backend
                .find_need(id)
                .await?
                .ok_or_else(|| AppError::not_found("Need"))?
                .is_deleted(),
            ContentRef::Comment(id) => self
                .backend
                .find_comment(id)
                .await?
                .ok_or_else(|| AppError::not_found("Comment"))?
                .is_deleted(),
            ContentRef::User(_) => {
                return Err(AppError::invalid("user accounts cannot be purged"));
            }
        };

        if !deleted {
            return Err(AppError::invalid("only items in the trash can be purged"));
        }

        self.backend.purge(target).await?;
        tracing::warn!(kind = target.kind(), id = %target.id(), by = ?viewer.user_id(), "purged permanently");
        Ok(())
    }

    pub async fn list_reports(
        &self,
        viewer: &Viewer,
        status: Option<ReportStatus>,
    ) -> Result<Vec<Report>, AppError> {
        require_moderator(viewer)?;
        self.backend.list_reports(status).await
    }

    pub async fn resolve_report(
        &self,
        viewer: &Viewer,
        id: Uuid,
        status: ReportStatus,
    ) -> Result<Report, AppError> {
        require_moderator(viewer)?;
        if status == ReportStatus::Pending {
            return Err(AppError::invalid("a report can only be resolved or dismissed"));
        }

        let report = self.backend.set_report_status(id, status).await?;
        tracing::info!(report = %id, status = status.as_str(), by = ?viewer.user_id(), "report reviewed");
        Ok(report)
    }

    pub async fn set_role(&self, viewer: &Viewer, user_id: Uuid, role: Role) -> Result<User, AppError> {
        if !viewer.is_signed_in() {
            return Err(AppError::Unauthorized);
        }
        if !viewer.can_assign_roles() {
            return Err(AppError::Forbidden("only admins can change roles".to_string()));
        }

        let user = self
            .backend
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let previous = user.role;
        let user = self.backend.upsert_user(user.with_role(role)).await?;

        tracing::warn!(
            user = %user_id,
            from = previous.as_str(),
            to = role.as_str(),
            by = ?viewer.user_id(),
            "role changed"
        );
        Ok(user)
    }
}

fn require_moderator(viewer: &Viewer) -> Result<(), AppError> {
    if !viewer.is_signed_in() {
        return Err(AppError::Unauthorized);
    }
    if !viewer.can_moderate() {
        return Err(AppError::Forbidden("moderator role required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{comment, need};
    use crate::domain::{NeedFilter, NewReport, ReportReason};
    use crate::infrastructure::MemoryBackend;

    fn moderator() -> Viewer {
        Viewer::signed_in(User::new("Mod".to_string(), None).with_role(Role::Moderator))
    }

    fn setup() -> (Arc<MemoryBackend>, ModerationService) {
        let backend = Arc::new(MemoryBackend::new());
        (backend.clone(), ModerationService::new(backend))
    }

    #[tokio::test]
    async fn test_members_are_forbidden() {
        let (_, service) = setup();
        let member = Viewer::signed_in(User::new("Member".to_string(), None));

        assert!(matches!(service.list_trash(&member).await, Err(AppError::Forbidden(_))));
        assert_eq!(service.list_trash(&Viewer::anonymous()).await, Err(AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_delete_and_restore_round_trip() {
        let (backend, service) = setup();
        let n = backend.insert_need(need("Pharmacy", 0, 0)).await.unwrap();

        service.soft_delete(&moderator(), ContentRef::Need(n.id)).await.unwrap();
        assert!(backend.list_needs(&NeedFilter::default()).await.unwrap().is_empty());

        let trash = service.list_trash(&moderator()).await.unwrap();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].target, ContentRef::Need(n.id));
        assert_eq!(trash[0].summary, "Pharmacy");

        service.restore(&moderator(), ContentRef::Need(n.id)).await.unwrap();
        assert_eq!(backend.list_needs(&NeedFilter::default()).await.unwrap().len(), 1);
        assert!(service.list_trash(&moderator()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trash_is_most_recent_first() {
        let (backend, service) = setup();
        let n = backend.insert_need(need("Pharmacy", 0, 0)).await.unwrap();
        let c = backend.insert_comment(comment(n.id, None, 0)).await.unwrap();

        let earlier = chrono::Utc::now() - chrono::Duration::hours(1);
        backend.set_deleted(ContentRef::Need(n.id), Some(earlier)).await.unwrap();
        service.soft_delete(&moderator(), ContentRef::Comment(c.id)).await.unwrap();

        let targets: Vec<ContentRef> = service
            .list_trash(&moderator())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.target)
            .collect();
        assert_eq!(targets, vec![ContentRef::Comment(c.id), ContentRef::Need(n.id)]);
    }

    #[tokio::test]
    async fn test_purge_requires_trashed_item() {
        let (backend, service) = setup();
        let n = backend.insert_need(need("Pharmacy", 0, 0)).await.unwrap();

        let live = service.purge(&moderator(), ContentRef::Need(n.id)).await;
        assert!(matches!(live, Err(AppError::InvalidInput(_))));

        service.soft_delete(&moderator(), ContentRef::Need(n.id)).await.unwrap();
        service.purge(&moderator(), ContentRef::Need(n.id)).await.unwrap();
        assert!(backend.find_need(n.id).await.unwrap().is_none());

        let gone = service.purge(&moderator(), ContentRef::Need(n.id)).await;
        assert_eq!(gone, Err(AppError::not_found("Need")));
    }

    #[tokio::test]
    async fn test_resolve_report() {
        let (backend, service) = setup();
        let report = NewReport {
            target: ContentRef::Need(uuid::Uuid::new_v4()),
            reason: ReportReason::SpamOrScam,
            note: None,
        }
        .into_report(None);
        backend.insert_report(report.clone()).await.unwrap();

        let pending = service
            .list_reports(&moderator(), Some(ReportStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);

        assert!(service
            .resolve_report(&moderator(), report.id, ReportStatus::Pending)
            .await
            .is_err());

        let resolved = service
            .resolve_report(&moderator(), report.id, ReportStatus::Dismissed)
            .await
            .unwrap();
        assert_eq!(resolved.status, ReportStatus::Dismissed);
        assert!(service
            .list_reports(&moderator(), Some(ReportStatus::Pending))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_only_admins_change_roles() {
        let (backend, service) = setup();
        let member = backend.upsert_user(User::new("Sari".to_string(), None)).await.unwrap();
        let admin = Viewer::signed_in(User::new("Admin".to_string(), None).with_role(Role::Admin));

        let denied = service.set_role(&moderator(), member.id, Role::Moderator).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
        assert_eq!(
            service.set_role(&Viewer::anonymous(), member.id, Role::Admin).await,
            Err(AppError::Unauthorized)
        );

        let promoted = service.set_role(&admin, member.id, Role::Moderator).await.unwrap();
        assert_eq!(promoted.role, Role::Moderator);
        let stored = backend.find_user(member.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Moderator);
        assert_eq!(stored.created_at, member.created_at);

        let missing = service.set_role(&admin, Uuid::new_v4(), Role::Moderator).await;
        assert_eq!(missing, Err(AppError::not_found("User")));
    }
}
