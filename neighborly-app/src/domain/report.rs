use serde::{Deserialize, Serialize};

/// Reference to a piece of user content, for reports and moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ContentRef {
    Need(uuid::Uuid),
    Comment(uuid::Uuid),
    User(uuid::Uuid),
}

impl ContentRef {
    pub fn id(&self) -> uuid::Uuid {
        match self {
            Self::Need(id) | Self::Comment(id) | Self::User(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Need(_) => "need",
            Self::Comment(_) => "comment",
            Self::User(_) => "user",
        }
    }

    pub fn from_parts(kind: &str, id: uuid::Uuid) -> Option<Self> {
        match kind {
            "need" => Some(Self::Need(id)),
            "comment" => Some(Self::Comment(id)),
            "user" => Some(Self::User(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportReason {
    InappropriateContent,
    SpamOrScam,
    Harassment,
    MisleadingInformation,
    Other,
}

impl ReportReason {
    pub const ALL: [ReportReason; 5] = [
        Self::InappropriateContent,
        Self::SpamOrScam,
        Self::Harassment,
        Self::MisleadingInformation,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::InappropriateContent => "Inappropriate Content",
            Self::SpamOrScam => "Spam or Scam",
            Self::Harassment => "Harassment",
            Self::MisleadingInformation => "Misleading Information",
            Self::Other => "Other",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "resolved" => Some(Self::Resolved),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: uuid::Uuid,
    pub reporter_id: Option<uuid::Uuid>,
    pub target: ContentRef,
    pub reason: ReportReason,
    pub note: Option<String>,
    pub status: ReportStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub target: ContentRef,
    pub reason: ReportReason,
    pub note: Option<String>,
}

impl NewReport {
    pub fn into_report(self, reporter_id: Option<uuid::Uuid>) -> Report {
        Report {
            id: uuid::Uuid::new_v4(),
            reporter_id,
            target: self.target,
            reason: self.reason,
            note: self.note,
            status: ReportStatus::Pending,
            created_at: chrono::Utc::now(),
        }
    }
}

/// A soft-deleted item as listed in the moderation trash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashedItem {
    pub target: ContentRef,
    pub summary: String,
    pub deleted_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_ref_from_parts() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(ContentRef::from_parts("comment", id), Some(ContentRef::Comment(id)));
        assert_eq!(ContentRef::from_parts("need", id).map(|r| r.kind()), Some("need"));
        assert_eq!(ContentRef::from_parts("post", id), None);
    }

    #[test]
    fn test_reason_labels_parse_back() {
        for reason in ReportReason::ALL {
            assert_eq!(ReportReason::parse(reason.label()), Some(reason));
        }
        assert_eq!(ReportReason::parse("Rude"), None);
    }
}
