use super::vote::VoteCounts;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: uuid::Uuid,
    pub need_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub content: String,
    pub parent_id: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Comment {
    pub fn counts(&self) -> VoteCounts {
        VoteCounts::new(self.upvotes, self.downvotes)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub need_id: uuid::Uuid,
    pub parent_id: Option<uuid::Uuid>,
    pub content: String,
}

impl NewComment {
    pub fn into_comment(self, user_id: uuid::Uuid) -> Comment {
        Comment {
            id: uuid::Uuid::new_v4(),
            need_id: self.need_id,
            user_id,
            content: self.content,
            parent_id: self.parent_id,
            created_at: chrono::Utc::now(),
            upvotes: 0,
            downvotes: 0,
            deleted_at: None,
        }
    }
}
