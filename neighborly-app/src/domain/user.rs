use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

impl Role {
    pub fn can_moderate(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    /// Only admins hand out or take away roles.
    pub fn can_assign_roles(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            _ => Self::Member,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: uuid::Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    pub fn new(full_name: String, avatar_url: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            full_name,
            avatar_url,
            role: Role::Member,
            created_at: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Who is looking at the page. Anonymous visitors can read and vote but not
/// write comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user: Option<User>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_author_of(&self, author_id: uuid::Uuid) -> bool {
        self.user_id() == Some(author_id)
    }

    pub fn can_moderate(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.can_moderate())
    }

    pub fn can_assign_roles(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.can_assign_roles())
    }
}
