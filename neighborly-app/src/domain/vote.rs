use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Something that carries an up/down counter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum VoteTarget {
    Need(uuid::Uuid),
    Comment(uuid::Uuid),
}

impl VoteTarget {
    pub fn id(&self) -> uuid::Uuid {
        match self {
            Self::Need(id) | Self::Comment(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Need(_) => "need",
            Self::Comment(_) => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl VoteCounts {
    pub fn new(upvotes: i32, downvotes: i32) -> Self {
        Self { upvotes, downvotes }
    }

    pub fn net(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    /// Counters after one more vote in `direction`.
    pub fn with_vote(self, direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => Self {
                upvotes: self.upvotes.saturating_add(1),
                ..self
            },
            VoteDirection::Down => Self {
                downvotes: self.downvotes.saturating_add(1),
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_vote_touches_one_counter() {
        let counts = VoteCounts::new(7, 2);
        assert_eq!(counts.with_vote(VoteDirection::Up), VoteCounts::new(8, 2));
        assert_eq!(counts.with_vote(VoteDirection::Down), VoteCounts::new(7, 3));
    }

    #[test]
    fn test_net_does_not_overflow() {
        let counts = VoteCounts::new(i32::MIN, i32::MAX);
        assert_eq!(counts.net(), i64::from(i32::MIN) - i64::from(i32::MAX));
    }
}
