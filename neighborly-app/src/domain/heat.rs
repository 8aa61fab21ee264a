use serde::{Deserialize, Serialize};

/// Popularity bucket of a need or cluster, derived from its net vote score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeatTier {
    New,
    Noticed,
    Popular,
    Hot,
    OnFire,
}

impl HeatTier {
    pub fn classify(upvotes: i32, downvotes: i32) -> Self {
        Self::from_net(i64::from(upvotes) - i64::from(downvotes))
    }

    pub fn from_net(net: i64) -> Self {
        match net {
            n if n >= 50 => Self::OnFire,
            n if n >= 25 => Self::Hot,
            n if n >= 10 => Self::Popular,
            n if n >= 3 => Self::Noticed,
            _ => Self::New,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::OnFire => "#ef4444",
            Self::Hot => "#f97316",
            Self::Popular => "#f59e0b",
            Self::Noticed => "#22c55e",
            Self::New => "#3b82f6",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OnFire => "On fire",
            Self::Hot => "Hot",
            Self::Popular => "Popular",
            Self::Noticed => "Noticed",
            Self::New => "New",
        }
    }

    /// 1-based tier number, `New` being tier 1.
    pub fn level(&self) -> u8 {
        *self as u8 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        let cases = [
            (2, HeatTier::New),
            (3, HeatTier::Noticed),
            (9, HeatTier::Noticed),
            (10, HeatTier::Popular),
            (24, HeatTier::Popular),
            (25, HeatTier::Hot),
            (49, HeatTier::Hot),
            (50, HeatTier::OnFire),
            (-1, HeatTier::New),
            (-500, HeatTier::New),
        ];
        for (net, tier) in cases {
            assert_eq!(HeatTier::from_net(net), tier, "net = {}", net);
        }
    }

    #[test]
    fn test_classify_uses_net_score() {
        assert_eq!(HeatTier::classify(7, 2), HeatTier::Noticed);
        assert_eq!(HeatTier::classify(7, 2).color(), "#22c55e");
        assert_eq!(HeatTier::classify(60, 20), HeatTier::Hot);
        assert_eq!(HeatTier::classify(0, 40), HeatTier::New);
    }

    #[test]
    fn test_classify_is_total() {
        assert_eq!(HeatTier::classify(i32::MAX, i32::MIN), HeatTier::OnFire);
        assert_eq!(HeatTier::classify(i32::MIN, i32::MAX), HeatTier::New);
    }

    #[test]
    fn test_levels() {
        assert_eq!(HeatTier::New.level(), 1);
        assert_eq!(HeatTier::OnFire.level(), 5);
        assert!(HeatTier::Hot > HeatTier::Popular);
    }
}
