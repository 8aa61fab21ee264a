use super::geo::Coordinates;
use super::heat::HeatTier;
use super::need::Need;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A group of co-located needs drawn as one bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub center: Coordinates,
    pub needs: Vec<Need>,
    pub tier: HeatTier,
}

impl Cluster {
    pub fn from_needs(center: Coordinates, needs: Vec<Need>) -> Self {
        let tier = cluster_tier(&needs);
        Self { center, needs, tier }
    }

    pub fn len(&self) -> usize {
        self.needs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }
}

/// The item with the highest net score. On ties the first one wins.
pub fn hottest<'a>(needs: impl IntoIterator<Item = &'a Need>) -> Option<&'a Need> {
    needs.into_iter().fold(None, |best: Option<&Need>, need| match best {
        Some(b) if b.net() >= need.net() => Some(b),
        _ => Some(need),
    })
}

pub fn cluster_tier<'a>(needs: impl IntoIterator<Item = &'a Need>) -> HeatTier {
    hottest(needs).map_or(HeatTier::New, Need::heat)
}

/// Groups needs by neighborhood cell. Clusters come out ordered by cell so
/// repeated calls on the same input agree.
pub fn group_by_cell(needs: impl IntoIterator<Item = Need>) -> Vec<Cluster> {
    let mut cells: HashMap<(i64, i64), Vec<Need>> = HashMap::new();
    for need in needs {
        cells.entry(need.coordinates().neighborhood_cell()).or_default().push(need);
    }

    let mut cells: Vec<_> = cells.into_iter().collect();
    cells.sort_by_key(|(cell, _)| *cell);

    cells
        .into_iter()
        .map(|(_, needs)| {
            let center = needs[0].coordinates().neighborhood_center();
            Cluster::from_needs(center, needs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::need::fixtures::need;

    #[test]
    fn test_cluster_takes_hottest_member() {
        let needs = vec![need("a", 3, 0), need("b", 60, 5), need("c", 12, 0)];
        assert_eq!(hottest(&needs).map(|n| n.title.as_str()), Some("b"));
        assert_eq!(cluster_tier(&needs), HeatTier::OnFire);
    }

    #[test]
    fn test_empty_cluster_is_new() {
        let needs: Vec<Need> = Vec::new();
        assert!(hottest(&needs).is_none());
        assert_eq!(cluster_tier(&needs), HeatTier::New);
    }

    #[test]
    fn test_tie_keeps_first() {
        let needs = vec![need("first", 10, 0), need("second", 12, 2)];
        assert_eq!(hottest(&needs).map(|n| n.title.as_str()), Some("first"));
    }

    #[test]
    fn test_negative_scores_still_pick_a_member() {
        let needs = vec![need("bad", 0, 9), need("worse", 0, 20)];
        assert_eq!(hottest(&needs).map(|n| n.title.as_str()), Some("bad"));
        assert_eq!(cluster_tier(&needs), HeatTier::New);
    }

    #[test]
    fn test_group_by_cell() {
        let a = need("a", 30, 0);
        let b = need("b", 1, 0);
        let mut far = need("far", 0, 0);
        far.latitude = 21.4858;
        far.longitude = 39.1925;

        let clusters = group_by_cell(vec![a, b, far]);
        assert_eq!(clusters.len(), 2);
        let riyadh = clusters.iter().find(|c| c.len() == 2).unwrap();
        assert_eq!(riyadh.tier, HeatTier::Hot);
        let jeddah = clusters.iter().find(|c| c.len() == 1).unwrap();
        assert_eq!(jeddah.tier, HeatTier::New);
    }
}
