use super::geo::Coordinates;
use super::heat::HeatTier;
use super::vote::VoteCounts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Place types a neighborhood can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedCategory {
    GroceryStore,
    Pharmacy,
    AtmBank,
    Park,
    PublicRestroom,
    PlaceOfWorship,
    School,
    HospitalClinic,
    Gym,
    CafeRestaurant,
    TransportStop,
    PostOffice,
    Library,
    CommunityCenter,
    Other,
}

impl NeedCategory {
    pub const ALL: [NeedCategory; 15] = [
        Self::GroceryStore,
        Self::Pharmacy,
        Self::AtmBank,
        Self::Park,
        Self::PublicRestroom,
        Self::PlaceOfWorship,
        Self::School,
        Self::HospitalClinic,
        Self::Gym,
        Self::CafeRestaurant,
        Self::TransportStop,
        Self::PostOffice,
        Self::Library,
        Self::CommunityCenter,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::GroceryStore => "Grocery Store",
            Self::Pharmacy => "Pharmacy",
            Self::AtmBank => "ATM / Bank",
            Self::Park => "Park / Green Space",
            Self::PublicRestroom => "Public Restroom",
            Self::PlaceOfWorship => "Mosque / Place of Worship",
            Self::School => "School / Kindergarten",
            Self::HospitalClinic => "Hospital / Clinic",
            Self::Gym => "Gym / Fitness Center",
            Self::CafeRestaurant => "Cafe / Restaurant",
            Self::TransportStop => "Public Transport Stop",
            Self::PostOffice => "Post Office",
            Self::Library => "Library",
            Self::CommunityCenter => "Community Center",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for NeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NeedCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Need {
    pub id: uuid::Uuid,
    pub title: String,
    pub category: NeedCategory,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub upvotes: i32,
    pub downvotes: i32,
    pub author_id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Need {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn counts(&self) -> VoteCounts {
        VoteCounts::new(self.upvotes, self.downvotes)
    }

    pub fn net(&self) -> i64 {
        self.counts().net()
    }

    pub fn heat(&self) -> HeatTier {
        HeatTier::classify(self.upvotes, self.downvotes)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for posting a need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNeed {
    pub title: String,
    pub category: NeedCategory,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewNeed {
    pub fn into_need(self, author_id: uuid::Uuid) -> Need {
        Need {
            id: uuid::Uuid::new_v4(),
            title: self.title,
            category: self.category,
            description: self.description,
            latitude: self.latitude,
            longitude: self.longitude,
            upvotes: 0,
            downvotes: 0,
            author_id,
            created_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proximity {
    pub center: Coordinates,
    pub radius_meters: f64,
}

/// Map sidebar filters. Soft-deleted needs never match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeedFilter {
    pub category: Option<NeedCategory>,
    pub search: Option<String>,
    pub near: Option<Proximity>,
}

impl NeedFilter {
    pub fn with_category(mut self, category: Option<NeedCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_near(mut self, near: Option<Proximity>) -> Self {
        self.near = near;
        self
    }

    pub fn matches(&self, need: &Need) -> bool {
        if need.is_deleted() {
            return false;
        }

        if let Some(category) = self.category {
            if need.category != category {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let term = term.trim().to_lowercase();
            let in_title = need.title.to_lowercase().contains(&term);
            let in_description = need
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&term));
            if !in_title && !in_description {
                return false;
            }
        }

        if let Some(near) = &self.near {
            if near.center.distance_to(&need.coordinates()) > near.radius_meters {
                return false;
            }
        }

        true
    }

    /// Matching needs, newest first.
    pub fn apply(&self, needs: impl IntoIterator<Item = Need>) -> Vec<Need> {
        let mut out: Vec<Need> = needs.into_iter().filter(|n| self.matches(n)).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn need(title: &str, upvotes: i32, downvotes: i32) -> Need {
        Need {
            id: uuid::Uuid::new_v4(),
            title: title.to_string(),
            category: NeedCategory::Pharmacy,
            description: None,
            latitude: 24.7136,
            longitude: 46.6753,
            upvotes,
            downvotes,
            author_id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            deleted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::need;
    use super::*;

    #[test]
    fn test_category_labels_parse_back() {
        for category in NeedCategory::ALL {
            assert_eq!(category.label().parse::<NeedCategory>(), Ok(category));
        }
        assert!("Spaceport".parse::<NeedCategory>().is_err());
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let mut a = need("Late night pharmacy", 0, 0);
        a.description = None;
        let mut b = need("Something", 0, 0);
        b.description = Some("We need a PHARMACY near the school".to_string());
        let c = need("Bakery", 0, 0);

        let filter = NeedFilter::default().with_search(Some("pharmacy".to_string()));
        assert!(filter.matches(&a));
        assert!(filter.matches(&b));
        assert!(!filter.matches(&c));
    }

    #[test]
    fn test_deleted_and_category_filtering() {
        let mut gone = need("Gone", 0, 0);
        gone.deleted_at = Some(chrono::Utc::now());
        assert!(!NeedFilter::default().matches(&gone));

        let mut park = need("Park", 0, 0);
        park.category = NeedCategory::Park;
        let filter = NeedFilter::default().with_category(Some(NeedCategory::Pharmacy));
        assert!(!filter.matches(&park));
        assert!(filter.matches(&need("Pharmacy", 0, 0)));
    }

    #[test]
    fn test_proximity_filter() {
        let mut far = need("Far", 0, 0);
        far.latitude = 21.4858;
        far.longitude = 39.1925;
        let here = need("Here", 0, 0);

        let filter = NeedFilter::default().with_near(Some(Proximity {
            center: Coordinates::new(24.7136, 46.6753),
            radius_meters: 2_000.0,
        }));
        assert!(filter.matches(&here));
        assert!(!filter.matches(&far));
    }

    #[test]
    fn test_apply_orders_newest_first() {
        let old = need("Old", 0, 0);
        let mut new = need("New", 0, 0);
        new.created_at = old.created_at + chrono::Duration::hours(1);

        let out = NeedFilter::default().apply(vec![old.clone(), new.clone()]);
        assert_eq!(out[0].id, new.id);
        assert_eq!(out[1].id, old.id);
    }

    #[test]
    fn test_heat_of_need() {
        assert_eq!(need("x", 7, 2).heat(), HeatTier::Noticed);
    }
}
