use crate::domain::{Coordinates, NeedCategory, NewNeed};
use neighborly_errors::AppError;

/// Raw text of the "post a need" form, before it is sent.
///
/// Only shape is checked here. Sanitizing and length limits are enforced again
/// by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedDraft {
    pub title: String,
    /// A category label as shown in the select.
    pub category: String,
    pub description: String,
    pub latitude: String,
    pub longitude: String,
}

impl NeedDraft {
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }

    pub fn to_input(&self) -> Result<NewNeed, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::invalid("Title is required"));
        }
        let category = self
            .category
            .parse::<NeedCategory>()
            .map_err(AppError::InvalidInput)?;

        let latitude = parse_degrees("Latitude", &self.latitude)?;
        let longitude = parse_degrees("Longitude", &self.longitude)?;
        if !Coordinates::new(latitude, longitude).is_valid() {
            return Err(AppError::invalid("Coordinates are out of range"));
        }

        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(NewNeed {
            title: title.to_string(),
            category,
            description,
            latitude,
            longitude,
        })
    }
}

fn parse_degrees(field: &str, raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AppError::invalid(format!("{field} must be a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NeedDraft {
        NeedDraft {
            title: "  24h pharmacy ".to_string(),
            category: "Pharmacy".to_string(),
            description: "   ".to_string(),
            latitude: "-6.2088".to_string(),
            longitude: " 106.8456".to_string(),
        }
    }

    #[test]
    fn test_valid_draft_becomes_input() {
        let input = draft().to_input().unwrap();
        assert_eq!(input.title, "24h pharmacy");
        assert_eq!(input.category, NeedCategory::Pharmacy);
        assert_eq!(input.description, None);
        assert_eq!(input.latitude, -6.2088);
        assert_eq!(input.longitude, 106.8456);
    }

    #[test]
    fn test_bad_fields_are_rejected() {
        let blank = NeedDraft { title: " ".to_string(), ..draft() };
        assert!(blank.is_blank());
        assert_eq!(blank.to_input(), Err(AppError::invalid("Title is required")));

        let category = NeedDraft { category: "Casino".to_string(), ..draft() };
        assert!(matches!(category.to_input(), Err(AppError::InvalidInput(_))));

        let latitude = NeedDraft { latitude: "south".to_string(), ..draft() };
        assert_eq!(latitude.to_input(), Err(AppError::invalid("Latitude must be a number")));

        let far = NeedDraft { longitude: "181".to_string(), ..draft() };
        assert_eq!(far.to_input(), Err(AppError::invalid("Coordinates are out of range")));
    }
}
