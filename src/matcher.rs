//! # Duplicate Matcher
//!
//! Decides whether a freshly scanned item is already in the fridge. The
//! default strategy is a loose substring heuristic: it will over-match short
//! common words and has no typo tolerance, so it sits behind a trait.

use tracing::debug;

use crate::food_model::{FoodItem, ScannedNames};

/// Pluggable name comparison
pub trait MatchStrategy: Send + Sync {
    fn is_match(&self, scanned: &ScannedNames, existing: &FoodItem) -> bool;
}

/// Case-insensitive substring containment in either direction,
/// across every populated name field
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl MatchStrategy for SubstringMatcher {
    fn is_match(&self, scanned: &ScannedNames, existing: &FoodItem) -> bool {
        let scanned_names: Vec<String> =
            scanned.names().iter().map(|n| n.to_lowercase()).collect();
        let existing_names: Vec<String> =
            existing.names().iter().map(|n| n.to_lowercase()).collect();

        scanned_names.iter().any(|s| {
            existing_names
                .iter()
                .any(|e| e.contains(s.as_str()) || s.contains(e.as_str()))
        })
    }
}

/// First inventory item the strategy accepts, in inventory order
pub fn find_duplicate<'a, M>(
    strategy: &M,
    scanned: &ScannedNames,
    inventory: &'a [FoodItem],
) -> Option<&'a FoodItem>
where
    M: MatchStrategy + ?Sized,
{
    let found = inventory
        .iter()
        .find(|item| strategy.is_match(scanned, item));

    debug!(
        scanned = %scanned.name,
        matched = found.map(|item| item.name.as_str()).unwrap_or("-"),
        "Duplicate lookup finished"
    );

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food_model::Category;
    use chrono::NaiveDate;

    fn item(name: &str, name_en: Option<&str>) -> FoodItem {
        FoodItem {
            id: name.to_string(),
            name: name.to_string(),
            name_en: name_en.map(str::to_string),
            name_zh: None,
            category: Category::Dairy,
            production_date: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: None,
            weight: None,
            percentage: 100,
        }
    }

    #[test]
    fn test_empty_name_fields_never_match() {
        let scanned = ScannedNames {
            name: "Bread".to_string(),
            name_en: Some(String::new()),
            name_zh: None,
        };
        let inventory = vec![item("Milk", Some(""))];
        assert!(find_duplicate(&SubstringMatcher, &scanned, &inventory).is_none());
    }

    #[test]
    fn test_matches_on_secondary_name() {
        let scanned = ScannedNames {
            name: "全脂牛奶".to_string(),
            name_en: Some("whole milk".to_string()),
            name_zh: None,
        };
        let inventory = vec![item("牛奶", Some("Milk"))];
        assert!(find_duplicate(&SubstringMatcher, &scanned, &inventory).is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let inventory = vec![item("Milk", None), item("Milk chocolate", None)];
        let found = find_duplicate(&SubstringMatcher, &ScannedNames::new("milk"), &inventory);
        assert_eq!(found.map(|i| i.name.as_str()), Some("Milk"));
    }
}
