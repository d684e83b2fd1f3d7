//! # Inventory Tests
//!
//! Persistence, consumption and duplicate matching against real file storage.

mod support;

use anyhow::Result;
use tempfile::TempDir;

use smart_fridge::config::INVENTORY_SLOT;
use smart_fridge::food_model::{Category, FoodItem, ScannedNames};
use smart_fridge::inventory::{ConsumptionOutcome, InventoryStore};
use smart_fridge::matcher::{find_duplicate, SubstringMatcher};
use smart_fridge::recipes::select_ingredients;
use smart_fridge::storage::FileStorage;
use support::{day, food, today};

fn open_store(dir: &TempDir) -> Result<InventoryStore> {
    let storage = FileStorage::open(dir.path())?;
    Ok(InventoryStore::load(Box::new(storage), INVENTORY_SLOT)?)
}

#[test]
fn test_fresh_directory_is_empty_inventory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = open_store(&dir)?;
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn test_inventory_survives_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let carrots = FoodItem {
        name_en: Some("Carrots".to_string()),
        name_zh: Some("胡萝卜".to_string()),
        production_date: Some(day(2024, 4, 18)),
        weight: Some("1 kg".to_string()),
        percentage: 80,
        ..food("a", "Carrots", Category::Vegetable, Some(day(2024, 5, 9)))
    };
    let ketchup = food("b", "Ketchup", Category::Condiment, None);
    let original = vec![carrots.clone(), ketchup.clone()];
    {
        let mut store = open_store(&dir)?;
        store.add(carrots.clone())?;
        store.add(ketchup)?;
    }

    let mut store = open_store(&dir)?;
    assert_eq!(store.items(), original.as_slice());

    let raw = std::fs::read_to_string(dir.path().join(format!("{INVENTORY_SLOT}.json")))?;
    assert!(raw.contains("\"expiryDate\":\"2024-05-09\""));
    assert!(raw.contains("\"productionDate\":\"2024-04-18\""));

    // A consumption update touches nothing but the percentage
    store.set_consumption("a", 25)?;
    let expected = FoodItem {
        percentage: 25,
        ..carrots
    };
    assert_eq!(store.get("a"), Some(&expected));
    let reloaded = open_store(&dir)?;
    assert_eq!(reloaded.get("a"), Some(&expected));
    assert_eq!(reloaded.items()[1], original[1]);
    Ok(())
}

#[test]
fn test_non_positive_consumption_removes_item() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = open_store(&dir)?;
    store.add(food("a", "Bread", Category::Snack, None))?;
    store.add(food("b", "Jam", Category::Condiment, None))?;

    assert_eq!(store.set_consumption("a", 0)?, ConsumptionOutcome::Removed);
    assert_eq!(store.set_consumption("b", -5)?, ConsumptionOutcome::Removed);
    assert!(store.is_empty());
    assert!(open_store(&dir)?.is_empty());
    Ok(())
}

#[test]
fn test_positive_consumption_sets_exact_value() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = open_store(&dir)?;
    store.add(food("a", "Rice", Category::Other, None))?;

    for pct in [1, 37, 100] {
        assert_eq!(
            store.set_consumption("a", pct)?,
            ConsumptionOutcome::Updated(pct as u8)
        );
        assert_eq!(open_store(&dir)?.get("a").map(|i| i.percentage), Some(pct as u8));
    }
    Ok(())
}

#[test]
fn test_substring_match_works_both_ways() {
    let milk = food("m", "Milk", Category::Dairy, None);
    let organic = food("o", "organic milk", Category::Dairy, None);

    let scanned = ScannedNames::new("organic milk");
    assert_eq!(
        find_duplicate(&SubstringMatcher, &scanned, std::slice::from_ref(&milk)).map(|i| &i.id),
        Some(&milk.id)
    );

    let scanned = ScannedNames::new("Milk");
    assert_eq!(
        find_duplicate(&SubstringMatcher, &scanned, std::slice::from_ref(&organic)).map(|i| &i.id),
        Some(&organic.id)
    );

    let scanned = ScannedNames::new("Cheddar");
    assert!(find_duplicate(&SubstringMatcher, &scanned, &[milk, organic]).is_none());
}

#[test]
fn test_recipe_eligibility_window() {
    let items = [
        food("1", "In three days", Category::Other, Some(day(2024, 5, 4))),
        food("2", "In four days", Category::Other, Some(day(2024, 5, 5))),
        food("3", "Yesterday", Category::Other, Some(day(2024, 4, 30))),
        food("4", "Today", Category::Other, Some(today())),
    ];

    let selected = select_ingredients(&items, today(), "en");
    assert_eq!(selected, ["Today", "In three days"]);
}

#[test]
fn test_recipe_selection_pads_when_little_is_urgent() {
    let items = [
        food("1", "Lettuce", Category::Vegetable, Some(day(2024, 5, 2))),
        food("2", "Rice", Category::Other, None),
        food("3", "Pasta", Category::Other, None),
        food("4", "Beans", Category::Other, None),
        food("5", "Oats", Category::Other, None),
    ];

    let selected = select_ingredients(&items, today(), "en");
    assert_eq!(selected, ["Lettuce", "Rice", "Pasta", "Beans"]);
}
