//! # Inventory Store
//!
//! Owns the committed food items. The collection is seeded once from a
//! storage slot and the full list is written back after every mutation.

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::food_model::{FoodItem, FULL_PERCENTAGE};
use crate::storage::StorageBackend;

/// What a consumption update did to the item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionOutcome {
    /// Remaining fraction set to the contained value
    Updated(u8),
    /// Item used up and removed
    Removed,
}

pub struct InventoryStore {
    items: Vec<FoodItem>,
    storage: Box<dyn StorageBackend>,
    slot: String,
}

impl InventoryStore {
    /// Seed the store from `slot`; an absent slot is an empty inventory
    pub fn load(storage: Box<dyn StorageBackend>, slot: &str) -> Result<Self, AppError> {
        let items = match storage.load(slot)? {
            Some(json) => serde_json::from_str::<Vec<FoodItem>>(&json)
                .with_context(|| format!("Stored inventory in slot '{slot}' is not readable"))?,
            None => Vec::new(),
        };

        info!(slot = %slot, item_count = items.len(), "Inventory loaded");

        Ok(Self {
            items,
            storage,
            slot: slot.to_string(),
        })
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FoodItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Append a committed item
    pub fn add(&mut self, item: FoodItem) -> Result<(), AppError> {
        info!(item_id = %item.id, name = %item.name, category = %item.category, "Adding item");
        self.items.push(item);
        self.persist()
    }

    /// Append several items with a single write
    pub fn add_all(&mut self, items: Vec<FoodItem>) -> Result<(), AppError> {
        info!(item_count = items.len(), "Adding items in bulk");
        self.items.extend(items);
        self.persist()
    }

    /// Record how much of an item is left.
    ///
    /// `percentage <= 0` removes the item; anything above 100 is treated as 100.
    pub fn set_consumption(
        &mut self,
        id: &str,
        percentage: i32,
    ) -> Result<ConsumptionOutcome, AppError> {
        let index = self.index_of(id)?;

        if percentage <= 0 {
            let removed = self.items.remove(index);
            info!(item_id = %removed.id, name = %removed.name, "Item used up, removing");
            self.persist()?;
            return Ok(ConsumptionOutcome::Removed);
        }

        let clamped = percentage.min(i32::from(FULL_PERCENTAGE)) as u8;
        if clamped as i32 != percentage {
            warn!(item_id = %id, requested = percentage, "Consumption above 100%, clamping");
        }
        self.items[index].percentage = clamped;
        debug!(item_id = %id, percentage = clamped, "Consumption updated");
        self.persist()?;
        Ok(ConsumptionOutcome::Updated(clamped))
    }

    /// Remove an item regardless of how much is left
    pub fn discard(&mut self, id: &str) -> Result<FoodItem, AppError> {
        let index = self.index_of(id)?;
        let removed = self.items.remove(index);
        info!(item_id = %removed.id, name = %removed.name, "Item discarded");
        self.persist()?;
        Ok(removed)
    }

    fn index_of(&self, id: &str) -> Result<usize, AppError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| AppError::UnknownItem(id.to_string()))
    }

    fn persist(&mut self) -> Result<(), AppError> {
        let json = serde_json::to_string(&self.items)
            .context("Failed to serialize inventory")?;
        self.storage
            .save(&self.slot, &json)
            .with_context(|| format!("Failed to persist inventory to slot '{}'", self.slot))?;
        debug!(slot = %self.slot, item_count = self.items.len(), "Inventory persisted");
        Ok(())
    }
}
