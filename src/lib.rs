//! # Smart Fridge
//!
//! A food-inventory tracker: photograph items, receipts or shop shelves,
//! let a hosted multimodal model read them, keep the inventory in a local
//! slot, and get recipe ideas for whatever is about to expire.

pub mod capture;
pub mod config;
pub mod controller;
pub mod errors;
pub mod food_model;
pub mod inventory;
pub mod localization;
pub mod matcher;
pub mod recipes;
pub mod recognition;
pub mod storage;
pub mod ui;
