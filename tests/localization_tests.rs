//! # Localization Tests
//!
//! This module contains unit tests for the localization functionality,
//! testing message retrieval and formatting with various edge cases.

use smart_fridge::errors::{AppError, CameraError, RecognitionError};
use smart_fridge::food_model::ExpiryStatus;
use smart_fridge::localization::{normalize_language, LocalizationManager};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        // Create a new localization manager for each test
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("help-text", "en", None);
        assert!(message.contains("Commands"));
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("inventory-title", "fr", None);
        // Should fall back to English
        assert_eq!(message, "My Fridge");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("name", "Whole Milk");
        args.insert("purchased", "2024-04-20");
        args.insert("percentage", "60");

        let message = manager.get_message_in_language("shop-duplicate", "en", Some(&args));
        assert!(message.contains("Whole Milk"));
        assert!(message.contains("2024-04-20"));
        assert!(message.contains("60%"));
    }

    #[test]
    fn test_get_message_missing_args() {
        let manager = setup_localization();

        // Missing arguments are reported, not fatal
        let message = manager.get_message_in_language("capture-count", "en", None);
        assert!(!message.is_empty());
    }

    #[test]
    fn test_chinese_localization() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("inventory-title", "zh-CN", None);
        let english_message = manager.get_message_in_language("inventory-title", "en", None);
        assert_eq!(message, "我的冰箱");
        assert_ne!(message, english_message);
    }

    #[test]
    fn test_language_normalization() {
        assert_eq!(normalize_language("en"), "en");
        assert_eq!(normalize_language("en-US"), "en");
        assert_eq!(normalize_language("zh"), "zh");
        assert_eq!(normalize_language("zh_TW"), "zh");
        assert_eq!(normalize_language("unsupported"), "en"); // Fallback to English
    }

    #[test]
    fn test_supported_languages() {
        let manager = setup_localization();
        assert_eq!(manager.languages(), ["en", "zh"]);
        assert!(manager.supports("zh-CN"));
        assert!(manager.supports("EN"));
        assert!(!manager.supports("fr"));
    }

    #[test]
    fn test_every_message_key_is_translated() {
        let manager = setup_localization();

        let mut keys = vec![
            ExpiryStatus::Expired.message_key(),
            ExpiryStatus::Urgent.message_key(),
            ExpiryStatus::Fresh.message_key(),
            ExpiryStatus::Unknown.message_key(),
        ];
        let errors = [
            AppError::from(CameraError::PermissionDenied(String::new())),
            AppError::from(CameraError::NotFound(String::new())),
            AppError::from(CameraError::Busy(String::new())),
            AppError::from(CameraError::Other(String::new())),
            AppError::from(RecognitionError::MissingCredentials),
            AppError::from(RecognitionError::EmptyResponse),
            AppError::RecipeFailure(RecognitionError::EmptyResponse),
            AppError::EmptyFridge,
            AppError::Storage(String::new()),
            AppError::UnknownItem(String::new()),
            AppError::InvalidInput(String::new()),
            AppError::WrongScreen("inventory"),
            AppError::NoCaptureSession,
            AppError::Busy,
        ];
        keys.extend(errors.iter().map(AppError::message_key));

        for lang in manager.languages() {
            for key in &keys {
                let message = manager.get_message_in_language(key, lang, None);
                assert!(
                    !message.starts_with("Missing translation:"),
                    "{key} missing in {lang}"
                );
            }
        }
    }

    #[test]
    fn test_convenience_functions() {
        let message = smart_fridge::localization::t_lang("inventory-title", "en");
        assert_eq!(message, "My Fridge");

        let args = vec![("count", "3")];
        let message_with_args =
            smart_fridge::localization::t_args_lang("receipt-added", &args, "zh");
        assert!(message_with_args.contains('3'));
        assert!(message_with_args.contains("小票"));
    }
}
