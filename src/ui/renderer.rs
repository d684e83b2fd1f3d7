//! Renderer module for turning controller state into terminal text

use chrono::NaiveDate;

use crate::controller::{CaptureMode, CaptureOverlay, Controller, Screen};
use crate::errors::AppError;
use crate::food_model::{FoodItem, ReceiptData, SearchResult, StagedItem};
use crate::localization::{t_args_lang, t_lang};
use crate::recipes::RecipeBoard;

/// Render whatever the controller currently shows
pub fn render(controller: &Controller) -> String {
    let lang = controller.language();
    let today = controller.today();

    let mut out = String::new();
    if let Some(err) = controller.error() {
        out.push_str(&format_error(err, lang));
        out.push_str("\n\n");
    }

    if let Some(overlay) = controller.overlay() {
        out.push_str(&format_overlay(overlay, lang));
        return out;
    }

    let body = match controller.screen() {
        Screen::Inventory => format_inventory(controller.store().items(), today, lang),
        Screen::AddForm(staged) => format_add_form(staged, lang),
        Screen::ShopResult(result) => format_shop_result(result, today, lang),
        Screen::ReceiptReview(receipt) => format_receipt(receipt, lang),
        Screen::Recipes(board) => format_recipes(board, lang),
    };
    out.push_str(&body);
    out
}

/// Format the inventory as a numbered list in store order
pub fn format_inventory(items: &[FoodItem], today: NaiveDate, lang: &str) -> String {
    let mut result = format!("🧊 **{}**\n\n", t_lang("inventory-title", lang));

    if items.is_empty() {
        result.push_str(&t_lang("inventory-empty", lang));
        result.push('\n');
    }

    for (i, item) in items.iter().enumerate() {
        result.push_str(&format!(
            "{}. {} {} {}% · {}\n",
            i + 1,
            item.icon(),
            item.display_name(lang),
            item.percentage,
            format_expiry(item, today, lang)
        ));
    }

    result.push('\n');
    result.push_str(&t_lang("inventory-help", lang));
    result
}

fn format_expiry(item: &FoodItem, today: NaiveDate, lang: &str) -> String {
    let status = t_lang(item.expiry_status(today).message_key(), lang);
    match item.days_until_expiry(today) {
        Some(0) => format!("{status} ({})", t_lang("expiry-today", lang)),
        Some(days) => {
            let key = if days < 0 { "expiry-overdue" } else { "expiry-days" };
            let count = days.abs().to_string();
            let detail = t_args_lang(key, &[("days", &count)], lang);
            format!("{status} ({detail})")
        }
        None => status,
    }
}

fn format_optional_date(date: Option<NaiveDate>, lang: &str) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| t_lang("value-none", lang))
}

fn format_optional_text(value: &Option<String>, lang: &str) -> String {
    value.clone().unwrap_or_else(|| t_lang("value-none", lang))
}

pub fn format_add_form(staged: &StagedItem, lang: &str) -> String {
    let name = if staged.name.is_empty() {
        t_lang("value-none", lang)
    } else {
        staged.name.clone()
    };

    let rows = [
        ("field-name", name),
        ("field-name-en", format_optional_text(&staged.name_en, lang)),
        ("field-name-zh", format_optional_text(&staged.name_zh, lang)),
        (
            "field-category",
            format!("{} {}", staged.category.icon(), staged.category),
        ),
        ("field-production", format_optional_date(staged.production_date, lang)),
        ("field-purchase", format_optional_date(staged.purchase_date, lang)),
        ("field-expiry", format_optional_date(staged.expiry_date, lang)),
        ("field-weight", format_optional_text(&staged.weight, lang)),
    ];

    let mut result = format!("📝 **{}**\n\n", t_lang("add-title", lang));
    for (key, value) in rows {
        result.push_str(&format!("{}: {}\n", t_lang(key, lang), value));
    }
    result.push('\n');
    result.push_str(&t_lang("add-help", lang));
    result
}

pub fn format_shop_result(result: &SearchResult, today: NaiveDate, lang: &str) -> String {
    let mut out = format!(
        "🛒 **{}**\n\n{} {}\n\n",
        t_lang("shop-title", lang),
        result.category.icon(),
        result.scanned.display_name(lang)
    );

    match &result.matched {
        Some(existing) => {
            let purchased = existing.purchase_date.to_string();
            let percentage = existing.percentage.to_string();
            out.push_str(&t_args_lang(
                "shop-duplicate",
                &[
                    ("name", existing.display_name(lang)),
                    ("purchased", &purchased),
                    ("percentage", &percentage),
                ],
                lang,
            ));
            out.push('\n');
            out.push_str(&format_expiry(existing, today, lang));
        }
        None => out.push_str(&t_lang("shop-no-duplicate", lang)),
    }

    out.push_str("\n\n");
    out.push_str(&t_lang("shop-help", lang));
    out
}

pub fn format_receipt(receipt: &ReceiptData, lang: &str) -> String {
    let date = format_optional_date(receipt.purchase_date, lang);
    let mut out = format!(
        "🧾 **{}**\n{}\n\n",
        t_lang("receipt-title", lang),
        t_args_lang("receipt-date", &[("date", &date)], lang)
    );

    if receipt.lines.is_empty() {
        out.push_str(&t_lang("receipt-empty", lang));
        out.push('\n');
    }

    for (i, line) in receipt.lines.iter().enumerate() {
        let display = if lang.starts_with("zh") {
            line.name_zh.as_deref().unwrap_or(&line.name)
        } else {
            line.name_en.as_deref().unwrap_or(&line.name)
        };
        let quantity = line
            .quantity
            .as_deref()
            .map(|q| format!(" × {q}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}. {} {}{}\n",
            i + 1,
            line.category.icon(),
            display,
            quantity
        ));
    }

    out.push('\n');
    out.push_str(&t_lang("receipt-help", lang));
    out
}

pub fn format_recipes(board: &RecipeBoard, lang: &str) -> String {
    let ingredients = board.ingredients.join(", ");
    let mut out = format!(
        "👩‍🍳 **{}**\n{}\n",
        t_lang("recipes-title", lang),
        t_args_lang("recipes-using", &[("ingredients", &ingredients)], lang)
    );

    for (i, recipe) in board.recipes.iter().enumerate() {
        out.push_str(&format!("\n{}. **{}**\n", i + 1, recipe.name));
        if !recipe.description.is_empty() {
            out.push_str(&format!("   {}\n", recipe.description));
        }
        if !recipe.ingredients_available.is_empty() {
            out.push_str(&format!(
                "   ✅ {}: {}\n",
                t_lang("recipes-have", lang),
                recipe.ingredients_available.join(", ")
            ));
        }
        if !recipe.ingredients_missing.is_empty() {
            out.push_str(&format!(
                "   🛒 {}: {}\n",
                t_lang("recipes-missing", lang),
                recipe.ingredients_missing.join(", ")
            ));
        }
        for (step_no, step) in recipe.steps.iter().enumerate() {
            out.push_str(&format!("   {}) {}\n", step_no + 1, step));
        }
        for video in &recipe.videos {
            out.push_str(&format!(
                "   ▶ [{}] {} {}\n",
                video.platform, video.title, video.url
            ));
        }
        let image = match (&recipe.image, recipe.image_loading) {
            (Some(image), _) => format_image_reference(image),
            (None, true) => t_lang("recipes-image-loading", lang),
            (None, false) => t_lang("recipes-image-none", lang),
        };
        out.push_str(&format!("   🖼 {}\n", image));
    }

    out.push('\n');
    out.push_str(&t_lang("recipes-help", lang));
    out
}

/// Inline data URIs are too long for a terminal line
fn format_image_reference(image: &str) -> String {
    if image.starts_with("data:") {
        let mime = image
            .trim_start_matches("data:")
            .split(';')
            .next()
            .unwrap_or("image");
        format!("<{mime}, {} bytes inline>", image.len())
    } else {
        image.to_string()
    }
}

pub fn format_overlay(overlay: &CaptureOverlay, lang: &str) -> String {
    let mode_key = match overlay.mode {
        CaptureMode::Add => "capture-mode-add",
        CaptureMode::Shop => "capture-mode-shop",
        CaptureMode::Receipt => "capture-mode-receipt",
    };
    let count = overlay.image_count().to_string();
    let mut out = format!(
        "📷 **{}**\n{}\n",
        t_lang(mode_key, lang),
        t_args_lang("capture-count", &[("count", &count)], lang)
    );
    if !overlay.is_active() {
        out.push_str(&t_lang("capture-inactive", lang));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&t_lang("capture-help", lang));
    out
}

pub fn format_error(err: &AppError, lang: &str) -> String {
    let mut out = format!("⚠️ {}", t_lang(err.message_key(), lang));
    if let AppError::InvalidInput(detail) = err {
        out.push_str(&format!(" ({detail})"));
    }
    if err.is_retryable_camera_error() {
        out.push('\n');
        out.push_str(&t_lang("error-camera-retry", lang));
    }
    out.push('\n');
    out.push_str(&t_lang("error-dismiss", lang));
    out
}

/// Shown while a recognition call is pending
pub fn format_loading(lang: &str) -> String {
    format!("⏳ {}", t_lang("loading", lang))
}
