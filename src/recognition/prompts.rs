//! Prompt text for each recognition operation.

use chrono::NaiveDate;

pub fn analysis_prompt(today: NaiveDate) -> String {
    format!(
        "You are looking at one or more photos of a single food item going into a fridge. \
         Today is {today}. Identify the item and read the package. \
         Give a short display name, plus English and Simplified Chinese names. \
         Pick the closest category. \
         Read the production date and the expiry or best-before date if printed, as YYYY-MM-DD; \
         if only a shelf life is printed, compute the expiry date from the production date; \
         if nothing is printed, estimate a typical expiry date for fresh produce bought today, \
         otherwise use null. \
         Read the net weight or volume with its unit, or null."
    )
}

pub fn identification_prompt() -> String {
    "You are looking at a photo of a food product in a shop. \
     Identify what product it is in general terms (e.g. \"milk\", not the brand slogan). \
     Give a short display name, plus English and Simplified Chinese names, and the closest category."
        .to_string()
}

/// The receipt prompt carries today's date so a year-less receipt date can be completed
pub fn receipt_prompt(today: NaiveDate) -> String {
    format!(
        "You are looking at a photo of a grocery receipt. Today is {today}. \
         Read the purchase date as YYYY-MM-DD (assume the most recent matching date not after today \
         if the year is missing), or null if it is not printed. \
         List every food or drink line in printed order, skipping bags, deposits, discounts and totals. \
         For each line give a short display name, English and Simplified Chinese names, \
         the closest category and the quantity or weight as printed (or null)."
    )
}

pub fn recipe_prompt(ingredients: &[String], language: &str) -> String {
    let language_name = if language.starts_with("zh") {
        "Simplified Chinese"
    } else {
        "English"
    };
    let video_hint = if language.starts_with("zh") {
        "Bilibili or YouTube"
    } else {
        "YouTube"
    };
    format!(
        "I need to use up these ingredients from my fridge soon: {}. \
         Suggest at least 3 home-cooking recipes that use as many of them as possible. \
         For each recipe give: name, a one-sentence description, which of my ingredients it uses \
         (ingredientsAvailable), what else I would need to buy (ingredientsMissing), \
         numbered-order cooking steps, and one or two cooking videos from {video_hint} \
         (title, url, platform). If you know a direct URL of a photo of the finished dish, \
         put it in imageUrl, otherwise null. Answer in {language_name}.",
        ingredients.join(", ")
    )
}

pub fn recipe_image_prompt(name: &str, description: &str) -> String {
    format!(
        "A realistic, appetising overhead food photo of the home-cooked dish \"{name}\": \
         {description}. Natural light, plain table, no text."
    )
}
