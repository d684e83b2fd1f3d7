use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Fallback language for missing bundles and keys
pub const FALLBACK_LANGUAGE: &str = "en";

const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("zh", include_str!("../locales/zh/main.ftl")),
];

/// Localization manager for the fridge tracker
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a localization manager with every embedded language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();
        for (code, source) in RESOURCES {
            let locale: LanguageIdentifier = code.parse()?;
            bundles.insert(code.to_string(), Self::create_bundle(locale, source)?);
        }
        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Terminal output, no bidi isolation marks around placeables
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for {locale}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate Fluent messages for {locale}: {errors:?}"))?;

        Ok(bundle)
    }

    /// Languages with a loaded bundle
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// Whether the primary subtag of `language` has its own bundle
    pub fn supports(&self, language: &str) -> bool {
        let primary = language
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or(language)
            .to_lowercase();
        self.bundles.contains_key(&primary)
    }

    /// Get a localized message in a language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let language = normalize_language(language);
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(FALLBACK_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        // A key missing from a translation falls back to the English text
        let (bundle, msg) = match bundle.get_message(key) {
            Some(msg) => (bundle, msg),
            None => match self
                .bundles
                .get(FALLBACK_LANGUAGE)
                .and_then(|fallback| fallback.get_message(key).map(|msg| (fallback, msg)))
            {
                Some(found) => found,
                None => return format!("Missing translation: {key}"),
            },
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (k, v) in args {
                fluent_args.set(*k, FluentValue::from(*v));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key = %key, errors = ?errors, "Fluent formatting errors");
        }
        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(
        &self,
        key: &str,
        language: &str,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}

/// Reduce a language tag to a bundle key ("zh-CN" -> "zh", "en_GB" -> "en")
pub fn normalize_language(language: &str) -> &str {
    let primary = language
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or(language);
    match primary {
        "zh" => "zh",
        _ => FALLBACK_LANGUAGE,
    }
}

lazy_static! {
    static ref LOCALIZATION_MANAGER: Option<LocalizationManager> = match LocalizationManager::new() {
        Ok(manager) => Some(manager),
        Err(e) => {
            warn!(error = %e, "Failed to load translations");
            None
        }
    };
}

/// Get the global localization manager
pub fn get_localization_manager() -> Option<&'static LocalizationManager> {
    LOCALIZATION_MANAGER.as_ref()
}

/// Convenience function to get a localized message in a language
pub fn t_lang(key: &str, language: &str) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message_in_language(key, language, None),
        None => key.to_string(),
    }
}

/// Convenience function to get a localized message with arguments in a language
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language: &str) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message_with_args(key, language, args),
        None => key.to_string(),
    }
}
