use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileIcon {
    #[default]
    Default,
    Circle,
    Cog,
}

/// Settings-page state persisted per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub language: String,
    pub show_notifications: bool,
    pub email_notifications: bool,
    pub share_usage_data: bool,
    pub profile_icon: ProfileIcon,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            language: "english".to_string(),
            show_notifications: true,
            email_notifications: true,
            share_usage_data: true,
            profile_icon: ProfileIcon::Default,
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    pub theme: Option<Theme>,
    pub language: Option<String>,
    pub show_notifications: Option<bool>,
    pub email_notifications: Option<bool>,
    pub share_usage_data: Option<bool>,
    pub profile_icon: Option<ProfileIcon>,
}

impl Preferences {
    /// Reads stored JSON leniently: unknown or malformed fields fall back to defaults.
    pub fn from_stored(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn apply(&mut self, patch: PreferencesPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(language) = patch.language {
            let language = language.trim().to_lowercase();
            if !language.is_empty() {
                self.language = language;
            }
        }
        if let Some(v) = patch.show_notifications {
            self.show_notifications = v;
        }
        if let Some(v) = patch.email_notifications {
            self.email_notifications = v;
        }
        if let Some(v) = patch.share_usage_data {
            self.share_usage_data = v;
        }
        if let Some(icon) = patch.profile_icon {
            self.profile_icon = icon;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_stored_fills_missing_fields() {
        let prefs = Preferences::from_stored(&json!({ "theme": "dark" }));
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.language, "english");
        assert!(prefs.email_notifications);
    }

    #[test]
    fn test_from_stored_survives_garbage() {
        let prefs = Preferences::from_stored(&json!({ "theme": "neon" }));
        assert_eq!(prefs, Preferences::default());
        assert_eq!(Preferences::from_stored(&Value::Null), Preferences::default());
    }

    #[test]
    fn test_apply_merges_only_present_fields() {
        let mut prefs = Preferences::default();
        prefs.apply(PreferencesPatch {
            theme: Some(Theme::Light),
            email_notifications: Some(false),
            language: Some("  Spanish ".to_string()),
            ..Default::default()
        });
        assert_eq!(prefs.theme, Theme::Light);
        assert!(!prefs.email_notifications);
        assert!(prefs.show_notifications);
        assert_eq!(prefs.language, "spanish");
        assert_eq!(prefs.profile_icon, ProfileIcon::Default);
    }
}
