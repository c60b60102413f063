//! Page integration settings.
//!
//! Hosts pass an optional JSON object (camelCase keys); every key is optional
//! and unknown keys are rejected so typos surface at startup.

use serde::{Deserialize, Serialize};

use crate::error::{BlobmarkError, Result};

/// Block alignment used when scrolling the selected line into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollBlock {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

impl ScrollBlock {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
            Self::Nearest => "nearest",
        }
    }
}

/// What happens to an in-progress drag when the page loses focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusLossPolicy {
    /// Commit the last rendered range as if the button had been released.
    #[default]
    Release,
    /// Keep dragging until a release is observed anywhere in the document.
    CarryOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct BlobmarkConfig {
    pub blob_selector: String,
    pub gutter_selector: String,
    pub content_selector: String,
    /// Element inside the content cell whose top-left is the overlay origin.
    pub content_origin_selector: String,
    pub highlight_class: String,
    pub overlay_class: String,
    pub scroll_block: ScrollBlock,
    pub focus_loss: FocusLossPolicy,
    pub theme_key: String,
    pub theme_toggle_id: String,
    pub age_refresh: bool,
}

impl Default for BlobmarkConfig {
    fn default() -> Self {
        Self {
            blob_selector: "table.blob".to_owned(),
            gutter_selector: "td.linenumbers".to_owned(),
            content_selector: "td.lines".to_owned(),
            content_origin_selector: "pre".to_owned(),
            highlight_class: "line-hl".to_owned(),
            overlay_class: "line-highlight-overlay".to_owned(),
            scroll_block: ScrollBlock::Center,
            focus_loss: FocusLossPolicy::Release,
            theme_key: "cgit-theme".to_owned(),
            theme_toggle_id: "theme-toggle".to_owned(),
            age_refresh: true,
        }
    }
}

impl BlobmarkConfig {
    /// Parse and validate a JSON config object.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse an optional JSON config; `None` or a blank string yields defaults.
    pub fn from_optional_json(json: Option<&str>) -> Result<Self> {
        match json.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(json) => Self::from_json(json),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("blobSelector", &self.blob_selector),
            ("gutterSelector", &self.gutter_selector),
            ("contentSelector", &self.content_selector),
            ("contentOriginSelector", &self.content_origin_selector),
            ("themeKey", &self.theme_key),
            ("themeToggleId", &self.theme_toggle_id),
        ] {
            if value.trim().is_empty() {
                return Err(BlobmarkError::InvalidConfig {
                    field,
                    reason: "must not be empty".to_owned(),
                });
            }
        }
        for (field, value) in [
            ("highlightClass", &self.highlight_class),
            ("overlayClass", &self.overlay_class),
        ] {
            validate_class_name(field, value)?;
        }
        Ok(())
    }
}

fn validate_class_name(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(BlobmarkError::InvalidConfig {
            field,
            reason: "must not be empty".to_owned(),
        });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(BlobmarkError::InvalidConfig {
            field,
            reason: format!("`{value}` is not a single class name"),
        });
    }
    if !is_css_identifier(value) {
        return Err(BlobmarkError::InvalidConfig {
            field,
            reason: format!("`{value}` is not a CSS identifier"),
        });
    }
    Ok(())
}

/// Unescaped CSS identifier: name characters only, no leading digit and no
/// digit right after a leading hyphen.
fn is_css_identifier(value: &str) -> bool {
    let is_name_char =
        |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii();
    if !value.chars().all(is_name_char) {
        return false;
    }
    let mut chars = value.chars();
    match chars.next() {
        Some('-') => chars.next().is_some_and(|c| !c.is_ascii_digit()),
        Some(first) => !first.is_ascii_digit(),
        None => false,
    }
}
