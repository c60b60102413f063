//! Colour theme preference: `auto`, `light` or `dark`.
//!
//! `auto` is the absence of a preference: nothing is stored and the root
//! element carries no `data-theme` attribute, leaving the choice to
//! `prefers-color-scheme`.

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Root element attribute that carries an explicit theme.
pub const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Self; 3] = [Self::Auto, Self::Light, Self::Dark];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|theme| theme.as_str() == raw)
    }

    /// Next theme in toggle order.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Auto => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::Auto,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistent key-value slot for the preference (`localStorage` on the web).
pub trait ThemeStore {
    fn load(&self) -> Result<Option<String>>;
    fn store(&mut self, value: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// What the host must do to the root element after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeApplication {
    /// Theme that was requested.
    pub theme: Theme,
    /// Preference as storage reports it after the write.
    pub effective: Theme,
    /// `Some` sets `data-theme`, `None` removes it.
    pub attribute: Option<Theme>,
    /// Whether the preference reached storage.
    pub persisted: bool,
}

impl ThemeApplication {
    /// Text for the toggle button.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.effective.as_str()
    }
}

pub struct ThemePreference<S> {
    store: S,
}

impl<S: ThemeStore> ThemePreference<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored preference, if readable and recognised.
    #[must_use]
    pub fn stored(&self) -> Option<Theme> {
        match self.store.load() {
            Ok(Some(raw)) => Theme::parse(&raw),
            Ok(None) => None,
            Err(error) => {
                warn!(target: "blobmark::theme", %error, "theme storage unreadable");
                None
            }
        }
    }

    #[must_use]
    pub fn current(&self) -> Theme {
        self.stored().unwrap_or_default()
    }

    /// Attribute to apply before first paint.
    #[must_use]
    pub fn initial_attribute(&self) -> Option<Theme> {
        self.stored().filter(|theme| *theme != Theme::Auto)
    }

    /// Persist `theme` and report the attribute change. A storage failure
    /// does not prevent applying an explicit theme for this page view.
    pub fn set(&mut self, theme: Theme) -> ThemeApplication {
        let outcome = match theme {
            Theme::Auto => self.store.clear(),
            Theme::Light | Theme::Dark => self.store.store(theme.as_str()),
        };
        let persisted = match outcome {
            Ok(()) => true,
            Err(error) => {
                warn!(target: "blobmark::theme", %theme, %error, "theme not persisted");
                false
            }
        };
        let attribute = (theme != Theme::Auto).then_some(theme);
        debug!(target: "blobmark::theme", %theme, persisted, "theme applied");
        ThemeApplication {
            theme,
            effective: self.current(),
            attribute,
            persisted,
        }
    }

    pub fn cycle(&mut self) -> ThemeApplication {
        let next = self.current().next();
        self.set(next)
    }
}
