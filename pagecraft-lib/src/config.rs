//! Editor configuration.
//!
//! Settings load from a TOML file as an alternative to the built-in
//! defaults; every key is optional.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Preview viewport class. Tablet and mobile scope responsive overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl Breakpoint {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "desktop" => Some(Self::Desktop),
            "tablet" => Some(Self::Tablet),
            "mobile" => Some(Self::Mobile),
            _ => None,
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Breakpoint::Desktop => "desktop",
            Breakpoint::Tablet => "tablet",
            Breakpoint::Mobile => "mobile",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of snapshots kept in history
    pub max_history: usize,
    /// Quiet period before a continuous control commits a history entry
    pub debounce_ms: u64,
    /// Delay after a document replace before affordances are reattached
    pub settle_delay_ms: u64,
    /// Attribute holding synthetic selector markers
    pub marker_attribute: String,
    /// Prefix of synthetic marker values, followed by a counter
    pub marker_prefix: String,
    /// Id of the stylesheet the rule store owns
    pub rule_sheet_id: String,
    /// Id of the stylesheet holding the selection highlight
    pub highlight_sheet_id: String,
    /// Class marking the selected element
    pub highlight_class: String,
    /// Id of the web font `<link>`, doubling as its "already loaded" marker
    pub font_link_id: String,
    /// Families requested from the font service
    pub font_families: Vec<String>,
    pub font_service_url: String,
    pub breakpoints: BreakpointConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BreakpointConfig {
    /// `max-width` threshold of the tablet media block
    pub tablet_max_width: String,
    /// `max-width` threshold of the mobile media block
    pub mobile_max_width: String,
    /// Preview viewport widths in pixels, used when resolving media queries
    pub desktop_viewport: u32,
    pub tablet_viewport: u32,
    pub mobile_viewport: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: 50,
            debounce_ms: 400,
            settle_delay_ms: 100,
            marker_attribute: "data-editor-id".to_string(),
            marker_prefix: "editor-el-".to_string(),
            rule_sheet_id: "editor-responsive-styles".to_string(),
            highlight_sheet_id: "editor-styles".to_string(),
            highlight_class: "editable-highlight".to_string(),
            font_link_id: "google-fonts".to_string(),
            font_families: [
                "Inter",
                "Roboto",
                "Montserrat",
                "Poppins",
                "Lato",
                "Open Sans",
                "Space Grotesk",
                "Work Sans",
                "DM Sans",
                "Manrope",
                "Nunito Sans",
                "IBM Plex Sans",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
            font_service_url: "https://fonts.googleapis.com/css2".to_string(),
            breakpoints: BreakpointConfig::default(),
        }
    }
}

impl Default for BreakpointConfig {
    fn default() -> Self {
        Self {
            tablet_max_width: "1024px".to_string(),
            mobile_max_width: "767px".to_string(),
            desktop_viewport: 1280,
            tablet_viewport: 768,
            mobile_viewport: 375,
        }
    }
}

impl BreakpointConfig {
    /// Media threshold for a breakpoint; desktop has none.
    pub fn max_width(&self, breakpoint: Breakpoint) -> Option<&str> {
        match breakpoint {
            Breakpoint::Desktop => None,
            Breakpoint::Tablet => Some(self.tablet_max_width.as_str()),
            Breakpoint::Mobile => Some(self.mobile_max_width.as_str()),
        }
    }

    pub fn viewport_width(&self, breakpoint: Breakpoint) -> u32 {
        match breakpoint {
            Breakpoint::Desktop => self.desktop_viewport,
            Breakpoint::Tablet => self.tablet_viewport,
            Breakpoint::Mobile => self.mobile_viewport,
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Stylesheet URL requesting every configured family at weights 400 and 700.
    pub fn font_stylesheet_url(&self) -> String {
        let families: Vec<String> = self
            .font_families
            .iter()
            .map(|f| format!("family={}:wght@400;700", f.replace(' ', "+")))
            .collect();
        format!("{}?{}&display=swap", self.font_service_url, families.join("&"))
    }
}
