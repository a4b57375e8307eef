use std::path::Path;

use serde::Deserialize;

use crate::error::HighlightError;

/// Presentation settings for the active word. None of these change which word
/// is highlighted, only how the host styles the marker class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub background: String,
    pub color: String,
    pub border_radius_px: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            background: "#ffe066".to_string(),
            color: "inherit".to_string(),
            border_radius_px: 3.0,
        }
    }
}

impl HighlightStyle {
    /// CSS rule applying this style to `.{class}`.
    pub fn css_rule(&self, class: &str) -> String {
        format!(
            ".{class} {{ background: {}; color: {}; border-radius: {}px; }}",
            self.background, self.color, self.border_radius_px
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Voice model requested from the synthesis backend.
    pub character: String,
    /// Playback speed multiplier sent with every request.
    pub speed: f32,
    pub auto_scroll: bool,
    /// Distance from a viewport edge inside which the active word is scrolled into view.
    pub scroll_margin_px: f64,
    /// Class carried by every word wrapper.
    pub word_class: String,
    /// Class toggled on the wrapper of the word currently spoken.
    pub active_class: String,
    /// Number of unconsumed timing hints searched per word.
    pub match_window: usize,
    pub style: HighlightStyle,
}

impl ReaderConfig {
    pub const DEFAULT_MATCH_WINDOW: usize = 3;
    pub const DEFAULT_SCROLL_MARGIN_PX: f64 = 100.0;
    pub const DEFAULT_WORD_CLASS: &'static str = "readalong-word";
    pub const DEFAULT_ACTIVE_CLASS: &'static str = "readalong-active";

    pub fn load(path: &Path) -> Result<Self, HighlightError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| HighlightError::io("read reader config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| HighlightError::json("parse reader config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HighlightError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(HighlightError::invalid_input(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        if self.word_class.trim().is_empty() || self.active_class.trim().is_empty() {
            return Err(HighlightError::invalid_input(
                "word_class and active_class must not be empty",
            ));
        }
        if self.word_class == self.active_class {
            return Err(HighlightError::invalid_input(
                "word_class and active_class must differ",
            ));
        }
        Ok(())
    }

    /// Window actually used by the aligner; a zero window would never match.
    pub(crate) fn effective_match_window(&self) -> usize {
        self.match_window.max(1)
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            character: String::new(),
            speed: 1.0,
            auto_scroll: true,
            scroll_margin_px: Self::DEFAULT_SCROLL_MARGIN_PX,
            word_class: Self::DEFAULT_WORD_CLASS.to_string(),
            active_class: Self::DEFAULT_ACTIVE_CLASS.to_string(),
            match_window: Self::DEFAULT_MATCH_WINDOW,
            style: HighlightStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_config_default() {
        let config = ReaderConfig::default();
        assert!(config.character.is_empty());
        assert_eq!(config.speed, 1.0);
        assert!(config.auto_scroll);
        assert_eq!(config.match_window, 3);
        assert_eq!(config.word_class, "readalong-word");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "character": "reddrumm", "auto_scroll": false }"#;
        let config: ReaderConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.character, "reddrumm");
        assert!(!config.auto_scroll);
        assert_eq!(config.match_window, ReaderConfig::DEFAULT_MATCH_WINDOW);
        assert_eq!(config.style, HighlightStyle::default());
    }

    #[test]
    fn zero_window_is_clamped() {
        let config = ReaderConfig {
            match_window: 0,
            ..ReaderConfig::default()
        };
        assert_eq!(config.effective_match_window(), 1);
    }

    #[test]
    fn validate_rejects_bad_speed_and_classes() {
        let config = ReaderConfig {
            speed: 0.0,
            ..ReaderConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ReaderConfig {
            active_class: ReaderConfig::DEFAULT_WORD_CLASS.to_string(),
            ..ReaderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let path = std::env::temp_dir().join("readalong_rs_config_load.json");
        std::fs::write(&path, r#"{ "speed": 1.25, "match_window": 5 }"#).expect("write config");
        let config = ReaderConfig::load(&path).expect("load should succeed");
        assert_eq!(config.speed, 1.25);
        assert_eq!(config.match_window, 5);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_fails_on_missing_file() {
        assert!(ReaderConfig::load(Path::new("/nonexistent/readalong.json")).is_err());
    }

    #[test]
    fn css_rule_uses_class() {
        let rule = HighlightStyle::default().css_rule("readalong-active");
        assert!(rule.starts_with(".readalong-active {"));
        assert!(rule.contains("#ffe066"));
    }
}
