// Hideout Settings Engine
// Manages user settings in memory: search engine and zoom, validated updates, reset.
// Persistence goes through the persistence port like every other durable state.

use crate::types::errors::SettingsError;
use crate::types::settings::{SearchEngine, Settings, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};

/// Zoom change applied by a single zoom in/out step.
pub const ZOOM_STEP: f64 = 0.1;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn get_settings(&self) -> &Settings;
    fn set_search_engine(&mut self, engine: SearchEngine);
    fn set_zoom(&mut self, zoom: f64) -> Result<(), SettingsError>;
    fn zoom_in(&mut self) -> f64;
    fn zoom_out(&mut self) -> f64;
    fn reset_zoom(&mut self);
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self);
}

/// Settings engine holding the current settings.
pub struct SettingsEngine {
    settings: Settings,
}

impl SettingsEngine {
    /// Creates an engine from previously stored settings, repairing an
    /// out-of-range zoom.
    pub fn new(settings: Settings) -> Self {
        let mut settings = settings;
        if !Self::zoom_in_range(settings.zoom) {
            settings.zoom = DEFAULT_ZOOM;
        }
        Self { settings }
    }

    fn zoom_in_range(zoom: f64) -> bool {
        zoom.is_finite() && (MIN_ZOOM..=MAX_ZOOM).contains(&zoom)
    }

    /// Rounds to two decimals so repeated steps do not accumulate float noise.
    fn round_zoom(zoom: f64) -> f64 {
        (zoom * 100.0).round() / 100.0
    }
}

impl Default for SettingsEngine {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    fn get_settings(&self) -> &Settings {
        &self.settings
    }

    fn set_search_engine(&mut self, engine: SearchEngine) {
        self.settings.search_engine = engine;
    }

    /// Sets the zoom factor; values outside [0.5, 2.0] are rejected.
    fn set_zoom(&mut self, zoom: f64) -> Result<(), SettingsError> {
        if !Self::zoom_in_range(zoom) {
            return Err(SettingsError::InvalidValue(format!(
                "zoom must be between {} and {}, got {}",
                MIN_ZOOM, MAX_ZOOM, zoom
            )));
        }
        self.settings.zoom = zoom;
        Ok(())
    }

    fn zoom_in(&mut self) -> f64 {
        self.settings.zoom = Self::round_zoom(self.settings.zoom + ZOOM_STEP).min(MAX_ZOOM);
        self.settings.zoom
    }

    fn zoom_out(&mut self) -> f64 {
        self.settings.zoom = Self::round_zoom(self.settings.zoom - ZOOM_STEP).max(MIN_ZOOM);
        self.settings.zoom
    }

    fn reset_zoom(&mut self) {
        self.settings.zoom = DEFAULT_ZOOM;
    }

    /// Updates a single setting by its serialized key (`searchEngine`, `zoom`).
    ///
    /// Converts the current settings to a `serde_json::Value`, replaces the key,
    /// then deserializes back into `Settings` so type errors surface as
    /// `InvalidValue`.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings)
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )));
            }
        }

        let new_settings: Settings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        if !Self::zoom_in_range(new_settings.zoom) {
            return Err(SettingsError::InvalidValue(format!(
                "zoom must be between {} and {}",
                MIN_ZOOM, MAX_ZOOM
            )));
        }

        self.settings = new_settings;
        Ok(())
    }

    fn reset(&mut self) {
        self.settings = Settings::default();
    }
}
