//! Viewer settings and preferences
//!
//! Persisted in LocalStorage on the web; read from the JSON file named by
//! `ORRERY_SETTINGS` on native.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Fraction of each layer's tuned particle count to simulate
    pub fn particle_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }
}

/// Viewer preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Background particle layers
    pub particles: bool,
    /// Slow opacity/size oscillation of particle layers
    pub breathing: bool,
    /// Camera shake while cruising
    pub camera_shake: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no breathing)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            breathing: true,
            camera_shake: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops the cosmetic modulation
        if preset == QualityPreset::Low {
            self.breathing = false;
        }
    }

    /// Effective camera shake (respects reduced_motion)
    pub fn effective_camera_shake(&self) -> bool {
        self.camera_shake && !self.reduced_motion
    }

    /// Effective breathing (respects reduced_motion)
    pub fn effective_breathing(&self) -> bool {
        self.breathing && !self.reduced_motion
    }

    /// Particle count to simulate for a layer tuned at `tuned`
    pub fn particle_count(&self, tuned: usize) -> usize {
        if !self.particles {
            0
        } else {
            (tuned as f32 * self.quality.particle_scale()).round() as usize
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "orrery_settings";

    /// Environment variable naming a settings file (native only)
    #[allow(dead_code)]
    const SETTINGS_ENV: &'static str = "ORRERY_SETTINGS";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(err) => log::warn!("Ignoring stored settings: {err}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from the file named by `ORRERY_SETTINGS`, if any
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::SETTINGS_ENV) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {path}");
                    settings
                }
                Err(err) => {
                    log::warn!("Ignoring settings file {path}: {err}");
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Cannot read settings file {path}: {err}");
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::parse("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::Low.as_str(), "Low");
    }

    #[test]
    fn test_particle_count_scaling() {
        let settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.particle_count(800), 800);
        let settings = Settings::from_preset(QualityPreset::Low);
        assert_eq!(settings.particle_count(800), 200);
        assert!(!settings.breathing);

        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        assert_eq!(settings.particle_count(800), 0);
    }

    #[test]
    fn test_reduced_motion_overrides() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_camera_shake());
        assert!(!settings.effective_breathing());
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(r#"{ "quality": "High" }"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(settings.particles);
        assert!(Settings::from_json("{ not json").is_err());
    }
}
