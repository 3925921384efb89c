use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use gl_wrapper::texture::{TextureFilter, TextureWrap};

use crate::fit::FitMode;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub assets: AssetConfig,
    pub playback: PlaybackConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Audio-Video FX".to_owned(),
            width: 1000,
            height: 800,
            min_width: 640,
            min_height: 480,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub clear_color: [f32; 3],
    pub filter: FilterSetting,
    pub wrap: WrapSetting,
    pub fit: FitMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.5, 0.0, 0.0],
            filter: FilterSetting::Linear,
            wrap: WrapSetting::Repeat,
            fit: FitMode::Stretch,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterSetting {
    Nearest,
    Linear,
}

impl From<FilterSetting> for TextureFilter {
    fn from(f: FilterSetting) -> Self {
        match f {
            FilterSetting::Nearest => Self::Nearest,
            FilterSetting::Linear => Self::Linear,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WrapSetting {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

impl From<WrapSetting> for TextureWrap {
    fn from(w: WrapSetting) -> Self {
        match w {
            WrapSetting::Repeat => Self::Repeat,
            WrapSetting::ClampToEdge => Self::ClampToEdge,
            WrapSetting::MirroredRepeat => Self::MirroredRepeat,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// A PNG file or a directory of PNG frames.
    pub texture: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("shaders/basic.vert"),
            fragment_shader: PathBuf::from("shaders/basic.frag"),
            texture: PathBuf::from("samples/testcard.png"),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    pub fps: f64,
    pub looping: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 24.0,
            looping: true,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InputError(path.to_owned(), e))?;

        Self::from_toml(&src)
    }

    pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(src).map_err(ConfigError::FormatError)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".to_owned()));
        }

        if !(self.playback.fps.is_finite() && self.playback.fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "playback fps must be positive, got {}",
                self.playback.fps
            )));
        }

        if self.render.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(
                "clear_color components must lie in [0, 1]".to_owned(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {0:?}: {1}")]
    InputError(PathBuf, #[source] std::io::Error),
    #[error("invalid config structure: {0}")]
    FormatError(#[source] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.window.title, "Audio-Video FX");
        assert_eq!(config.assets.texture, PathBuf::from("samples/testcard.png"));
    }

    #[test]
    fn bundled_config_matches_defaults() {
        let config =
            Config::load_from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/avfx.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_sections() {
        let config = Config::from_toml(
            r#"
            [window]
            width = 1280

            [render]
            filter = "nearest"
            wrap = "clamp_to_edge"
            fit = "contain"

            [playback]
            fps = 30.0
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.render.filter, FilterSetting::Nearest);
        assert_eq!(config.render.wrap, WrapSetting::ClampToEdge);
        assert_eq!(config.render.fit, FitMode::Contain);
        assert_eq!(config.playback.fps, 30.0);
        assert!(config.playback.looping);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml("[window]\nfullscreen = true\n").unwrap_err();

        assert!(matches!(err, ConfigError::FormatError(_)));
    }

    #[test]
    fn fps_must_be_positive() {
        let err = Config::from_toml("[playback]\nfps = 0.0\n").unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn clear_color_range() {
        let err = Config::from_toml("[render]\nclear_color = [2.0, 0.0, 0.0]\n").unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avfx.toml");
        std::fs::write(&path, "[assets]\ntexture = \"frames\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();

        assert_eq!(config.assets.texture, PathBuf::from("frames"));
        assert!(matches!(
            Config::load_from_path(dir.path().join("missing.toml")),
            Err(ConfigError::InputError(..))
        ));
    }
}
