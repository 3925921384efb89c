use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use avfx::config::Config;
use avfx::fit::FitMode;

#[derive(Debug, Parser)]
#[command(name = "avfx", about = "Show an image or PNG sequence on a textured quad")]
pub struct Args {
    /// TOML file with window, render, asset and playback settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// PNG file or directory of PNG frames to display
    #[arg(short, long)]
    pub texture: Option<PathBuf>,
    /// Vertex shader source
    #[arg(long)]
    pub vertex_shader: Option<PathBuf>,
    /// Fragment shader source
    #[arg(long)]
    pub fragment_shader: Option<PathBuf>,
    /// Initial window width
    #[arg(long)]
    pub width: Option<u32>,
    /// Initial window height
    #[arg(long)]
    pub height: Option<u32>,
    /// Playback rate of frame sequences
    #[arg(long)]
    pub fps: Option<f64>,
    /// How the image is fitted into the window
    #[arg(long, value_enum)]
    pub fit: Option<FitArg>,
}

impl Args {
    /// Command line values take precedence over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(t) = &self.texture {
            config.assets.texture = t.clone();
        }
        if let Some(v) = &self.vertex_shader {
            config.assets.vertex_shader = v.clone();
        }
        if let Some(f) = &self.fragment_shader {
            config.assets.fragment_shader = f.clone();
        }
        if let Some(w) = self.width {
            config.window.width = w;
        }
        if let Some(h) = self.height {
            config.window.height = h;
        }
        if let Some(fps) = self.fps {
            config.playback.fps = fps;
        }
        if let Some(fit) = self.fit {
            config.render.fit = fit.into();
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum FitArg {
    Stretch,
    Contain,
}

impl From<FitArg> for FitMode {
    fn from(f: FitArg) -> Self {
        match f {
            FitArg::Stretch => Self::Stretch,
            FitArg::Contain => Self::Contain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_config() {
        let args = Args::parse_from([
            "avfx",
            "--texture",
            "frames/",
            "--width",
            "320",
            "--fit",
            "contain",
        ]);
        let mut config = Config::default();

        args.apply(&mut config);

        assert_eq!(config.assets.texture, PathBuf::from("frames/"));
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.render.fit, FitMode::Contain);
    }

    #[test]
    fn no_args_keep_config() {
        let args = Args::parse_from(["avfx"]);
        let mut config = Config::default();

        args.apply(&mut config);

        assert_eq!(config, Config::default());
    }
}
