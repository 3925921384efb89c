use cgmath::{Matrix4, SquareMatrix};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the whole window, ignoring the image aspect ratio.
    #[default]
    Stretch,
    /// Largest size that keeps the aspect ratio, bars on the sides.
    Contain,
}

impl FitMode {
    pub fn toggled(self) -> Self {
        match self {
            FitMode::Stretch => FitMode::Contain,
            FitMode::Contain => FitMode::Stretch,
        }
    }

    pub fn transform(self, window: (u32, u32), image: (u32, u32)) -> Matrix4<f32> {
        let (sx, sy) = self.scale(window, image);

        Matrix4::from_nonuniform_scale(sx, sy, 1.0)
    }

    fn scale(self, (ww, wh): (u32, u32), (iw, ih): (u32, u32)) -> (f32, f32) {
        if self == FitMode::Stretch || ww == 0 || wh == 0 || iw == 0 || ih == 0 {
            return (1.0, 1.0);
        }

        let window_aspect = ww as f32 / wh as f32;
        let image_aspect = iw as f32 / ih as f32;

        if window_aspect > image_aspect {
            (image_aspect / window_aspect, 1.0)
        } else {
            (1.0, window_aspect / image_aspect)
        }
    }
}

/// Identity, for callers that have no image yet.
pub fn identity() -> Matrix4<f32> {
    Matrix4::identity()
}
