use std::ffi::c_void;
use thiserror::Error;

pub struct Texture2D {
    id: u32,
    format: TextureFormats,
}

impl Texture2D {
    pub fn new<T: TexelData>(
        width: u32,
        height: u32,
        data: &[T],
        format: TextureFormats,
        filter: TextureFilter,
        wrap: TextureWrap,
    ) -> Result<Self, TextureError> {
        validate(width, height, data, format)?;

        let mut id = 0;

        unsafe {
            gl::GenTextures(1, (&mut id) as *mut u32);
            gl::BindTexture(gl::TEXTURE_2D, id);

            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap.gl_param());
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap.gl_param());
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter.gl_param());
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter.gl_param());
        }

        let texture = Self { id, format };
        texture.upload(width, height, data);

        Ok(texture)
    }

    pub fn update<T: TexelData>(
        &self,
        width: u32,
        height: u32,
        data: &[T],
    ) -> Result<(), TextureError> {
        validate(width, height, data, self.format)?;

        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.id);
        }
        self.upload(width, height, data);

        Ok(())
    }

    fn upload<T: TexelData>(&self, width: u32, height: u32, data: &[T]) {
        unsafe {
            // RGBA8 rows of odd widths are not 4-aligned in general
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);

            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                self.format.internal_format() as i32,
                width as i32,
                height as i32,
                0,
                gl::RGBA,
                self.format.component_type(),
                data.as_ptr() as *const c_void,
            );
        }
    }

    pub fn bind(&self, unit: u8) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit as u32);
            gl::BindTexture(gl::TEXTURE_2D, self.id)
        }
    }
}

impl Drop for Texture2D {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, (&self.id) as *const u32);
        }
    }
}

fn validate<T: TexelData>(
    width: u32,
    height: u32,
    data: &[T],
    format: TextureFormats,
) -> Result<(), TextureError> {
    if T::FORMAT != format {
        return Err(TextureError::FormatMismatch);
    }

    if (width as usize * height as usize * format.channels() as usize) != data.len() {
        return Err(TextureError::InvalidSrcLength);
    }

    Ok(())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("Invalid source data length")]
    InvalidSrcLength,
    #[error("Source data type does not match texture format")]
    FormatMismatch,
}

/// Component types accepted as texture source data.
pub trait TexelData: Copy {
    const FORMAT: TextureFormats;
}

impl TexelData for u8 {
    const FORMAT: TextureFormats = TextureFormats::RgbaU8;
}

impl TexelData for f32 {
    const FORMAT: TextureFormats = TextureFormats::RgbaF32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormats {
    RgbaU8,
    RgbaF32,
}

impl TextureFormats {
    pub fn channels(&self) -> u8 {
        match self {
            TextureFormats::RgbaU8 | TextureFormats::RgbaF32 => 4,
        }
    }

    fn internal_format(&self) -> u32 {
        match self {
            TextureFormats::RgbaU8 => gl::RGBA8,
            TextureFormats::RgbaF32 => gl::RGBA32F,
        }
    }

    fn component_type(&self) -> u32 {
        match self {
            TextureFormats::RgbaU8 => gl::UNSIGNED_BYTE,
            TextureFormats::RgbaF32 => gl::FLOAT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

impl TextureFilter {
    fn gl_param(&self) -> i32 {
        match self {
            TextureFilter::Nearest => gl::NEAREST as i32,
            TextureFilter::Linear => gl::LINEAR as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

impl TextureWrap {
    fn gl_param(&self) -> i32 {
        match self {
            TextureWrap::Repeat => gl::REPEAT as i32,
            TextureWrap::ClampToEdge => gl::CLAMP_TO_EDGE as i32,
            TextureWrap::MirroredRepeat => gl::MIRRORED_REPEAT as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_checked_before_upload() {
        let res = Texture2D::new(
            2,
            2,
            &[0_u8; 15],
            TextureFormats::RgbaU8,
            TextureFilter::Linear,
            TextureWrap::Repeat,
        );

        assert_eq!(res.err(), Some(TextureError::InvalidSrcLength));
    }

    #[test]
    fn data_type_must_match_format() {
        let res = Texture2D::new(
            1,
            1,
            &[0.0_f32; 4],
            TextureFormats::RgbaU8,
            TextureFilter::Nearest,
            TextureWrap::ClampToEdge,
        );

        assert_eq!(res.err(), Some(TextureError::FormatMismatch));
    }
}
