use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use png::{ColorType, Transformations};
use thiserror::Error;

/// Tightly packed RGBA8 pixels, bottom row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ImageError::NotFound(path.to_owned()),
            _ => ImageError::Io(path.to_owned(), e),
        })?;

        Self::decode(BufReader::new(file)).map_err(|e| match e {
            ImageError::Decode(_, inner) => ImageError::Decode(path.to_owned(), inner),
            other => other,
        })
    }

    pub fn decode<R: Read>(reader: R) -> Result<Self, ImageError> {
        let mut decoder = png::Decoder::new(reader);
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

        let mut reader = decoder
            .read_info()
            .map_err(|e| ImageError::Decode(PathBuf::new(), e))?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| ImageError::Decode(PathBuf::new(), e))?;

        let rows = buf.chunks(info.line_size).take(info.height as usize);

        Ok(Self {
            width: info.width,
            height: info.height,
            data: to_rgba_flipped(rows, info.color_type, info.width as usize)?,
        })
    }

    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        if width as usize * height as usize * 4 != data.len() {
            return Err(ImageError::InvalidLength {
                width,
                height,
                len: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Test card used when no texture can be read.
    pub fn checkerboard(width: u32, height: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);

        for y in 0..height {
            for x in 0..width {
                let v = if (x / cell + y / cell) % 2 == 0 { 0xe0 } else { 0x20 };
                data.extend_from_slice(&[v, v, v, 0xff]);
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)` with `y` counted from the bottom.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[i..i + 4]);
        Some(px)
    }
}

/// Expand 8-bit rows to RGBA and reverse their order.
pub fn to_rgba_flipped<'a, I>(rows: I, color: ColorType, width: usize) -> Result<Vec<u8>, ImageError>
where
    I: DoubleEndedIterator<Item = &'a [u8]>,
{
    let mut out = Vec::new();

    for row in rows.rev() {
        match color {
            ColorType::Rgba => out.extend_from_slice(&row[..width * 4]),
            ColorType::Rgb => {
                for px in row[..width * 3].chunks_exact(3) {
                    out.extend_from_slice(&[px[0], px[1], px[2], 0xff]);
                }
            }
            ColorType::GrayscaleAlpha => {
                for px in row[..width * 2].chunks_exact(2) {
                    out.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
                }
            }
            ColorType::Grayscale => {
                for v in &row[..width] {
                    out.extend_from_slice(&[*v, *v, *v, 0xff]);
                }
            }
            ColorType::Indexed => return Err(ImageError::UnsupportedColor(color)),
        }
    }

    Ok(out)
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("texture file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("could not read {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("could not decode PNG {0:?}: {1}")]
    Decode(PathBuf, #[source] png::DecodingError),
    #[error("unsupported color type {0:?} after expansion")]
    UnsupportedColor(ColorType),
    #[error("{len} bytes do not form a {width}x{height} RGBA image")]
    InvalidLength { width: u32, height: u32, len: usize },
}
