use std::ffi::c_void;
use thiserror::Error;

pub struct GeometryBuilder<'a> {
    attributes: Vec<VertexAttribute>,
    data: &'a [f32],
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(data: &'a [f32]) -> Self {
        Self {
            data,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attr: VertexAttribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn layout(&self) -> Result<VertexLayout, GBError> {
        VertexLayout::new(&self.attributes, self.data.len())
    }

    pub fn build(self) -> Result<Geometry, GBError> {
        let layout = self.layout()?;

        let mut vao = 0;
        let mut vbo = 0;

        unsafe {
            gl::GenVertexArrays(1, (&mut vao) as *mut u32);
            gl::GenBuffers(1, (&mut vbo) as *mut u32);

            gl::BindVertexArray(vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);

            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(self.data) as isize,
                self.data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );

            for (i, (attr, offset)) in self.attributes.iter().zip(&layout.offsets).enumerate() {
                gl::VertexAttribPointer(
                    i as u32,
                    attr.size() as i32,
                    gl::FLOAT,
                    gl::FALSE,
                    layout.stride as i32,
                    *offset as *const c_void,
                );
                gl::EnableVertexAttribArray(i as u32);
            }

            gl::BindVertexArray(0);
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }

        log::debug!(
            "uploaded {} vertices, stride {} bytes",
            layout.vertices,
            layout.stride
        );

        Ok(Geometry {
            vao,
            vbo,
            vertices: layout.vertices,
        })
    }
}

/// Interleaved layout of a vertex buffer, all sizes in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub offsets: Vec<usize>,
    pub vertices: usize,
}

impl VertexLayout {
    pub fn new(attributes: &[VertexAttribute], floats: usize) -> Result<Self, GBError> {
        let width: usize = attributes.iter().map(|a| a.size()).sum();

        if width == 0 {
            return Err(GBError::NoAttributes);
        }

        if floats % width != 0 {
            return Err(GBError::InvalidDataLength);
        }

        let float_size = std::mem::size_of::<f32>();

        let offsets = attributes
            .iter()
            .scan(0, |acc, attr| {
                let offset = *acc;
                *acc += attr.size() * float_size;
                Some(offset)
            })
            .collect();

        Ok(Self {
            stride: width * float_size,
            offsets,
            vertices: floats / width,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GBError {
    #[error("Invalid data length for given attributes")]
    InvalidDataLength,
    #[error("Geometry needs at least one vertex attribute")]
    NoAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttribute {
    Float,
    Vec2,
    Vec3,
}

impl VertexAttribute {
    pub fn size(&self) -> usize {
        match self {
            VertexAttribute::Float => 1,
            VertexAttribute::Vec2 => 2,
            VertexAttribute::Vec3 => 3,
        }
    }
}

pub struct Geometry {
    vao: u32,
    vbo: u32,
    vertices: usize,
}

impl Geometry {
    pub fn vao(&self) -> u32 {
        self.vao
    }
    pub fn vertices(&self) -> usize {
        self.vertices
    }
}

impl Drop for Geometry {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, (&self.vbo) as *const u32);
            gl::DeleteVertexArrays(1, (&self.vao) as *const u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_and_uv_layout() {
        let layout =
            VertexLayout::new(&[VertexAttribute::Vec3, VertexAttribute::Vec2], 30).unwrap();

        assert_eq!(layout.stride, 20);
        assert_eq!(layout.offsets, vec![0, 12]);
        assert_eq!(layout.vertices, 6);
    }

    #[test]
    fn rejects_partial_vertex() {
        let res = VertexLayout::new(&[VertexAttribute::Vec3, VertexAttribute::Vec2], 29);
        assert_eq!(res, Err(GBError::InvalidDataLength));
    }

    #[test]
    fn rejects_missing_attributes() {
        let data = [0.0; 12];
        let res = GeometryBuilder::new(&data).layout();
        assert_eq!(res, Err(GBError::NoAttributes));
    }
}
