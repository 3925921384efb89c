use crate::geometry::Geometry;
use crate::program::Program;
use crate::texture::Texture2D;

/// Issues draw calls, remembering bound state to skip redundant binds.
pub struct GlRenderer {
    current_program: u32,
    current_vao: u32,
    viewport: (u32, u32),
}

impl GlRenderer {
    pub fn new() -> Self {
        Self {
            current_program: 0,
            current_vao: 0,
            viewport: (0, 0),
        }
    }

    /// Draw all vertices of `geometry` as triangles, sampling `texture` on unit 0.
    pub fn draw_textured(&mut self, geometry: &Geometry, program: &Program, texture: &Texture2D) {
        texture.bind(0);
        self.draw(geometry, program);
    }

    pub fn draw(&mut self, geometry: &Geometry, program: &Program) {
        let p_id = program.get_id();
        if self.current_program != p_id {
            unsafe { gl::UseProgram(p_id) }
            self.current_program = p_id;
        }

        let vao = geometry.vao();
        if self.current_vao != vao {
            unsafe { gl::BindVertexArray(vao) }
            self.current_vao = vao;
        }

        unsafe {
            gl::DrawArrays(gl::TRIANGLES, 0, geometry.vertices() as i32);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);

        unsafe {
            gl::Viewport(0, 0, width as i32, height as i32);
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn clear(&self, [r, g, b]: [f32; 3]) {
        unsafe {
            gl::ClearColor(r, g, b, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }
}

impl Default for GlRenderer {
    fn default() -> Self {
        Self::new()
    }
}
