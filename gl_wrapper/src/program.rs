use std::ffi::{c_char, CString};
use std::fmt::{Display, Formatter};

use cgmath::Matrix4;
use gl::types::{GLenum, GLint, GLuint};
use thiserror::Error;

const LOG_LEN: usize = 1024;

pub struct ProgramBuilder<'a> {
    vert: &'a str,
    frag: &'a str,
}

impl<'a> ProgramBuilder<'a> {
    pub fn new(vert_src: &'a str, frag_src: &'a str) -> Self {
        Self {
            vert: vert_src,
            frag: frag_src,
        }
    }

    pub fn build(self) -> Result<Program, PBError> {
        let vert_src = CString::new(self.vert).map_err(|_| PBError::InvalidSource(Stage::Vertex))?;
        let frag_src =
            CString::new(self.frag).map_err(|_| PBError::InvalidSource(Stage::Fragment))?;

        let vert = compile(Stage::Vertex, &vert_src)?;
        let frag = match compile(Stage::Fragment, &frag_src) {
            Ok(frag) => frag,
            Err(e) => {
                unsafe { gl::DeleteShader(vert) };
                return Err(e);
            }
        };

        let mut success: i32 = 0;

        unsafe {
            let program = gl::CreateProgram();
            gl::AttachShader(program, vert);
            gl::AttachShader(program, frag);
            gl::LinkProgram(program);

            gl::DeleteShader(vert);
            gl::DeleteShader(frag);

            gl::GetProgramiv(program, gl::LINK_STATUS, (&mut success) as *mut i32);
            if success != 1 {
                let mut buf = [0_u8; LOG_LEN];

                gl::GetProgramInfoLog(
                    program,
                    LOG_LEN as i32,
                    std::ptr::null_mut(),
                    buf.as_mut_ptr() as *mut c_char,
                );
                gl::DeleteProgram(program);

                return Err(PBError::Linking(info_log(&buf)));
            }

            Ok(Program { id: program })
        }
    }
}

fn compile(stage: Stage, src: &CString) -> Result<GLuint, PBError> {
    let mut success: i32 = 0;

    unsafe {
        let shader = gl::CreateShader(stage.gl_kind());

        gl::ShaderSource(
            shader,
            1,
            (&src.as_ptr()) as *const *const c_char,
            std::ptr::null(),
        );

        gl::CompileShader(shader);
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, (&mut success) as *mut i32);
        if success != 1 {
            let mut buf = [0_u8; LOG_LEN];

            gl::GetShaderInfoLog(
                shader,
                LOG_LEN as i32,
                std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut c_char,
            );
            gl::DeleteShader(shader);

            return Err(PBError::Compilation {
                stage,
                log: info_log(&buf),
            });
        }

        Ok(shader)
    }
}

/// Driver logs are NUL terminated inside a fixed buffer.
fn info_log(buf: &[u8]) -> String {
    let data = buf.split(|a| *a == 0).next().unwrap_or(buf);

    String::from_utf8_lossy(data).trim_end().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn gl_kind(&self) -> GLenum {
        match self {
            Stage::Vertex => gl::VERTEX_SHADER,
            Stage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Vertex => write!(f, "vertex"),
            Stage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PBError {
    #[error("{stage} shader compilation failed: {log}")]
    Compilation { stage: Stage, log: String },
    #[error("program linking failed: {0}")]
    Linking(String),
    #[error("{0} shader source contains a NUL byte")]
    InvalidSource(Stage),
    #[error("uniform `{0}` not found in program")]
    MissingUniform(String),
}

pub struct Program {
    id: GLuint,
}

impl Program {
    pub fn get_id(&self) -> GLuint {
        self.id
    }

    pub fn uniform_location(&self, name: &str) -> Result<GLint, PBError> {
        let c_name = CString::new(name).map_err(|_| PBError::MissingUniform(name.to_owned()))?;

        let location = unsafe { gl::GetUniformLocation(self.id, c_name.as_ptr()) };

        if location == -1 {
            Err(PBError::MissingUniform(name.to_owned()))
        } else {
            Ok(location)
        }
    }

    pub fn set_i32(&self, location: GLint, value: i32) {
        unsafe {
            gl::UseProgram(self.id);
            gl::Uniform1i(location, value);
        }
    }

    pub fn set_mat4(&self, location: GLint, value: &Matrix4<f32>) {
        let data: &[f32; 16] = value.as_ref();

        unsafe {
            gl::UseProgram(self.id);
            gl::UniformMatrix4fv(location, 1, gl::FALSE, data.as_ptr());
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        unsafe { gl::DeleteProgram(self.id) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_log_stops_at_nul() {
        let mut buf = [0_u8; 32];
        buf[..12].copy_from_slice(b"0:1: error\n\0");

        assert_eq!(info_log(&buf), "0:1: error");
    }

    #[test]
    fn info_log_without_terminator() {
        assert_eq!(info_log(b"full"), "full");
    }

    #[test]
    fn nul_in_source_is_rejected() {
        let res = ProgramBuilder::new("#version 330 core\0", "void main() {}").build();

        assert!(matches!(res, Err(PBError::InvalidSource(Stage::Vertex))));
    }
}
