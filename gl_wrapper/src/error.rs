use std::fmt::{Display, Formatter};

use gl::types::GLenum;
use thiserror::Error;

/// Every error code pending in the context, oldest first.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("OpenGL error: {}", .0.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", "))]
pub struct GlError(pub Vec<ErrorCode>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    StackOverflow,
    StackUnderflow,
    OutOfMemory,
    Unknown(GLenum),
}

impl From<GLenum> for ErrorCode {
    fn from(code: GLenum) -> Self {
        match code {
            gl::INVALID_ENUM => Self::InvalidEnum,
            gl::INVALID_VALUE => Self::InvalidValue,
            gl::INVALID_OPERATION => Self::InvalidOperation,
            gl::INVALID_FRAMEBUFFER_OPERATION => Self::InvalidFramebufferOperation,
            gl::STACK_OVERFLOW => Self::StackOverflow,
            gl::STACK_UNDERFLOW => Self::StackUnderflow,
            gl::OUT_OF_MEMORY => Self::OutOfMemory,
            code => Self::Unknown(code),
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidEnum => write!(f, "GL_INVALID_ENUM"),
            ErrorCode::InvalidValue => write!(f, "GL_INVALID_VALUE"),
            ErrorCode::InvalidOperation => write!(f, "GL_INVALID_OPERATION"),
            ErrorCode::InvalidFramebufferOperation => {
                write!(f, "GL_INVALID_FRAMEBUFFER_OPERATION")
            }
            ErrorCode::StackOverflow => write!(f, "GL_STACK_OVERFLOW"),
            ErrorCode::StackUnderflow => write!(f, "GL_STACK_UNDERFLOW"),
            ErrorCode::OutOfMemory => write!(f, "GL_OUT_OF_MEMORY"),
            ErrorCode::Unknown(code) => write!(f, "unknown, code {code:#x}"),
        }
    }
}

/// Drain the error queue of the current context.
pub fn check_error() -> Result<(), GlError> {
    let mut codes = Vec::new();

    loop {
        let code = unsafe { gl::GetError() };
        if code == gl::NO_ERROR {
            break;
        }

        codes.push(ErrorCode::from(code));

        // a lost context reports forever
        if codes.len() >= 16 {
            break;
        }
    }

    if codes.is_empty() {
        Ok(())
    } else {
        Err(GlError(codes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_named() {
        assert_eq!(ErrorCode::from(gl::INVALID_VALUE), ErrorCode::InvalidValue);
        assert_eq!(ErrorCode::from(0x1234), ErrorCode::Unknown(0x1234));
    }

    #[test]
    fn error_lists_every_code() {
        let err = GlError(vec![ErrorCode::InvalidEnum, ErrorCode::OutOfMemory]);

        assert_eq!(
            err.to_string(),
            "OpenGL error: GL_INVALID_ENUM, GL_OUT_OF_MEMORY"
        );
    }
}
