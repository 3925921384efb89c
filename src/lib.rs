pub mod config;
pub mod fit;
pub mod image;
pub mod playback;
pub mod quad;
pub mod sequence;
pub mod shader_source;
