//! WebGPU rendering module
//!
//! Uses SDF (Signed Distance Fields) for all rendering in the fragment shader.

pub mod pipeline;

pub use pipeline::RenderState;
