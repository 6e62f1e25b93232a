//! Rendering module
//!
//! The foreground layer is drawn in software (`canvas`, `pipeline`); the
//! background and every full-screen effect run as WebGPU passes (`post`,
//! `present`).

pub mod canvas;
pub mod font;
pub mod pipeline;
pub mod post;
pub mod present;

pub use canvas::{Canvas, Color, SpriteDraw};
pub use pipeline::{Compositor, Frame};
pub use post::PostGlobals;
pub use present::{PresentError, Presenter};
