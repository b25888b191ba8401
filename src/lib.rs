//! Slide Overlay - viewport-synchronized vector annotations
//!
//! A vector overlay for deep-zoom image viewers. Shapes live in image (world)
//! space and stay registered to the image under any pan, zoom, rotation or
//! flip, while strokes, handles and labels keep a constant size on screen.
//! The host viewport is reached only through [`ViewportHost`].

pub mod anchor;
pub mod config;
pub mod constants;
pub mod context;
pub mod engine;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod keybindings;
pub mod label;
pub mod measure;
pub mod model;
pub mod scene;
pub mod store;
pub mod undo;
pub mod viewport;

pub use config::{LogLevel, OverlayConfig, StyleDefaults};
pub use engine::{OverlayEngine, PointerEvent, PointerKind, PointerResponse, SessionState};
pub use error::{AttrError, ConfigError};
pub use geometry::{Point, Size};
pub use keybindings::Key;
pub use label::LabelOptions;
pub use model::{DrawMode, Geometry, ShapeAttr, ShapeKind};
pub use scene::Scene;
pub use viewport::{FrameSync, SimpleViewport, ViewportFrame, ViewportHost};
