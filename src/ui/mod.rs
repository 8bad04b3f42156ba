pub mod animation;
pub mod cache;
pub mod compositing;
pub mod drawing;
pub mod geometry;
pub mod images;
pub mod layout;
pub mod position;
pub mod preview;
pub mod renderer;
pub mod style;
pub mod text_rasterizing;
pub mod theme;

pub use preview::{
    setup_scale_preview, PreviewHost, ScalePreview, ScalePreviewCallback, ScalePreviewShow,
};
