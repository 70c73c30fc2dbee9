//! H.264/AVC 码流解析.

pub mod nal;
pub mod svc;

pub use nal::NalUnitType;
pub use svc::{SvcExtensionHeader, split_layers};
