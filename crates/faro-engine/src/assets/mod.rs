//! Binary asset loading.
//!
//! Responsibilities:
//! - endian-aware reads over any byte stream (`BinaryReader`)
//! - the packed bitmap-font container (`FontData`)
//!
//! Loaders only produce plain data; turning it into GPU resources is the
//! presenter's job.

mod binary_reader;
mod font_data;

pub use binary_reader::{BinaryReader, Endian};
pub use font_data::{FontData, FontDataError, Glyph};
