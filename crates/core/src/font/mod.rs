//! Font handling: resource resolution, ToUnicode CMaps and TrueType
//! program repair.

pub mod cmap;
pub mod resolver;
pub mod sfnt;

pub use resolver::{Font, resolve_fonts, resolve_xobjects};
pub use sfnt::ensure_os2;
