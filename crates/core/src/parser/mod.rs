//! Low-level parsing: object grammar and cross-reference tables.

pub mod object;
pub mod xref;

pub use object::{ObjectParser, parse_object_dict};
pub use xref::{XrefEntry, XrefSection, locate_startxref, parse_xref_section};
