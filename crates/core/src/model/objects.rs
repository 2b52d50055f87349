//! PDF object types - the value tree produced by the object grammar parser.

use crate::error::{PdfError, Result};
use std::collections::HashMap;

/// PDF object types - the fundamental value type in PDF.
///
/// Dictionary keys are unique within one dictionary; array order is
/// semantically meaningful and never reordered.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object with the leading slash stripped (e.g. "Type", "Font")
    Name(String),
    /// Literal or hex string, decoded
    String(String),
    /// Bare keyword that is not true/false/null
    Keyword(String),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(HashMap<String, Self>),
    /// Indirect object reference
    Ref(ObjRef),
}

impl PdfObject {
    /// Get as integer.
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64).
    pub fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string.
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as decoded string.
    pub fn as_string(&self) -> Result<&str> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array.
    pub fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary.
    pub fn as_dict(&self) -> Result<&HashMap<String, Self>> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference.
    pub fn as_objref(&self) -> Result<ObjRef> {
        match self {
            Self::Ref(r) => Ok(*r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Look up a key in a dictionary, descending into nested dictionaries.
    ///
    /// Values of the outer dictionary are searched recursively so that keys
    /// living one level down (e.g. /Font inside /Resources) are still found.
    pub fn find(&self, key: &str) -> Option<&PdfObject> {
        if let Self::Dict(d) = self {
            if let Some(v) = d.get(key) {
                return Some(v);
            }
            for value in d.values() {
                if let Some(found) = value.find(key) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Look up a key and coerce the value to an object reference.
    pub fn find_ref(&self, key: &str) -> Option<ObjRef> {
        self.find(key).and_then(|v| v.as_objref().ok())
    }

    /// Look up a key holding an array of references.
    pub fn find_refs(&self, key: &str) -> Option<Vec<ObjRef>> {
        let arr = self.find(key)?.as_array().ok()?;
        Some(arr.iter().filter_map(|v| v.as_objref().ok()).collect())
    }

    /// Get type name for error messages.
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Keyword(_) => "keyword",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Ref(_) => "ref",
        }
    }
}

/// PDF indirect object reference.
///
/// Equality is by object number plus generation; the generation is tracked
/// but not currently used to disambiguate objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    /// Object number
    pub objnum: u32,
    /// Generation number
    pub gennum: u32,
}

impl ObjRef {
    /// Create a new object reference.
    pub const fn new(objnum: u32, gennum: u32) -> Self {
        Self { objnum, gennum }
    }
}

impl std::fmt::Display for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.objnum, self.gennum)
    }
}
