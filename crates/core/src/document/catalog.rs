//! PDF document: xref-backed object access and the page-tree navigator.

use crate::error::{PdfError, Result};
use crate::model::objects::{ObjRef, PdfObject};
use crate::parser::object::parse_object_dict;
use crate::parser::xref::{XrefEntry, locate_startxref, parse_xref_section, read_line};
use rustc_hash::{FxHashMap, FxHashSet};

/// The document catalog: the root of the page tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    pub pages_ref: ObjRef,
}

/// A page with its inheritable attributes already resolved.
///
/// Width and height are in PDF user-space units, computed from the
/// MediaBox after walking the /Parent chain if needed. Absent contents
/// means an empty page; absent resources means no fonts or images.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub contents_ref: Option<ObjRef>,
    pub resources_ref: Option<ObjRef>,
    pub width: f64,
    pub height: f64,
}

/// Upper bound on /Parent hops while resolving an inherited MediaBox.
const MEDIABOX_PARENT_LIMIT: usize = 64;

/// A parsed PDF document.
///
/// Owns the full file buffer; the xref table and flat page list are built
/// once at open time and immutable afterward. No state is shared between
/// documents, so no locking is required.
#[derive(Debug)]
pub struct PdfDocument {
    pub(crate) data: Vec<u8>,
    xref: FxHashMap<u32, XrefEntry>,
    root: ObjRef,
    pages: Vec<Page>,
}

impl PdfDocument {
    /// Open a document from a fully buffered byte vector.
    ///
    /// Establishes the xref table, trailer, catalog and the flat page list;
    /// any failure here is fatal and leaves no partial state behind.
    pub fn open(data: Vec<u8>) -> Result<Self> {
        let startxref = locate_startxref(&data)?;
        let section = parse_xref_section(&data, startxref)?;

        let mut doc = Self {
            data,
            xref: section.entries,
            root: section.root,
            pages: Vec::new(),
        };
        let catalog = doc.catalog()?;
        doc.pages = doc.load_page_tree(&catalog)?;
        Ok(doc)
    }

    /// Open a document from any readable source, buffering it in memory.
    pub fn from_reader(mut reader: impl std::io::Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::open(data)
    }

    /// Release the underlying buffer. Further object access fails.
    pub fn close(&mut self) {
        self.data = Vec::new();
        self.xref.clear();
        self.pages.clear();
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by its 1-based page number.
    pub fn page_by_number(&self, page_num: usize) -> Result<&Page> {
        if self.pages.is_empty() {
            return Err(PdfError::Range("document has no pages".into()));
        }
        if page_num == 0 || page_num > self.pages.len() {
            return Err(PdfError::Range(format!(
                "page {} out of range 1..={}",
                page_num,
                self.pages.len()
            )));
        }
        Ok(&self.pages[page_num - 1])
    }

    pub(crate) fn xref_entry(&self, r: ObjRef) -> Result<XrefEntry> {
        self.xref.get(&r.objnum).copied().ok_or_else(|| {
            PdfError::Structure(format!("object {} not present in xref table", r))
        })
    }

    /// Parse the indirect object behind a reference.
    pub fn object(&self, r: ObjRef) -> Result<PdfObject> {
        let entry = self.xref_entry(r)?;
        let body = self.load_object_body(entry.offset)?;
        parse_object_dict(&body)
            .map_err(|e| PdfError::Structure(format!("object {}: {}", r, e)))
    }

    /// Read the textual body of an object definition: all lines from its
    /// start offset up to `endobj` or `stream`, with the `N G obj` header
    /// stripped.
    pub(crate) fn load_object_body(&self, offset: usize) -> Result<String> {
        if offset >= self.data.len() {
            return Err(PdfError::Structure(format!(
                "object offset {} beyond end of file",
                offset
            )));
        }
        let mut buffer = String::new();
        let mut pos = offset;
        while pos < self.data.len() {
            let (line, next) = read_line(&self.data, pos);
            pos = next;
            if line.starts_with("endobj") || line.starts_with("stream") {
                break;
            }
            buffer.push_str(&line);
            buffer.push('\n');
        }
        match buffer.split_once("obj") {
            Some((_, body)) => Ok(body.to_string()),
            None => Err(PdfError::Structure(format!(
                "no 'obj' keyword at offset {}",
                offset
            ))),
        }
    }

    /// Parse the Root object and extract the /Pages reference.
    pub fn catalog(&self) -> Result<Catalog> {
        let root = self.object(self.root)?;
        let pages_ref = root
            .find_ref("Pages")
            .ok_or_else(|| PdfError::Structure("catalog has no /Pages reference".into()))?;
        Ok(Catalog { pages_ref })
    }

    /// Walk the page tree into a flat, document-ordered page list.
    ///
    /// Uses an explicit worklist instead of recursion and fails on a /Kids
    /// chain that revisits a reference, so a cyclic tree cannot loop
    /// forever or exhaust the stack.
    fn load_page_tree(&self, catalog: &Catalog) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut stack = vec![catalog.pages_ref];
        let mut visited: FxHashSet<ObjRef> = FxHashSet::default();

        while let Some(node_ref) = stack.pop() {
            if !visited.insert(node_ref) {
                return Err(PdfError::Structure(format!(
                    "page tree cycle detected at {}",
                    node_ref
                )));
            }
            let node = self.object(node_ref)?;
            let node_type = node
                .find("Type")
                .and_then(|t| t.as_name().ok())
                .map(str::to_string);

            match node_type.as_deref() {
                Some("Pages") => {
                    let kids = node.find_refs("Kids").ok_or_else(|| {
                        PdfError::Structure(format!("pages node {} has no /Kids", node_ref))
                    })?;
                    for kid in kids.into_iter().rev() {
                        stack.push(kid);
                    }
                }
                Some("Page") => {
                    let media_box = self.resolve_media_box(&node, node_ref)?;
                    pages.push(Page {
                        contents_ref: node.find_ref("Contents"),
                        resources_ref: node.find_ref("Resources"),
                        width: media_box[2] - media_box[0],
                        height: media_box[3] - media_box[1],
                    });
                }
                other => {
                    return Err(PdfError::Structure(format!(
                        "page tree node {} has type {:?}, expected /Pages or /Page",
                        node_ref, other
                    )));
                }
            }
        }
        Ok(pages)
    }

    /// Resolve a node's MediaBox, following the /Parent chain when absent.
    fn resolve_media_box(&self, node: &PdfObject, node_ref: ObjRef) -> Result<[f64; 4]> {
        let mut current = node.clone();
        for _ in 0..MEDIABOX_PARENT_LIMIT {
            if let Some(found) = current.find("MediaBox") {
                let arr = found.as_array()?;
                if arr.len() != 4 {
                    return Err(PdfError::Structure(format!(
                        "MediaBox near {} has {} elements, expected 4",
                        node_ref,
                        arr.len()
                    )));
                }
                let mut bx = [0.0; 4];
                for (slot, value) in bx.iter_mut().zip(arr.iter()) {
                    *slot = value.as_num()?;
                }
                return Ok(bx);
            }
            match current.find_ref("Parent") {
                Some(parent_ref) => current = self.object(parent_ref)?,
                None => {
                    return Err(PdfError::Structure(format!(
                        "no MediaBox on page {} or any ancestor",
                        node_ref
                    )));
                }
            }
        }
        Err(PdfError::Structure(format!(
            "parent chain of {} exceeds {} levels",
            node_ref, MEDIABOX_PARENT_LIMIT
        )))
    }
}
