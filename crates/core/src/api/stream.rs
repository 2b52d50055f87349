//! Streaming orchestrator: walks the selected pages in base-out order and
//! emits draw events, deferring heavy assets behind the text.

use crate::api::selection::PageSelection;
use crate::document::PdfDocument;
use crate::error::{PdfError, Result};
use crate::font::{Font, ensure_os2, resolve_fonts, resolve_xobjects};
use crate::interp::ContentInterpreter;
use crate::model::commands::{ImageCommand, ParsedData};
use crate::model::objects::ObjRef;
use bytes::Bytes;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, sync_channel};
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Bounded depth of the producer/consumer event queue.
pub const STREAM_QUEUE_CAPACITY: usize = 20;

/// Cooperative cancellation flag shared between producer and consumer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl PdfDocument {
    /// Stream draw events for the selected pages into `emit`.
    ///
    /// Per page: a Page event, then Text and Path events in z order as
    /// interpreted. Image payloads, and the programs of fonts the text
    /// commands referenced, are deferred until every selected page's text
    /// has been emitted; failures in that
    /// deferred phase skip the asset instead of killing the stream.
    /// Page-level failures (unparseable resources, broken content stream
    /// extraction) abort with the error.
    ///
    /// `emit` returning false means the consumer is gone; the walk stops
    /// quietly, as it does when `cancel` is set between tasks.
    pub fn stream_page_contents(
        &self,
        selection: &PageSelection,
        cancel: &CancelToken,
        emit: &mut dyn FnMut(ParsedData) -> bool,
    ) -> Result<()> {
        let resolved = selection.resolve(self.page_count())?;

        let mut fonts: FxHashMap<String, Font> = FxHashMap::default();
        let mut deferred_images: Vec<(ImageCommand, ObjRef, usize)> = Vec::new();
        let mut font_queue: Vec<(String, ObjRef)> = Vec::new();
        let mut queued_fonts: FxHashSet<String> = FxHashSet::default();

        for page_num in resolved.visit_order() {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let page = self.page_by_number(page_num)?.clone();
            if !emit(ParsedData::Page {
                width: page.width,
                height: page.height,
                page: page_num as i64,
            }) {
                return Ok(());
            }

            if let Some(resources_ref) = page.resources_ref {
                for font in resolve_fonts(self, resources_ref)? {
                    fonts.insert(font.font_id.clone(), font);
                }
            }

            let content = match page.contents_ref {
                Some(contents_ref) => self.extract_stream(contents_ref)?,
                None => Bytes::new(),
            };
            let drawn = ContentInterpreter::new(&fonts, page.height).run(&content);

            // Only fonts a show operator actually used get their program
            // emitted; declared-but-unused fonts stay out of the stream.
            for t in &drawn.texts {
                if let Some(font) = fonts.get(&t.font_id) {
                    if let Some(program_ref) = font.program_ref {
                        if queued_fonts.insert(font.font_id.clone()) {
                            font_queue.push((font.font_id.clone(), program_ref));
                        }
                    }
                }
            }

            for t in drawn.texts {
                if !emit(ParsedData::Text {
                    x: t.x,
                    y: t.y,
                    z: t.z,
                    text: t.text.concat(),
                    font_id: t.font_id,
                    font_size: t.font_size,
                    color: t.color,
                    page: page_num as i64,
                }) {
                    return Ok(());
                }
            }
            for p in drawn.paths {
                if !emit(ParsedData::Path {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                    width: p.width,
                    height: p.height,
                    path: p.path,
                    fill_color: p.fill_color,
                    stroke_color: p.stroke_color,
                    page: page_num as i64,
                }) {
                    return Ok(());
                }
            }

            if !drawn.images.is_empty() {
                let xobjects = match page.resources_ref {
                    Some(resources_ref) => resolve_xobjects(self, resources_ref)?,
                    None => FxHashMap::default(),
                };
                for cmd in drawn.images {
                    match xobjects.get(&cmd.image_id) {
                        Some(&image_ref) => deferred_images.push((cmd, image_ref, page_num)),
                        None => {
                            warn!(page = page_num, image = %cmd.image_id, "XObject not in resources, skipping");
                        }
                    }
                }
            }
        }

        for (cmd, image_ref, page_num) in deferred_images {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let img = match self.extract_image(image_ref) {
                Ok(img) => img,
                Err(e) => {
                    warn!(page = page_num, image = %cmd.image_id, error = %e, "image extraction failed, skipping");
                    continue;
                }
            };
            if !emit(ParsedData::Image {
                x: cmd.x,
                y: cmd.y,
                z: cmd.z,
                width: img.width,
                height: img.height,
                dw: cmd.dw,
                dh: cmd.dh,
                data: img.data,
                mask_data: img.mask_data,
                ext: img.ext,
                clip_path: cmd.clip_path,
                page: page_num as i64,
            }) {
                return Ok(());
            }
        }

        for (font_id, program_ref) in font_queue {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let program = match self.extract_font_program(program_ref) {
                Ok(program) => program,
                Err(e) => {
                    warn!(font = %font_id, error = %e, "font extraction failed, skipping");
                    continue;
                }
            };
            let data = match ensure_os2(&program) {
                Ok(data) => data,
                Err(e) => {
                    warn!(font = %font_id, error = %e, "font repair failed, skipping");
                    continue;
                }
            };
            if !emit(ParsedData::Font { font_id, data }) {
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Consumer end of a background streaming run.
///
/// Iterates the events in production order. Dropping it cancels the
/// producer; `finish` reports the producer's outcome after the events are
/// exhausted.
pub struct EventStream {
    rx: Receiver<ParsedData>,
    cancel: CancelToken,
    handle: Option<JoinHandle<Result<()>>>,
}

/// Run a streaming extraction on a background thread with a bounded queue
/// between producer and consumer, so a slow consumer exerts backpressure
/// instead of buffering the whole document.
pub fn stream_events(doc: PdfDocument, selection: PageSelection) -> EventStream {
    let cancel = CancelToken::new();
    let (tx, rx) = sync_channel(STREAM_QUEUE_CAPACITY);
    let producer_cancel = cancel.clone();
    let handle = thread::spawn(move || {
        doc.stream_page_contents(&selection, &producer_cancel, &mut |event| {
            tx.send(event).is_ok()
        })
    });
    EventStream {
        rx,
        cancel,
        handle: Some(handle),
    }
}

impl EventStream {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain any remaining events and return the producer's result.
    pub fn finish(mut self) -> Result<()> {
        while self.rx.recv().is_ok() {}
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(PdfError::Structure("producer thread panicked".into()))),
            None => Ok(()),
        }
    }
}

impl Iterator for EventStream {
    type Item = ParsedData;

    fn next(&mut self) -> Option<ParsedData> {
        self.rx.recv().ok()
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        // Unblocks a producer waiting on a full queue; the channel closes
        // when rx drops, so its next send fails and the thread exits.
        self.cancel.cancel();
    }
}
