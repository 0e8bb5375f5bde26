//! In-memory host document backed by `scraper`.
//!
//! `MemoryDocument` parses a static HTML page and records every surface the
//! renderer attaches, writes, prints and detaches. It is what the preview CLI
//! prints from and what the tests assert against.

use crate::host::HostDocument;
use crate::surface::{StyleSource, SurfaceDocument, SurfaceId, SurfacePlacement};
use crate::{Error, Result};
use log::debug;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

type OnPrintHandler = Arc<dyn Fn(&PrintRecord) + Send + Sync>;

/// A print action recorded against a surface
#[derive(Debug, Clone, PartialEq)]
pub struct PrintRecord {
    pub surface: SurfaceId,
    /// Title of the printed surface
    pub title: String,
    /// Full serialized surface document at the time of printing
    pub html: String,
}

/// Host tree mutations, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Attached(SurfaceId),
    Written(SurfaceId),
    Focused(SurfaceId),
    Printed(SurfaceId),
    Detached(SurfaceId),
}

#[derive(Debug, Clone)]
struct AttachedSurface {
    placement: SurfacePlacement,
    document: Option<SurfaceDocument>,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    surfaces: BTreeMap<SurfaceId, AttachedSurface>,
    prints: Vec<PrintRecord>,
    events: Vec<HostEvent>,
    refuse_prints: bool,
}

/// A host document held in memory.
pub struct MemoryDocument {
    html: String,
    state: Mutex<MemoryState>,
    on_print: Mutex<Option<OnPrintHandler>>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Other(format!("bad selector {}: {:?}", css, e)))
}

fn sorted_attributes<'a>(attrs: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = attrs.map(|(k, v)| (k.to_string(), v.to_string())).collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

impl MemoryDocument {
    /// Build a host from a full HTML page.
    pub fn parse(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            state: Mutex::new(MemoryState::default()),
            on_print: Mutex::new(None),
        }
    }

    /// Register a callback invoked for every print action
    pub fn on_print<F>(&self, cb: F)
    where
        F: Fn(&PrintRecord) + Send + Sync + 'static,
    {
        *self.handler() = Some(Arc::new(cb));
    }

    /// Make subsequent print actions fail, as a platform refusing to print would
    pub fn refuse_prints(&self, refuse: bool) {
        self.state().refuse_prints = refuse;
    }

    /// Surfaces currently attached to the host tree
    pub fn attached_surfaces(&self) -> Vec<SurfaceId> {
        self.state().surfaces.keys().copied().collect()
    }

    pub fn surface_document(&self, id: SurfaceId) -> Option<SurfaceDocument> {
        self.state()
            .surfaces
            .get(&id)
            .and_then(|s| s.document.clone())
    }

    pub fn surface_placement(&self, id: SurfaceId) -> Option<SurfacePlacement> {
        self.state().surfaces.get(&id).map(|s| s.placement.clone())
    }

    /// Every print action recorded so far
    pub fn prints(&self) -> Vec<PrintRecord> {
        self.state().prints.clone()
    }

    /// Every host tree mutation recorded so far
    pub fn events(&self) -> Vec<HostEvent> {
        self.state().events.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn handler(&self) -> MutexGuard<'_, Option<OnPrintHandler>> {
        self.on_print.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HostDocument for MemoryDocument {
    fn container_markup(&self, id: &str) -> Result<String> {
        let document = Html::parse_document(&self.html);
        let with_id = selector("[id]")?;
        let markup = document
            .select(&with_id)
            .find(|el| el.value().attr("id") == Some(id))
            .map(|el| el.inner_html());
        markup.ok_or_else(|| Error::ContainerNotFound(id.to_string()))
    }

    fn style_sources(&self) -> Result<Vec<StyleSource>> {
        let document = Html::parse_document(&self.html);
        let sources = selector("style, link[rel=\"stylesheet\"]")?;
        let styles: Vec<StyleSource> = document
            .select(&sources)
            .map(|el| {
                let attributes = sorted_attributes(el.value().attrs());
                if el.value().name() == "style" {
                    StyleSource::Inline {
                        attributes,
                        css: el.text().collect::<String>(),
                    }
                } else {
                    StyleSource::Stylesheet { attributes }
                }
            })
            .collect();
        Ok(styles)
    }

    fn attach_surface(&self, placement: &SurfacePlacement) -> Result<SurfaceId> {
        let mut state = self.state();
        state.next_id += 1;
        let id = SurfaceId(state.next_id);
        state.surfaces.insert(
            id,
            AttachedSurface {
                placement: placement.clone(),
                document: None,
            },
        );
        state.events.push(HostEvent::Attached(id));
        debug!("attached {} as '{}' at top {}px", id, placement.name, placement.top_px);
        Ok(id)
    }

    fn write_surface(&self, id: SurfaceId, document: &SurfaceDocument) -> Result<()> {
        let mut state = self.state();
        let surface = state
            .surfaces
            .get_mut(&id)
            .ok_or_else(|| Error::SurfaceError(format!("{} is not attached", id)))?;
        surface.document = Some(document.clone());
        state.events.push(HostEvent::Written(id));
        Ok(())
    }

    fn print_surface(&self, id: SurfaceId) -> Result<()> {
        let record = {
            let mut state = self.state();
            let document = state
                .surfaces
                .get(&id)
                .ok_or_else(|| Error::SurfaceError(format!("{} is not attached", id)))?
                .document
                .clone()
                .ok_or_else(|| Error::SurfaceError(format!("{} has no content", id)))?;
            state.events.push(HostEvent::Focused(id));
            if state.refuse_prints {
                return Err(Error::PrintError(format!("print refused for {}", id)));
            }
            let record = PrintRecord {
                surface: id,
                title: document.title.clone(),
                html: document.to_html(),
            };
            state.prints.push(record.clone());
            state.events.push(HostEvent::Printed(id));
            record
        };

        let handler = self.handler().clone();
        if let Some(cb) = handler {
            cb(&record);
        }
        Ok(())
    }

    fn detach_surface(&self, id: SurfaceId) -> Result<()> {
        let mut state = self.state();
        if state.surfaces.remove(&id).is_none() {
            return Err(Error::SurfaceError(format!("{} is not attached", id)));
        }
        state.events.push(HostEvent::Detached(id));
        debug!("detached {}", id);
        Ok(())
    }
}
