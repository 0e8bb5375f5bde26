//! Browser DOM binding.
//!
//! `WebDocument` implements [`HostDocument`] on top of `web-sys`: the surface
//! is a hidden `<iframe>` whose `srcdoc` receives the serialized surface
//! document, and printing calls `focus()`/`print()` on the frame's window.
//! `TimeoutScheduler` defers the print with `window.setTimeout`.

use crate::host::HostDocument;
use crate::scheduler::{Scheduler, Task};
use crate::surface::{StyleSource, SurfaceDocument, SurfaceId, SurfacePlacement};
use crate::{print_container, Error, PrintRequest, Result};
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlIFrameElement, Window};

fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| Error::SurfaceError("no global window".into()))
}

/// The page's live document as a print host
pub struct WebDocument {
    document: Document,
    frames: RefCell<HashMap<SurfaceId, HtmlIFrameElement>>,
    next_id: Cell<u64>,
}

impl WebDocument {
    /// Use the document of the global window
    pub fn new() -> Result<Self> {
        let document = window()?
            .document()
            .ok_or_else(|| Error::SurfaceError("window has no document".into()))?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            frames: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    fn frame(&self, id: SurfaceId) -> Result<HtmlIFrameElement> {
        self.frames
            .borrow()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::SurfaceError(format!("{} is not attached", id)))
    }
}

fn element_attributes(el: &Element) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = el
        .get_attribute_names()
        .iter()
        .filter_map(|name| name.as_string())
        .filter_map(|name| el.get_attribute(&name).map(|value| (name, value)))
        .collect();
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    attrs
}

impl HostDocument for WebDocument {
    fn container_markup(&self, id: &str) -> Result<String> {
        self.document
            .get_element_by_id(id)
            .map(|el| el.inner_html())
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))
    }

    fn style_sources(&self) -> Result<Vec<StyleSource>> {
        let nodes = self
            .document
            .query_selector_all("style, link[rel=\"stylesheet\"]")?;
        let mut styles = Vec::with_capacity(nodes.length() as usize);
        for i in 0..nodes.length() {
            let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let attributes = element_attributes(&el);
            if el.tag_name().eq_ignore_ascii_case("style") {
                styles.push(StyleSource::Inline {
                    attributes,
                    css: el.text_content().unwrap_or_default(),
                });
            } else {
                styles.push(StyleSource::Stylesheet { attributes });
            }
        }
        Ok(styles)
    }

    fn attach_surface(&self, placement: &SurfacePlacement) -> Result<SurfaceId> {
        let frame = self
            .document
            .create_element("iframe")?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| Error::SurfaceError("created element is not an iframe".into()))?;
        frame.set_name(&placement.name);
        let style = frame.style();
        style.set_property("position", "absolute")?;
        style.set_property("top", &format!("{}px", placement.top_px))?;

        let body = self
            .document
            .body()
            .ok_or_else(|| Error::SurfaceError("document has no body".into()))?;
        body.append_child(&frame)?;

        let id = SurfaceId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.frames.borrow_mut().insert(id, frame);
        debug!("attached {} as iframe '{}'", id, placement.name);
        Ok(id)
    }

    fn write_surface(&self, id: SurfaceId, document: &SurfaceDocument) -> Result<()> {
        self.frame(id)?.set_srcdoc(&document.to_html());
        Ok(())
    }

    fn print_surface(&self, id: SurfaceId) -> Result<()> {
        let window = self
            .frame(id)?
            .content_window()
            .ok_or_else(|| Error::PrintError(format!("{} has no window", id)))?;
        window.focus()?;
        window
            .print()
            .map_err(|e| Error::PrintError(format!("{:?}", e)))
    }

    fn detach_surface(&self, id: SurfaceId) -> Result<()> {
        let frame = self
            .frames
            .borrow_mut()
            .remove(&id)
            .ok_or_else(|| Error::SurfaceError(format!("{} is not attached", id)))?;
        frame.remove();
        debug!("detached {}", id);
        Ok(())
    }
}

/// Defers tasks with `window.setTimeout`
pub struct TimeoutScheduler {
    window: Window,
}

impl TimeoutScheduler {
    pub fn new() -> Result<Self> {
        Ok(Self { window: window()? })
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) {
        let callback = Closure::once_into_js(move || task());
        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms)
        {
            log::warn!("setTimeout failed: {:?}", e);
        }
    }
}

fn string_list(values: Option<&js_sys::Array>) -> Vec<String> {
    values
        .map(|list| list.iter().filter_map(|v| v.as_string()).collect())
        .unwrap_or_default()
}

thread_local! {
    static PAGE_HOST: RefCell<Option<Arc<WebDocument>>> = const { RefCell::new(None) };
}

/// The page's host, shared by every `printContainer` call on this thread so
/// overlapping surfaces get distinct ids.
pub fn page_host() -> Result<Arc<WebDocument>> {
    PAGE_HOST.with(|slot| {
        if let Some(host) = slot.borrow().as_ref() {
            return Ok(host.clone());
        }
        let host = Arc::new(WebDocument::new()?);
        *slot.borrow_mut() = Some(host.clone());
        Ok(host)
    })
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A logger may already be installed by the embedding page
    let _ = console_log::init_with_level(log::Level::Info);
}

/// `printContainer(id, scale?, hideSelectors?, showSelectors?)`
///
/// Missing scale prints at 100%, missing selector lists are empty. Returns
/// `{ status, detail }` where status is `scheduled`, `lookup_failed` or
/// `setup_failed`.
#[wasm_bindgen(js_name = printContainer)]
pub fn print_container_js(
    id: &str,
    scale: Option<i32>,
    hide_selectors: Option<js_sys::Array>,
    show_selectors: Option<js_sys::Array>,
) -> std::result::Result<JsValue, JsValue> {
    let to_js = |e: Error| JsValue::from_str(&e.to_string());
    let host = page_host().map_err(to_js)?;
    let scheduler = TimeoutScheduler::new().map_err(to_js)?;
    let request = PrintRequest::new(id)
        .scale(scale.map(i64::from).unwrap_or(crate::scale::DEFAULT_SCALE_PERCENT))
        .hide(string_list(hide_selectors.as_ref()))
        .show(string_list(show_selectors.as_ref()));
    let outcome = print_container(host, scheduler, &request);
    serde_wasm_bindgen::to_value(&outcome).map_err(JsValue::from)
}
