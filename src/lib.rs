//! printframe
//!
//! Print one container of a document at a configurable scale, through an
//! isolated print surface that carries the host page's styling.
//!
//! # Features
//!
//! - **Isolated surface**: the container markup is copied into an off-screen
//!   sub-document together with every host `<style>` and stylesheet `<link>`
//! - **Print-only styling**: scale, hide/show selectors, baseline typography
//!   and page margins live in an `@media print` block
//! - **Injected collaborators**: the host document and the delay scheduler are
//!   traits, so the same renderer drives a browser DOM (`web` feature) or an
//!   in-memory page
//!
//! # Example
//!
//! ```
//! use printframe::{ImmediateScheduler, MemoryDocument, PrintOutcome, PrintRequest};
//! use std::sync::Arc;
//!
//! let host = Arc::new(MemoryDocument::parse(
//!     r#"<html><head><style>p { color: gray; }</style></head>
//!        <body><div id="invoice"><p class="btn">Pay</p><p>Total</p></div></body></html>"#,
//! ));
//! let request = PrintRequest::new("invoice").scale(80).hide([".btn"]);
//! let outcome = printframe::print_container(host.clone(), ImmediateScheduler, &request);
//!
//! assert!(matches!(outcome, PrintOutcome::Scheduled(_)));
//! assert!(host.prints()[0].html.contains("zoom: 0.8;"));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod dom;
pub mod host;
pub mod renderer;
pub mod scale;
pub mod scheduler;
pub mod style;
pub mod surface;

// Host page loading for the preview CLI (files and http(s) URLs)
#[cfg(feature = "fetch")]
pub mod source;

// Browser DOM binding through wasm-bindgen
#[cfg(feature = "web")]
pub mod web;

pub use dom::{HostEvent, MemoryDocument, PrintRecord};
pub use host::HostDocument;
pub use renderer::{PreparedSurface, PrintRenderer};
pub use scale::EffectiveScale;
pub use scheduler::{ImmediateScheduler, ManualScheduler, Scheduler, Task};
#[cfg(feature = "tokio")]
pub use scheduler::TokioScheduler;
pub use surface::{StyleSource, SurfaceDocument, SurfaceId, SurfacePlacement};

/// Configuration for the print renderer
///
/// The defaults reproduce the classic print helper: a "Void Bills" titled
/// frame pushed 10000px above the page, printed 500ms after it was written,
/// with a Nunito baseline at 10px and 10mm page margins.
///
/// # Examples
///
/// ```
/// let cfg = printframe::PrintConfig::default();
/// assert_eq!(cfg.print_delay_ms, 500);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Fixed title of the print surface
    pub title: String,
    /// Delay between writing the surface and printing it, in milliseconds
    pub print_delay_ms: u64,
    /// Baseline font stack for the printed body
    pub font_family: String,
    /// Baseline font size for the printed body, in pixels
    pub font_size_px: u32,
    /// Font size forced on every table descendant
    pub table_font_size: String,
    /// Selector of scrollable table wrappers that must print unclipped
    pub responsive_table_selector: String,
    /// `@page` margin
    pub page_margin: String,
    /// Name given to the surface frame
    pub frame_name: String,
    /// Absolute top offset of the surface frame, in pixels
    pub offscreen_top_px: i32,
    /// Optional `<base href>` for the surface, so relative stylesheet links
    /// resolve when the surface is not served from the host's origin
    pub base_href: Option<String>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            title: "Void Bills".to_string(),
            print_delay_ms: 500,
            font_family: "\"Nunito\", sans-serif".to_string(),
            font_size_px: 10,
            table_font_size: ".85rem".to_string(),
            responsive_table_selector: ".table-responsive".to_string(),
            page_margin: "10mm".to_string(),
            frame_name: "frame1".to_string(),
            offscreen_top_px: -10000,
            base_href: None,
        }
    }
}

impl PrintConfig {
    /// Parse a JSON configuration; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: PrintConfig = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("invalid JSON: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::ConfigError("title must not be empty".into()));
        }
        if self.font_family.trim().is_empty() {
            return Err(Error::ConfigError("font_family must not be empty".into()));
        }
        if style::check_selector(&self.responsive_table_selector).is_err() {
            return Err(Error::ConfigError(format!(
                "responsive_table_selector is not a selector: {}",
                self.responsive_table_selector
            )));
        }
        if let Some(base) = &self.base_href {
            url::Url::parse(base)
                .map_err(|e| Error::ConfigError(format!("base_href {}: {}", base, e)))?;
        }
        Ok(())
    }

    pub fn print_delay(&self) -> Duration {
        Duration::from_millis(self.print_delay_ms)
    }

    pub fn placement(&self) -> SurfacePlacement {
        SurfacePlacement {
            name: self.frame_name.clone(),
            top_px: self.offscreen_top_px,
        }
    }
}

fn default_scale_percent() -> i64 {
    scale::DEFAULT_SCALE_PERCENT
}

/// One print invocation
///
/// `scale_percent` is taken as given and clamped to `[10, 100]` when the
/// effective scale is computed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PrintRequest {
    /// Id of the container to print
    pub container_id: String,
    /// Requested scale in percent (default 100)
    #[serde(default = "default_scale_percent")]
    pub scale_percent: i64,
    /// Selectors hidden in the printed output
    #[serde(default)]
    pub hide_selectors: Vec<String>,
    /// Selectors forced visible in the printed output
    #[serde(default)]
    pub show_selectors: Vec<String>,
}

impl PrintRequest {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            scale_percent: scale::DEFAULT_SCALE_PERCENT,
            hide_selectors: Vec::new(),
            show_selectors: Vec::new(),
        }
    }

    pub fn scale(mut self, percent: i64) -> Self {
        self.scale_percent = percent;
        self
    }

    pub fn hide<I, T>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.hide_selectors.extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn show<I, T>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.show_selectors.extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn effective_scale(&self) -> EffectiveScale {
        EffectiveScale::from_percent(self.scale_percent)
    }
}

/// What a render call did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PrintOutcome {
    /// The surface is written and its print is scheduled
    Scheduled(SurfaceId),
    /// The container id did not resolve; nothing was attached
    LookupFailed(String),
    /// Setup failed after validation or lookup; the surface was released
    SetupFailed(String),
}

impl PrintOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, PrintOutcome::Scheduled(_))
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        match self {
            PrintOutcome::Scheduled(id) => Some(*id),
            _ => None,
        }
    }
}

/// Render `request` against `host` with the default configuration.
pub fn print_container<D, S>(host: std::sync::Arc<D>, scheduler: S, request: &PrintRequest) -> PrintOutcome
where
    D: HostDocument + 'static,
    S: Scheduler,
{
    PrintRenderer::new(host, scheduler).render(request)
}
