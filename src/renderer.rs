//! The print renderer: build an isolated surface, then print it later.
//!
//! Rendering is split in two phases. [`PrintRenderer::prepare`] runs the
//! synchronous setup and hands back a [`PreparedSurface`];
//! [`PrintRenderer::commit_and_print`] schedules the focus/print/remove step
//! after the configured delay, which gives the host time to commit the
//! injected styles and content before the print action rasterizes them.

use crate::host::HostDocument;
use crate::scheduler::Scheduler;
use crate::style::{check_selectors, PrintStylesheet};
use crate::surface::{SurfaceDocument, SurfaceId};
use crate::{PrintConfig, PrintOutcome, PrintRequest, Result};
use log::{debug, info, warn};
use std::sync::Arc;

/// A surface that is attached and written but not yet printed.
///
/// Dropping it detaches the surface from the host, so a surface is released
/// on every path: setup failure, an abandoned prepare, a failed print.
pub struct PreparedSurface<D: HostDocument + 'static> {
    host: Arc<D>,
    id: SurfaceId,
    released: bool,
}

impl<D: HostDocument + 'static> PreparedSurface<D> {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Focus and print the surface, then detach it regardless of the outcome.
    pub fn print_and_release(mut self) -> Result<()> {
        let res = self.host.print_surface(self.id);
        self.release();
        res
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.host.detach_surface(self.id) {
            warn!("failed to detach {}: {}", self.id, e);
        }
    }
}

impl<D: HostDocument + 'static> Drop for PreparedSurface<D> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Prints one container of a host document through an isolated surface.
///
/// # Example
///
/// ```
/// use printframe::{ManualScheduler, MemoryDocument, PrintRenderer, PrintRequest};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let host = Arc::new(MemoryDocument::parse(
///     r#"<html><body><div id="invoice"><p>Total: 10</p></div></body></html>"#,
/// ));
/// let scheduler = ManualScheduler::new();
/// let renderer = PrintRenderer::new(host.clone(), &scheduler);
///
/// let outcome = renderer.render(&PrintRequest::new("invoice").scale(80));
/// assert!(outcome.is_scheduled());
///
/// scheduler.advance(Duration::from_millis(500));
/// assert_eq!(host.prints().len(), 1);
/// assert!(host.attached_surfaces().is_empty());
/// ```
pub struct PrintRenderer<D: HostDocument + 'static, S: Scheduler> {
    host: Arc<D>,
    scheduler: S,
    config: PrintConfig,
}

impl<D: HostDocument + 'static, S: Scheduler> PrintRenderer<D, S> {
    pub fn new(host: Arc<D>, scheduler: S) -> Self {
        Self::with_config(host, scheduler, PrintConfig::default())
    }

    pub fn with_config(host: Arc<D>, scheduler: S, config: PrintConfig) -> Self {
        Self {
            host,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<D> {
        &self.host
    }

    /// Build and populate the print surface for `request`.
    ///
    /// The container lookup comes first, then selector validation; nothing is
    /// attached until both pass. Any later failure detaches the surface
    /// before the error is returned.
    pub fn prepare(&self, request: &PrintRequest) -> Result<PreparedSurface<D>> {
        let markup = self.host.container_markup(&request.container_id)?;
        debug!(
            "extracted {} bytes from '{}'",
            markup.len(),
            request.container_id
        );

        check_selectors(&request.hide_selectors)?;
        check_selectors(&request.show_selectors)?;

        let id = self.host.attach_surface(&self.config.placement())?;
        let prepared = PreparedSurface {
            host: self.host.clone(),
            id,
            released: false,
        };

        let styles = self.host.style_sources()?;
        debug!("duplicating {} style sources into {}", styles.len(), id);

        let scale = request.effective_scale();
        let print_css = PrintStylesheet::new(
            scale,
            &request.hide_selectors,
            &request.show_selectors,
            &self.config,
        )
        .render();

        let document = SurfaceDocument {
            title: self.config.title.clone(),
            base_href: self.config.base_href.clone(),
            styles,
            print_css,
            body: markup,
        };
        self.host.write_surface(id, &document)?;
        Ok(prepared)
    }

    /// Schedule the print of a prepared surface after the configured delay.
    ///
    /// The scheduled task focuses the surface, prints it and detaches it.
    /// Failures inside the task are logged; the surface is detached anyway.
    pub fn commit_and_print(&self, prepared: PreparedSurface<D>) -> SurfaceId {
        let id = prepared.id();
        let delay = self.config.print_delay();
        info!("print of {} scheduled in {:?}", id, delay);
        self.scheduler.schedule_after(
            delay,
            Box::new(move || match prepared.print_and_release() {
                Ok(()) => info!("printed {}", id),
                Err(e) => warn!("print of {} failed: {}", id, e),
            }),
        );
        id
    }

    /// Prepare and schedule in one step.
    pub fn render(&self, request: &PrintRequest) -> PrintOutcome {
        match self.prepare(request) {
            Ok(prepared) => PrintOutcome::Scheduled(self.commit_and_print(prepared)),
            Err(e) if e.is_lookup_failure() => {
                warn!("container '{}' not found", request.container_id);
                PrintOutcome::LookupFailed(request.container_id.clone())
            }
            Err(e) => {
                warn!("print setup for '{}' failed: {}", request.container_id, e);
                PrintOutcome::SetupFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{HostEvent, MemoryDocument};
    use crate::scheduler::{ImmediateScheduler, ManualScheduler};
    use std::time::Duration;

    const PAGE: &str = r#"<html><head><style>h1 { color: navy; }</style></head>
<body><div id="invoice"><h1>Invoice</h1></div></body></html>"#;

    #[test]
    fn prepare_writes_surface_without_printing() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        let renderer = PrintRenderer::new(host.clone(), ImmediateScheduler);
        let prepared = renderer.prepare(&PrintRequest::new("invoice")).unwrap();
        let id = prepared.id();

        let doc = host.surface_document(id).expect("surface written");
        assert_eq!(doc.body, "<h1>Invoice</h1>");
        assert_eq!(doc.title, "Void Bills");
        assert!(host.prints().is_empty());

        let placement = host.surface_placement(id).unwrap();
        assert_eq!(placement.name, "frame1");
        assert_eq!(placement.top_px, -10000);
    }

    #[test]
    fn dropping_prepared_surface_detaches_it() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        let renderer = PrintRenderer::new(host.clone(), ImmediateScheduler);
        let prepared = renderer.prepare(&PrintRequest::new("invoice")).unwrap();
        assert_eq!(host.attached_surfaces().len(), 1);
        drop(prepared);
        assert!(host.attached_surfaces().is_empty());
        assert!(host.prints().is_empty());
    }

    #[test]
    fn lookup_failure_attaches_nothing() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        let renderer = PrintRenderer::new(host.clone(), ImmediateScheduler);
        let outcome = renderer.render(&PrintRequest::new("missing"));
        assert_eq!(outcome, PrintOutcome::LookupFailed("missing".into()));
        assert!(host.events().is_empty());
    }

    #[test]
    fn invalid_selector_is_a_setup_failure() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        let renderer = PrintRenderer::new(host.clone(), ImmediateScheduler);
        let outcome = renderer.render(&PrintRequest::new("invoice").hide(["h1}body{"]));
        assert!(matches!(outcome, PrintOutcome::SetupFailed(_)));
        assert!(host.attached_surfaces().is_empty());
    }

    #[test]
    fn lookup_is_checked_before_selectors() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        let renderer = PrintRenderer::new(host.clone(), ImmediateScheduler);
        let outcome = renderer.render(&PrintRequest::new("missing").hide(["a{"]));
        assert_eq!(outcome, PrintOutcome::LookupFailed("missing".into()));
        assert!(host.events().is_empty());
    }

    #[test]
    fn markup_smuggled_in_a_selector_never_reaches_the_surface() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        let renderer = PrintRenderer::new(host.clone(), ImmediateScheduler);
        let request = PrintRequest::new("invoice")
            .hide([".a</style><h1 id=injected>INJECTED</h1><style>"]);
        let outcome = renderer.render(&request);
        assert!(matches!(outcome, PrintOutcome::SetupFailed(ref msg) if msg.contains("Invalid selector")));
        assert!(host.events().is_empty());
        assert!(host.prints().is_empty());
    }

    #[test]
    fn failed_print_still_detaches() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        host.refuse_prints(true);
        let scheduler = ManualScheduler::new();
        let renderer = PrintRenderer::new(host.clone(), &scheduler);
        let outcome = renderer.render(&PrintRequest::new("invoice"));
        assert!(outcome.is_scheduled());
        assert_eq!(host.attached_surfaces().len(), 1);

        scheduler.advance(Duration::from_millis(500));
        assert!(host.prints().is_empty());
        assert!(host.attached_surfaces().is_empty());
        assert!(matches!(host.events().last(), Some(HostEvent::Detached(_))));
    }

    #[test]
    fn configured_delay_is_honored() {
        let host = Arc::new(MemoryDocument::parse(PAGE));
        let scheduler = ManualScheduler::new();
        let config = PrintConfig {
            print_delay_ms: 50,
            ..Default::default()
        };
        let renderer = PrintRenderer::with_config(host.clone(), &scheduler, config);
        renderer.render(&PrintRequest::new("invoice"));
        assert_eq!(scheduler.advance(Duration::from_millis(49)), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
        assert_eq!(host.prints().len(), 1);
    }
}
