//! End-to-end tests for the print renderer against in-memory hosts

use printframe::{
    Error, HostDocument, HostEvent, ManualScheduler, MemoryDocument, PrintOutcome, PrintRenderer,
    PrintRequest, Result, StyleSource, SurfaceDocument, SurfaceId, SurfacePlacement,
};
use std::sync::Arc;
use std::time::Duration;

const INVOICE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Billing</title>
<style>.invoice { border: 1px solid #ccc; }</style>
<link rel="stylesheet" href="/css/app.css" media="all">
</head>
<body>
<nav>Menu</nav>
<div id="invoice" class="invoice"><h1>Invoice #42</h1><button class="btn">Print</button><p class="print-only">Thank you</p></div>
</body>
</html>"#;

/// Host that reports a fixed container markup and delegates surfaces to a
/// `MemoryDocument`
struct RawMarkupHost {
    markup: String,
    inner: MemoryDocument,
}

impl HostDocument for RawMarkupHost {
    fn container_markup(&self, id: &str) -> Result<String> {
        if id == "raw" {
            Ok(self.markup.clone())
        } else {
            Err(Error::ContainerNotFound(id.to_string()))
        }
    }
    fn style_sources(&self) -> Result<Vec<StyleSource>> {
        self.inner.style_sources()
    }
    fn attach_surface(&self, placement: &SurfacePlacement) -> Result<SurfaceId> {
        self.inner.attach_surface(placement)
    }
    fn write_surface(&self, id: SurfaceId, document: &SurfaceDocument) -> Result<()> {
        self.inner.write_surface(id, document)
    }
    fn print_surface(&self, id: SurfaceId) -> Result<()> {
        self.inner.print_surface(id)
    }
    fn detach_surface(&self, id: SurfaceId) -> Result<()> {
        self.inner.detach_surface(id)
    }
}

/// Host whose style lookup fails after the surface has been attached
struct BrokenStylesHost {
    inner: MemoryDocument,
}

impl HostDocument for BrokenStylesHost {
    fn container_markup(&self, id: &str) -> Result<String> {
        self.inner.container_markup(id)
    }
    fn style_sources(&self) -> Result<Vec<StyleSource>> {
        Err(Error::SurfaceError("stylesheet list unavailable".into()))
    }
    fn attach_surface(&self, placement: &SurfacePlacement) -> Result<SurfaceId> {
        self.inner.attach_surface(placement)
    }
    fn write_surface(&self, id: SurfaceId, document: &SurfaceDocument) -> Result<()> {
        self.inner.write_surface(id, document)
    }
    fn print_surface(&self, id: SurfaceId) -> Result<()> {
        self.inner.print_surface(id)
    }
    fn detach_surface(&self, id: SurfaceId) -> Result<()> {
        self.inner.detach_surface(id)
    }
}

#[test]
fn invoice_end_to_end() {
    let host = Arc::new(MemoryDocument::parse(INVOICE_PAGE));
    let scheduler = ManualScheduler::new();
    let renderer = PrintRenderer::new(host.clone(), &scheduler);

    let request = PrintRequest::new("invoice")
        .scale(80)
        .hide([".btn"])
        .show([".print-only"]);
    let outcome = renderer.render(&request);
    let id = outcome.surface().expect("print scheduled");

    // Surface exists and is populated before the delay elapses
    assert_eq!(host.attached_surfaces(), vec![id]);
    let doc = host.surface_document(id).expect("surface written");
    assert_eq!(doc.styles.len(), 2);
    assert!(matches!(doc.styles[0], StyleSource::Inline { .. }));
    assert_eq!(doc.styles[1].attribute("href"), Some("/css/app.css"));
    assert_eq!(doc.styles[1].attribute("media"), Some("all"));
    assert!(doc.print_css.contains("zoom: 0.8;"));
    assert!(doc.print_css.contains(".btn { display: none !important; }"));
    assert!(doc
        .print_css
        .contains(".print-only { display: block !important; visibility: visible !important; }"));
    assert!(host.prints().is_empty());

    assert_eq!(scheduler.advance(Duration::from_millis(499)), 0);
    assert!(host.prints().is_empty());
    assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);

    let prints = host.prints();
    assert_eq!(prints.len(), 1);
    assert_eq!(prints[0].surface, id);
    assert!(host.attached_surfaces().is_empty());
    assert_eq!(
        host.events(),
        vec![
            HostEvent::Attached(id),
            HostEvent::Written(id),
            HostEvent::Focused(id),
            HostEvent::Printed(id),
            HostEvent::Detached(id),
        ]
    );
}

#[test]
fn printed_document_orders_host_styles_before_print_block() {
    let host = Arc::new(MemoryDocument::parse(INVOICE_PAGE));
    let scheduler = ManualScheduler::new();
    let renderer = PrintRenderer::new(host.clone(), &scheduler);
    renderer.render(&PrintRequest::new("invoice"));
    scheduler.run_all();

    let html = &host.prints()[0].html;
    let inline = html.find(".invoice { border").expect("inline style copied");
    let link = html.find("href=\"/css/app.css\"").expect("link copied");
    let print = html.find("@media print").expect("print block");
    assert!(inline < link && link < print);
    assert!(html.starts_with("<html><head><title>Void Bills</title>"));
    assert!(!html.contains("<nav>"), "only the container is printed");
}

#[test]
fn container_markup_is_copied_byte_for_byte() {
    let samples = [
        String::new(),
        r#"<p data-x='a "quoted" value'>1 &lt; 2 > 0</p><!-- note -->"#.to_string(),
        "<td>\"'<>&</td>".to_string(),
    ];
    for markup in samples {
        let host = Arc::new(RawMarkupHost {
            markup: markup.clone(),
            inner: MemoryDocument::parse("<html><body></body></html>"),
        });
        let renderer = PrintRenderer::new(host.clone(), ManualScheduler::new());
        let prepared = renderer.prepare(&PrintRequest::new("raw")).unwrap();
        let doc = host.inner.surface_document(prepared.id()).unwrap();
        assert_eq!(doc.body, markup);
        assert!(doc.to_html().ends_with(&format!("<body>{}</body></html>", markup)));
    }
}

#[test]
fn empty_selector_lists_leave_no_rules() {
    let host = Arc::new(MemoryDocument::parse(INVOICE_PAGE));
    let renderer = PrintRenderer::new(host.clone(), ManualScheduler::new());
    let prepared = renderer.prepare(&PrintRequest::new("invoice")).unwrap();
    let css = host.surface_document(prepared.id()).unwrap().print_css;
    assert!(!css.contains("display: none !important"));
    assert!(!css.contains("visibility: visible !important"));
    assert!(css.contains("zoom: 1;"));
}

#[test]
fn setup_failure_after_attach_releases_surface() {
    let host = Arc::new(BrokenStylesHost {
        inner: MemoryDocument::parse(INVOICE_PAGE),
    });
    let scheduler = ManualScheduler::new();
    let renderer = PrintRenderer::new(host.clone(), &scheduler);

    let outcome = renderer.render(&PrintRequest::new("invoice"));
    assert!(matches!(outcome, PrintOutcome::SetupFailed(ref msg) if msg.contains("stylesheet")));
    assert!(host.inner.attached_surfaces().is_empty());
    assert_eq!(scheduler.pending(), 0);

    let events = host.inner.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], HostEvent::Attached(_)));
    assert!(matches!(events[1], HostEvent::Detached(_)));
}

#[test]
fn missing_container_reports_lookup_failure() {
    let host = Arc::new(MemoryDocument::parse(INVOICE_PAGE));
    let scheduler = ManualScheduler::new();
    let renderer = PrintRenderer::new(host.clone(), &scheduler);
    let outcome = renderer.render(&PrintRequest::new("receipt").scale(50));
    assert_eq!(outcome, PrintOutcome::LookupFailed("receipt".into()));
    assert!(host.events().is_empty());
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn overlapping_renders_use_independent_surfaces() {
    let host = Arc::new(MemoryDocument::parse(INVOICE_PAGE));
    let scheduler = ManualScheduler::new();
    let renderer = PrintRenderer::new(host.clone(), &scheduler);

    let first = renderer.render(&PrintRequest::new("invoice").scale(30)).surface().unwrap();
    scheduler.advance(Duration::from_millis(200));
    let second = renderer.render(&PrintRequest::new("invoice").scale(90)).surface().unwrap();
    assert_ne!(first, second);
    assert_eq!(host.attached_surfaces().len(), 2);

    scheduler.advance(Duration::from_millis(300));
    assert_eq!(host.attached_surfaces(), vec![second]);
    scheduler.advance(Duration::from_millis(200));
    assert!(host.attached_surfaces().is_empty());

    let prints = host.prints();
    assert_eq!(prints.len(), 2);
    assert!(prints[0].html.contains("zoom: 0.3;"));
    assert!(prints[1].html.contains("zoom: 0.9;"));
}

#[test]
fn out_of_range_scales_are_clamped_in_output() {
    for (input, zoom) in [(-5, "0.1"), (0, "0.1"), (9, "0.1"), (101, "1"), (1000, "1")] {
        let host = Arc::new(MemoryDocument::parse(INVOICE_PAGE));
        let renderer = PrintRenderer::new(host.clone(), ManualScheduler::new());
        let prepared = renderer.prepare(&PrintRequest::new("invoice").scale(input)).unwrap();
        let css = host.surface_document(prepared.id()).unwrap().print_css;
        assert!(
            css.contains(&format!("zoom: {};", zoom)),
            "scale {} should print at {}",
            input,
            zoom
        );
    }
}
