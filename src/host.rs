//! The host document tree as seen by the renderer.
//!
//! The renderer never touches a global document. Everything it reads from or
//! mutates in the host goes through [`HostDocument`], so it can run against a
//! real browser DOM or against an in-memory tree in tests.

use crate::surface::{StyleSource, SurfaceDocument, SurfaceId, SurfacePlacement};
use crate::Result;

/// Operations the renderer needs from a host document.
///
/// Methods take `&self`: the host tree is shared between the synchronous
/// setup and the deferred print task, so implementations use interior
/// mutability (the DOM itself already behaves that way).
pub trait HostDocument {
    /// Serialized inner markup of the element with the given id.
    ///
    /// Returns [`crate::Error::ContainerNotFound`] when no such element exists.
    fn container_markup(&self, id: &str) -> Result<String>;

    /// Every `<style>` and `<link rel="stylesheet">` of the host, in document
    /// order.
    fn style_sources(&self) -> Result<Vec<StyleSource>>;

    /// Create a new isolated surface and attach it to the host tree.
    fn attach_surface(&self, placement: &SurfacePlacement) -> Result<SurfaceId>;

    /// Replace the surface's content with `document`.
    fn write_surface(&self, id: SurfaceId, document: &SurfaceDocument) -> Result<()>;

    /// Focus the surface and invoke the platform print action against it.
    fn print_surface(&self, id: SurfaceId) -> Result<()>;

    /// Remove the surface from the host tree.
    fn detach_surface(&self, id: SurfaceId) -> Result<()>;
}
