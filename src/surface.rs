//! The isolated print surface and the content written into it.

use serde::Serialize;
use std::fmt;

/// Identifier of a surface attached to a host document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Where and how a surface is attached so it stays out of the visible layout
#[derive(Debug, Clone, PartialEq)]
pub struct SurfacePlacement {
    /// Frame name
    pub name: String,
    /// Absolute top offset in pixels (negative pushes it off-screen)
    pub top_px: i32,
}

/// A style source of the host document, duplicated into the surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleSource {
    /// `<style>` block
    Inline {
        attributes: Vec<(String, String)>,
        css: String,
    },
    /// `<link rel="stylesheet">` reference
    Stylesheet { attributes: Vec<(String, String)> },
}

impl StyleSource {
    pub fn attributes(&self) -> &[(String, String)] {
        match self {
            StyleSource::Inline { attributes, .. } => attributes,
            StyleSource::Stylesheet { attributes } => attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_html(&self) -> String {
        match self {
            StyleSource::Inline { attributes, css } => {
                format!("<style{}>{}</style>", render_attributes(attributes), css)
            }
            StyleSource::Stylesheet { attributes } => {
                format!("<link{}>", render_attributes(attributes))
            }
        }
    }
}

fn render_attributes(attributes: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    out
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Everything written into one print surface.
///
/// Serialized as a minimal shell: the fixed title, an optional base href, the
/// duplicated styles in host order, the print-only block last, and the
/// container markup as the body, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDocument {
    pub title: String,
    pub base_href: Option<String>,
    pub styles: Vec<StyleSource>,
    pub print_css: String,
    pub body: String,
}

impl SurfaceDocument {
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(self.body.len() + self.print_css.len() + 256);
        html.push_str("<html><head><title>");
        html.push_str(&escape_text(&self.title));
        html.push_str("</title>");
        if let Some(base) = &self.base_href {
            html.push_str(&format!("<base href=\"{}\">", escape_attribute(base)));
        }
        for style in &self.styles {
            html.push_str(&style.to_html());
        }
        html.push_str("<style>\n");
        html.push_str(&self.print_css);
        html.push_str("\n</style>");
        html.push_str("</head><body>");
        html.push_str(&self.body);
        html.push_str("</body></html>");
        html
    }
}
