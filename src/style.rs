//! Print-only style block synthesis.
//!
//! The generated block is wrapped in `@media print` so it has no effect on the
//! surface outside the print action. It is appended after the duplicated host
//! styles, so on equal specificity its rules win.

use crate::{EffectiveScale, Error, PrintConfig, Result};

/// Native zoom-like property used as the primary scaling mechanism
pub const SCALE_PROPERTY: &str = "zoom";
/// `@supports` condition that detects the primary mechanism
pub const SCALE_SUPPORT_TEST: &str = "zoom: 1";

/// Inputs for one print-only style block
#[derive(Debug, Clone)]
pub struct PrintStylesheet<'a> {
    pub scale: EffectiveScale,
    pub hide_selectors: &'a [String],
    pub show_selectors: &'a [String],
    pub config: &'a PrintConfig,
}

impl<'a> PrintStylesheet<'a> {
    pub fn new(
        scale: EffectiveScale,
        hide_selectors: &'a [String],
        show_selectors: &'a [String],
        config: &'a PrintConfig,
    ) -> Self {
        Self {
            scale,
            hide_selectors,
            show_selectors,
            config,
        }
    }

    /// `<hide,...> { display: none !important; }`, or `None` for an empty list
    pub fn hide_rule(&self) -> Option<String> {
        if self.hide_selectors.is_empty() {
            return None;
        }
        Some(format!(
            "{} {{ display: none !important; }}",
            self.hide_selectors.join(",")
        ))
    }

    /// `<show,...> { display: block !important; visibility: visible !important; }`,
    /// or `None` for an empty list
    pub fn show_rule(&self) -> Option<String> {
        if self.show_selectors.is_empty() {
            return None;
        }
        Some(format!(
            "{} {{ display: block !important; visibility: visible !important; }}",
            self.show_selectors.join(",")
        ))
    }

    /// Render the CSS text of the block (without the surrounding `<style>`)
    pub fn render(&self) -> String {
        let cfg = self.config;
        let mut lines: Vec<String> = Vec::with_capacity(16);
        lines.push("@media print {".to_string());
        lines.push(format!(
            "  body {{ {}: {}; transform-origin: top left; }}",
            SCALE_PROPERTY, self.scale
        ));
        lines.push(format!("  @supports not ({}) {{", SCALE_SUPPORT_TEST));
        lines.push(format!(
            "    body {{ transform: scale({}); width: {}%; }}",
            self.scale,
            self.scale.compensating_width_percent()
        ));
        lines.push("  }".to_string());
        if let Some(rule) = self.hide_rule() {
            lines.push(format!("  {}", rule));
        }
        if let Some(rule) = self.show_rule() {
            lines.push(format!("  {}", rule));
        }
        lines.push(format!(
            "  body {{ font-family: {}; font-size: {}px; color: #000; }}",
            cfg.font_family, cfg.font_size_px
        ));
        lines.push(format!(
            "  table * {{ font-size: {} !important; }}",
            cfg.table_font_size
        ));
        lines.push(format!(
            "  {} {{ overflow: visible !important; }}",
            cfg.responsive_table_selector
        ));
        lines.push(format!("  @page {{ margin: {}; }}", cfg.page_margin));
        lines.push("}".to_string());
        lines.join("\n")
    }
}

/// Characters that would let a selector close its rule block or the
/// surrounding `<style>` element
const FORBIDDEN_SELECTOR_CHARS: [char; 3] = ['{', '}', '<'];

/// Reject a selector that could escape its rule block or the `<style>`
/// element it is written into.
pub fn check_selector(selector: &str) -> Result<()> {
    if selector.contains(FORBIDDEN_SELECTOR_CHARS) {
        return Err(Error::InvalidSelector(selector.to_string()));
    }
    Ok(())
}

pub fn check_selectors(selectors: &[String]) -> Result<()> {
    selectors.iter().try_for_each(|sel| check_selector(sel))
}
