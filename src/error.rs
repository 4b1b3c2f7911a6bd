//! Error types for the visualizations.

use std::fmt;

/// Errors raised while wiring a visualization to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum VizError {
    /// The requested kind name matches no visualization.
    UnknownKind(String),
    /// The canvas element for a visualization is absent from the document.
    CanvasMissing(String),
    /// The browser refused the requested rendering context.
    ContextUnavailable(&'static str),
    /// Shader compilation or program linking failed.
    Shader(String),
    /// Any other error surfaced by a browser API.
    Js(String),
}

impl fmt::Display for VizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VizError::UnknownKind(name) => write!(f, "unknown visualization: {}", name),
            VizError::CanvasMissing(id) => write!(f, "canvas #{} not found", id),
            VizError::ContextUnavailable(ctx) => write!(f, "{} context not supported", ctx),
            VizError::Shader(log) => write!(f, "shader error: {}", log),
            VizError::Js(msg) => write!(f, "browser error: {}", msg),
        }
    }
}

impl std::error::Error for VizError {}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for VizError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        VizError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<VizError> for wasm_bindgen::JsValue {
    fn from(err: VizError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_subject() {
        assert_eq!(
            VizError::UnknownKind("fireworks".into()).to_string(),
            "unknown visualization: fireworks"
        );
        assert_eq!(
            VizError::CanvasMissing("graph-canvas".into()).to_string(),
            "canvas #graph-canvas not found"
        );
    }
}
