//! Access to the design-file provider.
//!
//! [`FileProvider`] is the seam between the pipeline and the remote API.
//! [`HttpClient`] implements it (and [`Transport`](crate::download::Transport))
//! over HTTPS; tests substitute their own implementations.

mod cache;
mod config;
mod http;

pub use cache::FileCache;
pub use config::{ClientConfig, API_BASE_ENV, DEFAULT_API_BASE, TOKEN_ENV};
pub use http::HttpClient;

use crate::error::Result;
use crate::model::FileDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

/// Operations the pipeline needs from the provider.
#[async_trait]
pub trait FileProvider: Send + Sync {
    /// Fetch the full document of a file.
    async fn file(&self, file_id: &str) -> Result<FileDocument>;

    /// Render `ids` and return a short-lived URL per id.
    ///
    /// The provider answers `None` for ids it could not render.
    async fn file_images(
        &self,
        file_id: &str,
        ids: &[String],
        params: &RenderParams,
    ) -> Result<HashMap<String, Option<String>>>;
}

/// Export formats supported by the render endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// JPEG
    Jpg,
    /// PNG
    #[default]
    Png,
    /// SVG markup
    Svg,
    /// PDF
    Pdf,
}

impl ImageFormat {
    /// Query-string value and file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Pdf => "pdf",
        }
    }

    /// Parse a format name (case insensitive, `jpeg` accepted).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpg),
            "png" => Some(ImageFormat::Png),
            "svg" => Some(ImageFormat::Svg),
            "pdf" => Some(ImageFormat::Pdf),
            _ => None,
        }
    }

    /// Check if the output is SVG markup.
    pub fn is_svg(&self) -> bool {
        matches!(self, ImageFormat::Svg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render options passed through to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Output format
    pub format: ImageFormat,

    /// Scale factor between 0.01 and 4 (raster formats)
    pub scale: Option<f32>,

    /// Emit node ids as `id` attributes in SVG output
    pub svg_include_id: bool,

    /// Simplify inside/outside strokes in SVG output
    pub svg_simplify_stroke: Option<bool>,

    /// Render with absolute bounds instead of cropping to contents
    pub use_absolute_bounds: Option<bool>,

    /// Render a specific file version
    pub version: Option<String>,
}

impl RenderParams {
    /// Create params for `format`.
    pub fn new(format: ImageFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Query-string pairs for the render request, excluding `ids`.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("format", self.format.as_str().to_string()),
            ("svg_include_id", self.svg_include_id.to_string()),
        ];
        if let Some(scale) = self.scale {
            query.push(("scale", scale.to_string()));
        }
        if let Some(simplify) = self.svg_simplify_stroke {
            query.push(("svg_simplify_stroke", simplify.to_string()));
        }
        if let Some(absolute) = self.use_absolute_bounds {
            query.push(("use_absolute_bounds", absolute.to_string()));
        }
        if let Some(version) = &self.version {
            query.push(("version", version.clone()));
        }
        query
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            scale: None,
            svg_include_id: true,
            svg_simplify_stroke: None,
            use_absolute_bounds: None,
            version: None,
        }
    }
}
