//! Image service description and attribution.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Logical width of the attribution artifact.
pub const ATTRIBUTION_WIDTH: u32 = 800;

/// Logical height of the attribution artifact.
pub const ATTRIBUTION_HEIGHT: u32 = 20;

/// WKID of WGS84 geographic coordinates.
const WKID_WGS84: u32 = 4326;

/// The parts of an `ImageServer?f=json` response this crate reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    /// Full extent of the service.
    #[serde(default)]
    pub extent: Option<ServiceExtent>,
    /// Copyright notice to show alongside the terrain.
    #[serde(default)]
    pub copyright_text: Option<String>,
    /// Native coordinate system of the service.
    #[serde(default)]
    pub spatial_reference: Option<SpatialReference>,
    /// Present when the service answered with an error body.
    #[serde(default)]
    error: Option<ServiceError>,
}

/// Extent of a service in its own coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceExtent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    #[serde(default)]
    pub spatial_reference: Option<SpatialReference>,
}

/// Coordinate system identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReference {
    #[serde(default)]
    pub wkid: Option<u32>,
    #[serde(default)]
    pub latest_wkid: Option<u32>,
}

impl SpatialReference {
    /// Whether this is WGS84 longitude/latitude.
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        self.latest_wkid.or(self.wkid) == Some(WKID_WGS84)
    }
}

/// Error body returned with a 200 status.
#[derive(Debug, Clone, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl ServiceMetadata {
    /// Parse a service description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the body is not JSON or carries an
    /// error object.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let mut metadata: Self = serde_json::from_slice(data)?;
        if let Some(error) = metadata.error.take() {
            return Err(Error::InvalidData {
                context: "service metadata",
                detail: format!(
                    "service error {}: {}",
                    error.code.map_or_else(|| "?".to_string(), |c| c.to_string()),
                    error.message.as_deref().unwrap_or("no message")
                ),
            });
        }
        Ok(metadata)
    }
}

/// Copyright notice laid out for an 800x20 credit strip.
///
/// Rendering the text is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Copyright text, empty if the service reports none.
    pub text: String,
    /// Logical width of the strip.
    pub width: u32,
    /// Logical height of the strip.
    pub height: u32,
}

impl Attribution {
    /// Create an attribution strip for `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            width: ATTRIBUTION_WIDTH,
            height: ATTRIBUTION_HEIGHT,
        }
    }
}

impl From<&ServiceMetadata> for Attribution {
    fn from(metadata: &ServiceMetadata) -> Self {
        Self::new(metadata.copyright_text.clone().unwrap_or_default())
    }
}
