//! Provider configuration.
//!
//! [`ProviderOptions`] is the unvalidated input, buildable in code or
//! deserialized from a config file. [`Endpoint`] is the validated form that
//! builds every request URL.

use std::fmt;
use std::sync::Arc;

use globe_terrain_decode::{Extent, RasterSize};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Rewrites request URLs, e.g. to route them through a CORS proxy.
pub trait Proxy: Send + Sync + fmt::Debug {
    /// Return the URL to actually request in place of `url`.
    fn rewrite(&self, url: &str) -> String;
}

/// A proxy that passes the target as the percent-encoded query string of a
/// fixed prefix: `{prefix}?{encoded url}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixProxy {
    prefix: String,
}

impl PrefixProxy {
    /// Create a proxy for the given prefix URL.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Proxy for PrefixProxy {
    fn rewrite(&self, url: &str) -> String {
        format!("{}?{}", self.prefix, urlencoding::encode(url))
    }
}

/// Construction input for a [`crate::Provider`].
///
/// # Example
///
/// ```
/// use globe_terrain::ProviderOptions;
///
/// let options: ProviderOptions = serde_json::from_str(
///     r#"{ "url": "https://example.com/arcgis/rest/services/Elevation/ImageServer" }"#,
/// )
/// .unwrap();
/// assert!(options.token.is_none());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderOptions {
    /// Base URL of the image service. Required.
    #[serde(default)]
    pub url: Option<String>,
    /// Authorization token appended to every request.
    #[serde(default)]
    pub token: Option<String>,
    /// URL rewriter applied after the token is appended.
    #[serde(skip)]
    pub proxy: Option<Arc<dyn Proxy>>,
}

impl ProviderOptions {
    /// Options for the service at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Set the authorization token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Proxy + 'static) -> Self {
        self.proxy = Some(Arc::new(proxy));
        self
    }

    /// Validate the options into an [`Endpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the URL is missing, blank, or not
    /// an absolute http(s) URL.
    pub fn validate(&self) -> Result<Endpoint> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Configuration {
                detail: "url is required".to_string(),
            })?;

        let parsed = reqwest::Url::parse(url).map_err(|e| Error::Configuration {
            detail: format!("url {url:?} is not valid: {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Configuration {
                detail: format!("url {url:?} must use http or https"),
            });
        }

        Ok(Endpoint {
            base_url: url.trim_end_matches('/').to_string(),
            token: self.token.clone().filter(|t| !t.is_empty()),
            proxy: self.proxy.clone(),
        })
    }
}

/// A validated image service endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: String,
    token: Option<String>,
    proxy: Option<Arc<dyn Proxy>>,
}

impl Endpoint {
    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the service's JSON description.
    #[must_use]
    pub fn metadata_url(&self) -> String {
        self.finish(format!("{}?f=json", self.base_url))
    }

    /// URL of an `exportImage` request for `extent` at `size` pixels.
    #[must_use]
    pub fn export_image_url(&self, extent: &Extent, size: RasterSize) -> String {
        let [west, south, east, north] = extent.to_degrees().map(format_coordinate);
        self.finish(format!(
            "{}/exportImage?format=tiff&f=image&size={},{}&bbox={west},{south},{east},{north}",
            self.base_url, size.width, size.height
        ))
    }

    /// Append the token, then apply the proxy.
    fn finish(&self, mut url: String) -> String {
        if let Some(token) = &self.token {
            url.push_str("&token=");
            url.push_str(&urlencoding::encode(token));
        }
        match &self.proxy {
            Some(proxy) => proxy.rewrite(&url),
            None => url,
        }
    }
}

/// Degrees rounded to nine decimals, so `-180.00000000000003` prints as
/// `-180`.
fn format_coordinate(degrees: f64) -> String {
    // Adding zero turns -0 into 0.
    let rounded = (degrees * 1e9).round() / 1e9 + 0.0;
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url() {
        let err = ProviderOptions::default().validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = ProviderOptions::new("   ").validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_invalid_url() {
        let err = ProviderOptions::new("not a url").validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        let err = ProviderOptions::new("ftp://example/ImageServer")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_export_image_url() {
        let endpoint = ProviderOptions::new("https://example/ImageServer/")
            .validate()
            .unwrap();
        let url = endpoint.export_image_url(
            &Extent::from_degrees(-180.0, -90.0, 0.0, 90.0),
            RasterSize::DEFAULT,
        );
        assert_eq!(
            url,
            "https://example/ImageServer/exportImage?format=tiff&f=image&size=256,256&bbox=-180,-90,0,90"
        );
    }

    #[test]
    fn test_token_is_appended_last() {
        let endpoint = ProviderOptions::new("https://example/ImageServer")
            .with_token("T")
            .validate()
            .unwrap();
        let url = endpoint.export_image_url(&Extent::MAX_VALUE, RasterSize::DEFAULT);
        assert!(url.ends_with("&token=T"));
        assert_eq!(
            endpoint.metadata_url(),
            "https://example/ImageServer?f=json&token=T"
        );
    }

    #[test]
    fn test_proxy_rewrites_after_token() {
        let endpoint = ProviderOptions::new("https://example/ImageServer")
            .with_token("T")
            .with_proxy(PrefixProxy::new("https://proxy/"))
            .validate()
            .unwrap();
        assert_eq!(
            endpoint.metadata_url(),
            "https://proxy/?https%3A%2F%2Fexample%2FImageServer%3Ff%3Djson%26token%3DT"
        );
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(-180.0 - 3e-14), "-180");
        assert_eq!(format_coordinate(-0.0), "0");
        assert_eq!(format_coordinate(12.5), "12.5");
    }

    #[test]
    fn test_deserialize_options() {
        let options: ProviderOptions =
            serde_json::from_str(r#"{ "url": "https://example/ImageServer", "token": "abc" }"#)
                .unwrap();
        let endpoint = options.validate().unwrap();
        assert_eq!(endpoint.base_url(), "https://example/ImageServer");
        assert!(endpoint.metadata_url().ends_with("&token=abc"));

        let options: ProviderOptions = serde_json::from_str("{}").unwrap();
        assert!(options.validate().is_err());
    }
}
