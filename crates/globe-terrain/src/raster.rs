//! Raster source client.
//!
//! Requests elevation rasters and the service description from an
//! `ImageServer` endpoint. There is no caching; every call goes to the
//! transport.

use globe_terrain_decode::{Extent, RasterImage, RasterSize, decode_raster};

use crate::config::Endpoint;
use crate::error::{Error, Result};
use crate::metadata::ServiceMetadata;
use crate::transport::Transport;

/// Client for one image service endpoint.
#[derive(Debug)]
pub struct RasterSource<T> {
    endpoint: Endpoint,
    transport: T,
}

impl<T: Transport> RasterSource<T> {
    /// Create a client for `endpoint` over `transport`.
    #[must_use]
    pub fn new(endpoint: Endpoint, transport: T) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    /// The endpoint requests are built against.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Fetch a `size` raster covering `extent` and decode it to RGBA.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] or [`Error::HttpStatus`] if the request fails,
    /// and [`Error::Image`] if the body is not a readable image.
    pub async fn fetch_raster(&self, extent: &Extent, size: RasterSize) -> Result<RasterImage> {
        let url = self.endpoint.export_image_url(extent, size);
        let data = self.transport.get(&url).await?;

        let raster = decode_raster(&data).map_err(|source| Error::Image {
            url: url.clone(),
            source,
        })?;

        if raster.size() != size {
            tracing::debug!(
                url = %url,
                requested_width = size.width,
                requested_height = size.height,
                width = raster.width,
                height = raster.height,
                "raster size differs from request"
            );
        }

        Ok(raster)
    }

    /// Fetch and parse the service description.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the body is not valid JSON, or
    /// the service reports an error.
    pub async fn fetch_metadata(&self) -> Result<ServiceMetadata> {
        let url = self.endpoint.metadata_url();
        let data = self.transport.get(&url).await?;
        ServiceMetadata::from_json(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderOptions;
    use crate::error::ErrorKind;
    use crate::transport::FetchFuture;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Answers every request with the same body.
    struct FixedTransport(Vec<u8>);

    impl Transport for FixedTransport {
        fn get(&self, _url: &str) -> FetchFuture<'_> {
            let body = self.0.clone();
            Box::pin(async move { Ok(body) })
        }
    }

    fn source(body: Vec<u8>) -> RasterSource<FixedTransport> {
        let endpoint = ProviderOptions::new("https://example/ImageServer")
            .validate()
            .unwrap();
        RasterSource::new(endpoint, FixedTransport(body))
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([0, 0xFF, 0, 0xFF]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_fetch_raster() {
        let raster = source(png(8, 8))
            .fetch_raster(&Extent::MAX_VALUE, RasterSize::new(8, 8))
            .await
            .unwrap();
        assert_eq!(raster.size(), RasterSize::new(8, 8));
        assert!(raster.is_valid());
    }

    #[tokio::test]
    async fn test_malformed_image_is_fetch_error() {
        let err = source(b"<html>busy</html>".to_vec())
            .fetch_raster(&Extent::MAX_VALUE, RasterSize::DEFAULT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Image { .. }));
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[tokio::test]
    async fn test_fetch_metadata() {
        let metadata = source(br#"{ "copyrightText": "Esri" }"#.to_vec())
            .fetch_metadata()
            .await
            .unwrap();
        assert_eq!(metadata.copyright_text.as_deref(), Some("Esri"));
    }
}
