//! In-memory transports and rasters for tests.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use image::{ImageFormat, Rgba, RgbaImage};
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::transport::{FetchFuture, Transport};

/// Install a subscriber so `tracing` output shows up in failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// PNG of `width` x `height` pixels whose RGB channels pack `value` as a
/// 24-bit big-endian integer.
pub fn elevation_png(width: u32, height: u32, value: u32) -> Vec<u8> {
    let [_, r, g, b] = value.to_be_bytes();
    let image = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 0xFF]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

/// Routes metadata and raster requests to fixed bodies, recording every
/// URL.
#[derive(Debug)]
pub struct RoutingTransport {
    metadata: Result<Vec<u8>>,
    raster: Vec<u8>,
    urls: Mutex<Vec<String>>,
}

impl RoutingTransport {
    pub fn new(metadata: &[u8], raster: Vec<u8>) -> Self {
        Self {
            metadata: Ok(metadata.to_vec()),
            raster,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_metadata(status: u16, raster: Vec<u8>) -> Self {
        Self {
            metadata: Err(Error::HttpStatus {
                url: "metadata".to_string(),
                status,
            }),
            raster,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for RoutingTransport {
    fn get(&self, url: &str) -> FetchFuture<'_> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let body = if url.contains("/exportImage?") {
            Ok(self.raster.clone())
        } else {
            match &self.metadata {
                Ok(body) => Ok(body.clone()),
                Err(Error::HttpStatus { status, .. }) => Err(Error::HttpStatus {
                    url: url.to_string(),
                    status: *status,
                }),
                Err(e) => Err(Error::Http {
                    url: url.to_string(),
                    message: e.to_string(),
                }),
            }
        };
        Box::pin(async move { body })
    }
}

/// Answers requests in call order, each response held back until its gate
/// is opened.
#[derive(Debug)]
pub struct GatedTransport {
    responses: Mutex<VecDeque<(Result<Vec<u8>>, oneshot::Receiver<()>)>>,
    calls: AtomicUsize,
}

impl GatedTransport {
    /// Build a transport from `bodies`, returning the gate for each in the
    /// same order.
    pub fn new(bodies: Vec<Result<Vec<u8>>>) -> (Self, Vec<oneshot::Sender<()>>) {
        let mut responses = VecDeque::new();
        let mut gates = Vec::new();
        for body in bodies {
            let (tx, rx) = oneshot::channel();
            responses.push_back((body, rx));
            gates.push(tx);
        }
        let transport = Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        };
        (transport, gates)
    }

    /// Number of requests issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for GatedTransport {
    fn get(&self, url: &str) -> FetchFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let url = url.to_string();

        Box::pin(async move {
            let Some((body, gate)) = next else {
                return Err(Error::Http {
                    url,
                    message: "no scripted response".to_string(),
                });
            };
            let _ = gate.await;
            body
        })
    }
}
