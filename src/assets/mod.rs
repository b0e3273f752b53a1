//! Asynchronous texture loading.
//!
//! A texture load is a single-shot fetch-and-decode: one HTTP GET, one image
//! decode, no retries. Loads are spawned on the session's background runtime
//! and completions cross back to the session thread through a channel, so an
//! entity can sit in the graph with its placeholder material until its pixels
//! arrive.

use std::sync::mpsc;

use thiserror::Error;

use crate::scene::EntityId;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("texture decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded RGBA8 pixels ready for GPU upload.
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Fetches `url` and decodes it into RGBA8.
pub async fn fetch_texture(
    http: &reqwest::Client,
    url: &str,
) -> Result<TextureData, TextureError> {
    let bytes = http.get(url).send().await?.error_for_status()?.bytes().await?;
    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    Ok(TextureData {
        width,
        height,
        rgba: decoded.into_raw(),
    })
}

/// A finished texture load, tagged with the entity it resolves for.
pub struct TextureArrival {
    pub entity: EntityId,
    pub url: String,
    pub result: Result<TextureData, TextureError>,
}

/// Session-side mailbox for finished loads. The sender half is cloned into
/// each spawned fetch task; the session drains the receiver at the start of
/// every tick.
pub struct TextureInbox {
    tx: mpsc::Sender<TextureArrival>,
    rx: mpsc::Receiver<TextureArrival>,
}

impl TextureInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> mpsc::Sender<TextureArrival> {
        self.tx.clone()
    }

    /// All arrivals since the last drain, in completion order.
    pub fn drain(&self) -> Vec<TextureArrival> {
        let mut out = Vec::new();
        while let Ok(arrival) = self.rx.try_recv() {
            out.push(arrival);
        }
        out
    }
}

impl Default for TextureInbox {
    fn default() -> Self {
        Self::new()
    }
}
