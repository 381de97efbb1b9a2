use super::source::TileSource;
use crate::core::geo::TileCoord;
use crate::runtime::AsyncSpawner;
use crossbeam_channel::{unbounded, Receiver, Sender};
use egui::ColorImage;
use std::sync::Arc;

/// A finished tile request
#[derive(Debug)]
pub struct TileResponse {
    pub coord: TileCoord,
    pub result: Result<ColorImage, String>,
}

/// Fetches tiles on the runtime and sends the decoded images back over a
/// channel drained by the UI thread.
pub struct TileLoader {
    client: reqwest::Client,
    source: Arc<dyn TileSource>,
    spawner: Arc<dyn AsyncSpawner>,
    pub(crate) tx: Sender<TileResponse>,
    repaint: Option<egui::Context>,
}

impl TileLoader {
    pub fn new(
        source: Arc<dyn TileSource>,
        user_agent: &str,
        spawner: Arc<dyn AsyncSpawner>,
    ) -> crate::Result<(Self, Receiver<TileResponse>)> {
        // Public tile servers reject requests without a descriptive User-Agent
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        let (tx, rx) = unbounded();
        Ok((
            Self {
                client,
                source,
                spawner,
                tx,
                repaint: None,
            },
            rx,
        ))
    }

    /// Repaint `ctx` whenever a tile arrives
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    /// Starts downloading `coord`. The response always arrives on the
    /// channel, successful or not.
    pub fn fetch(&self, coord: TileCoord) {
        let url = self.source.url(coord);
        let client = self.client.clone();
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();

        self.spawner.spawn(async move {
            log::debug!("fetch tile {:?} from {}", coord, url);
            let result = match download(&client, &url).await {
                Ok(bytes) => decode_tile(&bytes),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                log::warn!("tile {:?} failed: {}", coord, e);
            }
            let _ = tx.send(TileResponse { coord, result });
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

/// Decodes PNG/JPEG tile bytes into an egui image
pub fn decode_tile(bytes: &[u8]) -> Result<ColorImage, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
