use crate::core::geo::TileCoord;

/// Anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    fn url(&self, coord: TileCoord) -> String;

    fn attribution(&self) -> &str;
}

/// Tile server addressed by a `{z}/{x}/{y}` URL template. An optional
/// `{s}` placeholder rotates through the subdomains.
#[derive(Debug, Clone)]
pub struct UrlTemplateSource {
    template: String,
    attribution: String,
    subdomains: Vec<String>,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>, attribution: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            attribution: attribution.into(),
            subdomains: vec!["a".into(), "b".into(), "c".into()],
        }
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if url.contains("{s}") && !self.subdomains.is_empty() {
            let idx = ((coord.x + coord.y) as usize) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[idx]);
        }
        url
    }

    fn attribution(&self) -> &str {
        &self.attribution
    }
}
