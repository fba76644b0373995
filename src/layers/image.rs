use serde::{Deserialize, Serialize};

use crate::core::geo::{Extent, Projection};

/// A single georeferenced image stretched over an extent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLayer {
    url: String,
    extent: Extent,
    #[serde(default)]
    projection: Projection,
}

impl ImageLayer {
    pub fn new(url: impl Into<String>, extent: Extent) -> Self {
        Self {
            url: url.into(),
            extent,
            projection: Projection::WebMercator,
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }
}
