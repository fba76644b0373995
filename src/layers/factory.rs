use crate::{
    layers::{
        style::LayerStyle,
        vector::{Feature, VectorLayer, VectorSource},
        wrapper::LayerWrapper,
        Pending,
    },
    Result,
};

/// Options applied to a vector layer built by [`create_vector_layer`]
#[derive(Debug, Clone)]
pub struct VectorLayerOptions {
    pub style: LayerStyle,
    pub z_index: Option<i32>,
    pub visible: bool,
    pub opacity: f32,
    pub declutter: bool,
}

impl Default for VectorLayerOptions {
    fn default() -> Self {
        Self {
            style: LayerStyle::default(),
            z_index: None,
            visible: true,
            opacity: 1.0,
            declutter: false,
        }
    }
}

impl VectorLayerOptions {
    pub fn with_style(mut self, style: impl Into<LayerStyle>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }
}

/// Waits for `features`, then wraps them in a new vector layer.
///
/// A failed feature future fails the whole call; no layer is built.
pub async fn create_vector_layer(
    features: Pending<Vec<Feature>>,
    options: VectorLayerOptions,
    name: Option<&str>,
) -> Result<LayerWrapper> {
    let features = features.resolve().await?;

    #[cfg(feature = "debug")]
    log::debug!(
        "building vector layer {:?} with {} features",
        name,
        features.len()
    );

    let mut layer = VectorLayer::new(VectorSource::new(features), options.style);
    layer.declutter = options.declutter;

    let wrapper = LayerWrapper::vector(layer, name);
    {
        let mut renderable = wrapper.layer().write();
        renderable.properties.visible = options.visible;
        renderable.properties.opacity = options.opacity.clamp(0.0, 1.0);
        renderable.properties.z_index = options.z_index;
    }
    Ok(wrapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapError;
    use geo_types::point;

    #[tokio::test]
    async fn test_create_from_future() {
        let pending = Pending::from_future(async {
            Ok(vec![
                Feature::new(point!(x: 14_085_000.0, y: 3_960_000.0)),
                Feature::new(point!(x: 14_090_000.0, y: 3_965_000.0)),
            ])
        });
        let options = VectorLayerOptions {
            visible: false,
            ..VectorLayerOptions::default().with_z_index(4)
        };

        let wrapper = create_vector_layer(pending, options, Some("fields")).await.unwrap();

        assert_eq!(wrapper.features().unwrap().len(), 2);
        assert_eq!(wrapper.name(), Some("fields"));
        assert!(!wrapper.is_visible());
        assert_eq!(wrapper.layer().z_index(), Some(4));
    }

    #[tokio::test]
    async fn test_failed_future_builds_nothing() {
        let pending: Pending<Vec<Feature>> =
            Pending::from_future(async { Err(MapError::Decode("bad payload".to_string())) });

        let result = create_vector_layer(pending, VectorLayerOptions::default(), None).await;
        assert!(matches!(result, Err(MapError::Decode(_))));
    }
}
