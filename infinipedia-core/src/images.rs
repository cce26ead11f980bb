//! Filling a page's image slots.

use crate::render::ImageSlot;
use crate::service::ImageService;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Display state of one image slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageState {
    #[default]
    Pending,
    Ready(String),
    Failed,
}

impl ImageState {
    /// Placeholder text shown instead of the image.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            ImageState::Pending => Some("Generating image..."),
            ImageState::Ready(_) => None,
            ImageState::Failed => Some("Image failed to load."),
        }
    }
}

/// States for every slot of a page, indexed by slot id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageStates(Vec<ImageState>);

impl ImageStates {
    /// All slots pending.
    pub fn pending(count: usize) -> Self {
        Self(vec![ImageState::Pending; count])
    }

    pub fn get(&self, id: usize) -> &ImageState {
        static PENDING: ImageState = ImageState::Pending;
        self.0.get(id).unwrap_or(&PENDING)
    }

    /// Record a result. Ids beyond the known slots are ignored.
    pub fn set(&mut self, id: usize, state: ImageState) {
        if let Some(slot) = self.0.get_mut(id) {
            *slot = state;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageState> {
        self.0.iter()
    }

    pub fn is_settled(&self) -> bool {
        self.0.iter().all(|s| *s != ImageState::Pending)
    }
}

/// Generate one slot's image. Failures are logged and become [`ImageState::Failed`].
pub async fn resolve_slot(service: &dyn ImageService, slot: &ImageSlot) -> ImageState {
    match service.generate(&slot.prompt, slot.aspect).await {
        Ok(url) => {
            debug!(slot = slot.id, "Image ready");
            ImageState::Ready(url)
        }
        Err(e) => {
            warn!(slot = slot.id, prompt = %slot.prompt, error = %e, "Image generation failed");
            ImageState::Failed
        }
    }
}

/// Fill every slot concurrently. One slot failing leaves the others alone.
pub async fn fill_all(service: Arc<dyn ImageService>, slots: &[ImageSlot]) -> ImageStates {
    let mut states = ImageStates::pending(slots.len());
    let mut pending: FuturesUnordered<_> = slots
        .iter()
        .map(|slot| {
            let service = service.clone();
            async move { (slot.id, resolve_slot(service.as_ref(), slot).await) }
        })
        .collect();

    while let Some((id, state)) = pending.next().await {
        states.set(id, state);
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ImagePlacement;
    use crate::service::AspectRatio;
    use crate::testing::MockImages;

    fn slot(id: usize, prompt: &str) -> ImageSlot {
        ImageSlot {
            id,
            prompt: prompt.to_string(),
            aspect: AspectRatio::Landscape,
            placement: ImagePlacement::Left,
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(ImageState::Pending.placeholder(), Some("Generating image..."));
        assert_eq!(ImageState::Failed.placeholder(), Some("Image failed to load."));
        assert_eq!(ImageState::Ready("u".into()).placeholder(), None);
    }

    #[test]
    fn test_states_ignore_unknown_ids() {
        let mut states = ImageStates::pending(1);
        states.set(5, ImageState::Failed);
        assert_eq!(states.get(5), &ImageState::Pending);
        assert!(!states.is_settled());
        states.set(0, ImageState::Failed);
        assert!(states.is_settled());
    }

    #[tokio::test]
    async fn test_fill_all_isolates_failures() {
        let images = Arc::new(MockImages::new().failing_on("broken"));
        let slots = vec![slot(0, "a tree"), slot(1, "a broken tree"), slot(2, "a lake")];

        let states = fill_all(images.clone(), &slots).await;

        assert!(matches!(states.get(0), ImageState::Ready(_)));
        assert_eq!(states.get(1), &ImageState::Failed);
        assert!(matches!(states.get(2), ImageState::Ready(_)));
        assert_eq!(images.prompts().len(), 3);
    }
}
