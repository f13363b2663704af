//! Figures placed after each page image and their visibility

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{MultiplexError, Result};
use crate::navigation::{NavigationGraph, ViewId};
use crate::render::RenderedView;

/// Visual state of a figure in the narrow layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Shown,
    Hidden,
}

/// A captioned view placed on the page
#[derive(Debug, Clone)]
pub struct Figure {
    pub view: RenderedView,
    pub visibility: Visibility,
}

impl Figure {
    pub fn id(&self) -> ViewId {
        self.view.id
    }
}

/// Holds every generated figure, grouped by source image in display order
#[derive(Debug, Default)]
pub struct ViewContainer {
    images: BTreeMap<usize, Vec<Figure>>,
}

impl ViewContainer {
    /// Place a view directly after its source image
    ///
    /// The newest figure sits closest to the image, so the full-image view,
    /// placed last, ends up first.
    pub fn place(&mut self, view: RenderedView, visibility: Visibility) {
        debug!("Placing figure {} ({:?})", view.id, visibility);
        self.images
            .entry(view.id.image_index())
            .or_default()
            .insert(0, Figure { view, visibility });
    }

    /// Figures of one image in display order
    pub fn figures(&self, image_index: usize) -> &[Figure] {
        self.images.get(&image_index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All figures, page order then display order
    pub fn iter(&self) -> impl Iterator<Item = &Figure> {
        self.images.values().flatten()
    }

    pub fn get(&self, id: ViewId) -> Option<&Figure> {
        self.figures(id.image_index()).iter().find(|f| f.id() == id)
    }

    /// Currently shown view of an image
    pub fn visible(&self, image_index: usize) -> Option<ViewId> {
        self.figures(image_index)
            .iter()
            .find(|f| f.visibility == Visibility::Shown)
            .map(Figure::id)
    }

    /// Number of placed figures
    pub fn len(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle a click on figure `id`: hide it and show its successor
    pub fn click(&mut self, graph: &NavigationGraph, id: ViewId) -> Result<ViewId> {
        let next = graph.resolve(id)?;
        if self.get(id).is_none() {
            return Err(MultiplexError::UnknownIdentifier(id.to_string()));
        }
        if self.get(next).is_none() {
            return Err(MultiplexError::UnknownIdentifier(next.to_string()));
        }

        self.set_visibility(id, Visibility::Hidden);
        self.set_visibility(next, Visibility::Shown);
        debug!("Click on {} shows {}", id, next);
        Ok(next)
    }

    /// Make `id` the only shown view of its image
    pub fn show(&mut self, id: ViewId) -> Result<()> {
        let figures = self
            .images
            .get_mut(&id.image_index())
            .filter(|figures| figures.iter().any(|f| f.id() == id))
            .ok_or_else(|| MultiplexError::UnknownIdentifier(id.to_string()))?;

        for figure in figures.iter_mut() {
            figure.visibility = if figure.id() == id {
                Visibility::Shown
            } else {
                Visibility::Hidden
            };
        }
        Ok(())
    }

    fn set_visibility(&mut self, id: ViewId, visibility: Visibility) {
        if let Some(figure) = self
            .images
            .get_mut(&id.image_index())
            .and_then(|figures| figures.iter_mut().find(|f| f.id() == id))
        {
            figure.visibility = visibility;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::CycleBuilder;
    use image::RgbaImage;

    fn view(id: ViewId) -> RenderedView {
        RenderedView {
            id,
            caption: id.to_string(),
            raster: RgbaImage::new(320, 10),
        }
    }

    fn page_with_regions(regions: usize) -> (ViewContainer, NavigationGraph) {
        let mut container = ViewContainer::default();
        let mut builder = CycleBuilder::new(0);
        for rank in 1..=regions {
            let id = ViewId::region(0, rank);
            builder.push(id);
            container.place(view(id), Visibility::Hidden);
        }
        let mut graph = NavigationGraph::default();
        graph.insert_cycle(builder.finish()).unwrap();
        container.place(view(ViewId::root(0)), Visibility::Shown);
        (container, graph)
    }

    #[test]
    fn test_display_order_newest_first() {
        let (container, _) = page_with_regions(2);
        let order: Vec<_> = container.figures(0).iter().map(|f| f.id().to_string()).collect();
        assert_eq!(order, vec!["1.", "1.2", "1.1"]);
        assert_eq!(container.len(), 3);
        assert!(!container.is_empty());
        assert!(ViewContainer::default().is_empty());
    }

    #[test]
    fn test_show_hides_other_views() {
        let (mut container, _) = page_with_regions(2);
        container.show(ViewId::region(0, 2)).unwrap();

        assert_eq!(container.visible(0), Some(ViewId::region(0, 2)));
        let shown = container
            .figures(0)
            .iter()
            .filter(|f| f.visibility == Visibility::Shown)
            .count();
        assert_eq!(shown, 1);

        assert!(container.show(ViewId::region(0, 5)).is_err());
        assert_eq!(container.visible(0), Some(ViewId::region(0, 2)));
    }

    #[test]
    fn test_click_cycles_through_views() {
        let (mut container, graph) = page_with_regions(2);
        assert_eq!(container.visible(0), Some(ViewId::root(0)));

        let mut current = ViewId::root(0);
        let mut visited = Vec::new();
        for _ in 0..3 {
            current = container.click(&graph, current).unwrap();
            visited.push(current.to_string());

            let shown: Vec<_> = container
                .figures(0)
                .iter()
                .filter(|f| f.visibility == Visibility::Shown)
                .collect();
            assert_eq!(shown.len(), 1);
            assert_eq!(shown[0].id(), current);
        }
        assert_eq!(visited, vec!["1.1", "1.2", "1."]);
    }

    #[test]
    fn test_click_without_regions_stays_on_root() {
        let (mut container, graph) = page_with_regions(0);
        let next = container.click(&graph, ViewId::root(0)).unwrap();
        assert_eq!(next, ViewId::root(0));
        assert_eq!(container.visible(0), Some(ViewId::root(0)));
    }

    #[test]
    fn test_click_unknown_leaves_state_untouched() {
        let (mut container, graph) = page_with_regions(1);
        let result = container.click(&graph, ViewId::region(0, 9));

        assert!(matches!(result, Err(MultiplexError::UnknownIdentifier(_))));
        assert_eq!(container.visible(0), Some(ViewId::root(0)));
    }
}
