//! State shared by all per-image pipelines

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::error::Result;
use crate::navigation::{ImageCycle, NavigationGraph, ViewId};
use crate::page::{ViewContainer, Visibility};
use crate::render::RenderedView;
use crate::shared::progress::BusyIndicator;

/// Navigation map, placed figures and busy indicator of one page
///
/// Pipelines of different images write disjoint identifiers. Each one
/// publishes its cycle before its figures, so a visible figure always has a
/// complete cycle behind it.
#[derive(Debug, Default)]
pub struct SharedPageState {
    /// Page-wide successor map
    pub graph: RwLock<NavigationGraph>,
    /// Figures placed after their source images
    pub container: Mutex<ViewContainer>,
    /// Images still in flight
    pub busy: Arc<BusyIndicator>,
}

impl SharedPageState {
    /// State of an already multiplexed page, e.g. read back from disk
    pub fn from_parts(graph: NavigationGraph, container: ViewContainer) -> Self {
        Self {
            graph: RwLock::new(graph),
            container: Mutex::new(container),
            busy: Arc::default(),
        }
    }

    /// Publish one image's cycle and views
    ///
    /// Region views are placed hidden in rank order, then the full-image view
    /// is placed shown.
    pub fn publish(&self, cycle: ImageCycle, regions: Vec<RenderedView>, full: RenderedView) -> Result<()> {
        self.graph.write().insert_cycle(cycle)?;

        let mut container = self.container.lock();
        for view in regions {
            container.place(view, Visibility::Hidden);
        }
        container.place(full, Visibility::Shown);
        Ok(())
    }

    /// Route a click through the graph and update visibility
    pub fn click(&self, id: ViewId) -> Result<ViewId> {
        let graph = self.graph.read();
        self.container.lock().click(&graph, id)
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
            caption: String::new(),
            raster: RgbaImage::new(320, 1),
        }
    }

    #[test]
    fn test_publish_and_click() {
        let state = SharedPageState::default();
        let mut builder = CycleBuilder::new(1);
        builder.push(ViewId::region(1, 1));

        state
            .publish(builder.finish(), vec![view(ViewId::region(1, 1))], view(ViewId::root(1)))
            .unwrap();

        assert_eq!(state.container.lock().visible(1), Some(ViewId::root(1)));
        assert_eq!(state.click(ViewId::root(1)).unwrap(), ViewId::region(1, 1));
        assert_eq!(state.click(ViewId::region(1, 1)).unwrap(), ViewId::root(1));
    }

    #[test]
    fn test_duplicate_publish_places_nothing() {
        let state = SharedPageState::default();
        state
            .publish(CycleBuilder::new(0).finish(), vec![], view(ViewId::root(0)))
            .unwrap();

        let result = state.publish(CycleBuilder::new(0).finish(), vec![], view(ViewId::root(0)));
        assert!(result.is_err());
        assert_eq!(state.container.lock().len(), 1);
    }

    #[test]
    fn test_from_parts_routes_clicks() {
        let mut builder = CycleBuilder::new(0);
        builder.push(ViewId::region(0, 1));
        let mut graph = NavigationGraph::default();
        graph.insert_cycle(builder.finish()).unwrap();

        let mut container = ViewContainer::default();
        container.place(view(ViewId::region(0, 1)), Visibility::Hidden);
        container.place(view(ViewId::root(0)), Visibility::Shown);

        let state = SharedPageState::from_parts(graph, container);
        assert_eq!(state.click(ViewId::root(0)).unwrap(), ViewId::region(0, 1));
        assert_eq!(state.container.lock().visible(0), Some(ViewId::region(0, 1)));
        assert_eq!(state.busy.pending(), 0);
    }
}
