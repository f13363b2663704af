//! Cyclic successor map between views

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::ViewId;
use crate::error::{MultiplexError, Result};

/// Successor links of one image, built one region at a time
#[derive(Debug)]
pub struct CycleBuilder {
    root: ViewId,
    previous: ViewId,
    links: Vec<(ViewId, ViewId)>,
}

impl CycleBuilder {
    /// Start a cycle at the root view of `image_index`
    pub fn new(image_index: usize) -> Self {
        let root = ViewId::root(image_index);
        Self {
            root,
            previous: root,
            links: Vec::new(),
        }
    }

    /// Link the next region in rank order
    pub fn push(&mut self, id: ViewId) {
        debug_assert_eq!(id.image_index(), self.root.image_index());
        self.links.push((self.previous, id));
        self.previous = id;
    }

    /// Close the cycle back to the root
    pub fn finish(mut self) -> ImageCycle {
        self.links.push((self.previous, self.root));
        ImageCycle {
            root: self.root,
            links: self.links,
        }
    }
}

/// Closed navigation cycle for one image
#[derive(Debug, Clone)]
pub struct ImageCycle {
    root: ViewId,
    links: Vec<(ViewId, ViewId)>,
}

impl ImageCycle {
    /// Number of views in the cycle, root included
    pub fn view_count(&self) -> usize {
        self.links.len()
    }
}

/// Page-wide map from each view to the view shown after it
///
/// Made of one disjoint cycle per image. Cycles are only ever added whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationGraph {
    next: BTreeMap<ViewId, ViewId>,
}

impl NavigationGraph {
    /// Insert a finished cycle in one step
    ///
    /// Fails without modifying the graph if any of its views is already
    /// linked, which would mean the image was analysed twice.
    pub fn insert_cycle(&mut self, cycle: ImageCycle) -> Result<()> {
        if let Some((from, _)) = cycle.links.iter().find(|(from, _)| self.next.contains_key(from)) {
            return Err(MultiplexError::DuplicateIdentifier(from.to_string()));
        }

        debug!("Linking {} views for image {}", cycle.view_count(), cycle.root);
        self.next.extend(cycle.links);
        Ok(())
    }

    /// View to show after `id` is clicked
    pub fn resolve(&self, id: ViewId) -> Result<ViewId> {
        self.next
            .get(&id)
            .copied()
            .ok_or_else(|| MultiplexError::UnknownIdentifier(id.to_string()))
    }

    /// Total number of linked views
    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    /// Views of one image in click order, starting at its root
    ///
    /// Fails with `BrokenCycle` if the walk leaves the image or does not get
    /// back to the root within `len()` steps, as a hand-edited map might.
    pub fn cycle(&self, image_index: usize) -> Result<Vec<ViewId>> {
        let root = ViewId::root(image_index);
        let mut views = vec![root];
        let mut current = self.resolve(root)?;
        while current != root {
            if views.len() >= self.next.len() || current.image_index() != image_index {
                return Err(MultiplexError::BrokenCycle(root.to_string()));
            }
            views.push(current);
            current = self.resolve(current)?;
        }
        Ok(views)
    }
}
