//! Keeps the viewer's room markers in step with the capture store.
//!
//! Markers are diffed by room identity against what the viewer currently
//! shows. Rooms that did not change are never touched, so pins do not
//! flicker when unrelated state changes.

use crate::coords::NormalizedPoint;
use crate::model::{Room, RoomId};
use crate::viewer::{DocumentViewer, MarkerTag};
use std::collections::{HashMap, HashSet};

/// Marker changes needed to bring the viewer in line with a room set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayPatch {
    /// Room markers to remove, including markers of rooms whose pin moved.
    pub remove: Vec<RoomId>,
    /// Room markers to add, in room order.
    pub add: Vec<(RoomId, NormalizedPoint)>,
}

impl OverlayPatch {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }

    /// Total viewer operations this patch performs.
    pub fn len(&self) -> usize {
        self.remove.len() + self.add.len()
    }

    /// Apply the patch to a viewer: removals first, then additions.
    pub fn apply(&self, viewer: &mut dyn DocumentViewer) {
        for room in &self.remove {
            viewer.remove_marker(&MarkerTag::Room(*room));
        }
        for (room, at) in &self.add {
            viewer.add_marker(*at, MarkerTag::Room(*room));
        }
    }
}

/// Compute the patch taking `markers` to exactly one marker per room.
///
/// Markers not tagged as room markers are ignored. A room whose marker sits
/// at a different position is removed and re-added.
pub fn reconcile<'a>(
    markers: impl IntoIterator<Item = (MarkerTag, NormalizedPoint)>,
    rooms: impl IntoIterator<Item = &'a Room>,
) -> OverlayPatch {
    let shown: HashMap<RoomId, NormalizedPoint> = markers
        .into_iter()
        .filter_map(|(tag, at)| tag.room().map(|id| (id, at)))
        .collect();

    let mut patch = OverlayPatch::default();
    let mut wanted = HashSet::new();
    for room in rooms {
        if !wanted.insert(room.id) {
            continue;
        }
        match shown.get(&room.id) {
            Some(at) if at.approx_eq(&room.pin) => {}
            Some(_) => {
                patch.remove.push(room.id);
                patch.add.push((room.id, room.pin));
            }
            None => patch.add.push((room.id, room.pin)),
        }
    }

    let mut stale: Vec<RoomId> = shown
        .keys()
        .filter(|id| !wanted.contains(*id))
        .copied()
        .collect();
    stale.sort();
    patch.remove.extend(stale);
    patch
}

/// Drives marker updates for the active drawing.
///
/// Besides room markers it owns the single provisional placement marker
/// shown while a new room is waiting for its name.
#[derive(Debug, Default)]
pub struct OverlayReconciler {
    placement: Option<NormalizedPoint>,
    last_patch: OverlayPatch,
}

impl OverlayReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the viewer's room markers in line with `rooms`.
    ///
    /// `rooms` should be the full room set of the drawing shown in `viewer`.
    pub fn sync<'a>(
        &mut self,
        viewer: &mut dyn DocumentViewer,
        rooms: impl IntoIterator<Item = &'a Room>,
    ) -> &OverlayPatch {
        let patch = reconcile(viewer.markers(), rooms);
        if !patch.is_empty() {
            log::debug!(
                "Overlay patch: {} removed, {} added",
                patch.remove.len(),
                patch.add.len()
            );
        }
        patch.apply(viewer);
        self.last_patch = patch;
        &self.last_patch
    }

    /// Show, move, or clear the placement marker.
    pub fn set_placement(&mut self, viewer: &mut dyn DocumentViewer, at: Option<NormalizedPoint>) {
        match (self.placement, at) {
            (Some(current), Some(next)) if current.approx_eq(&next) => return,
            (None, None) => return,
            _ => {}
        }
        if self.placement.is_some() {
            viewer.remove_marker(&MarkerTag::Placement);
        }
        if let Some(next) = at {
            viewer.add_marker(next, MarkerTag::Placement);
        }
        self.placement = at;
    }

    pub fn placement(&self) -> Option<NormalizedPoint> {
        self.placement
    }

    /// The patch applied by the most recent [`sync`](Self::sync).
    pub fn last_patch(&self) -> &OverlayPatch {
        &self.last_patch
    }

    /// Remove every marker this reconciler placed, e.g. when switching drawings.
    pub fn clear(&mut self, viewer: &mut dyn DocumentViewer) {
        self.set_placement(viewer, None);
        self.sync(viewer, std::iter::empty());
    }
}
