//! The document viewer boundary.
//!
//! The viewer renders a paginated document and hosts annotation markers.
//! This crate never draws anything; it only tells the viewer where markers
//! go and asks it what a pointer landed on.

use crate::coords::{NormalizedPoint, to_pointer};
use crate::model::RoomId;
use kurbo::{Point, Size};

/// Default marker hit radius in page points (a 20×20 pin).
pub const DEFAULT_HIT_RADIUS: f64 = 10.0;

/// Identifies a marker placed by this crate.
///
/// Viewers may host other annotation kinds; only markers carrying one of
/// these tags are ever touched here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerTag {
    /// A saved room pin.
    Room(RoomId),
    /// The provisional pin shown while a new room awaits its name.
    Placement,
}

impl MarkerTag {
    pub fn room(&self) -> Option<RoomId> {
        match self {
            Self::Room(id) => Some(*id),
            Self::Placement => None,
        }
    }
}

/// Operations the document viewer exposes to the overlay.
pub trait DocumentViewer {
    /// Size of the current page in page points.
    fn current_page_size(&self) -> Size;

    /// Tagged marker under a pointer position (page points), if any.
    ///
    /// Room markers take precedence over the placement marker.
    fn hit_test(&self, point: Point) -> Option<MarkerTag>;

    /// Add a marker at a normalized position.
    fn add_marker(&mut self, at: NormalizedPoint, tag: MarkerTag);

    /// Remove the marker with `tag`. Removing an absent tag is a no-op.
    fn remove_marker(&mut self, tag: &MarkerTag);

    /// Tagged markers currently shown, with their positions.
    fn markers(&self) -> Vec<(MarkerTag, NormalizedPoint)>;
}

/// A headless viewer holding markers in memory.
///
/// Used when no rendering engine is attached, and in tests.
#[derive(Debug, Clone)]
pub struct MemoryViewer {
    page_size: Size,
    hit_radius: f64,
    /// Insertion order doubles as z-order (last is topmost).
    markers: Vec<(MarkerTag, NormalizedPoint)>,
    additions: usize,
    removals: usize,
}

impl MemoryViewer {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            hit_radius: DEFAULT_HIT_RADIUS,
            markers: Vec::new(),
            additions: 0,
            removals: 0,
        }
    }

    pub fn with_hit_radius(mut self, radius: f64) -> Self {
        self.hit_radius = radius;
        self
    }

    /// Switch to a page of a different size (e.g. after rotation).
    pub fn set_page_size(&mut self, page_size: Size) {
        self.page_size = page_size;
    }

    /// Total markers added since creation.
    pub fn additions(&self) -> usize {
        self.additions
    }

    /// Total markers removed since creation.
    pub fn removals(&self) -> usize {
        self.removals
    }
}

impl DocumentViewer for MemoryViewer {
    fn current_page_size(&self) -> Size {
        self.page_size
    }

    fn hit_test(&self, point: Point) -> Option<MarkerTag> {
        let radius_sq = self.hit_radius * self.hit_radius;
        self.markers
            .iter()
            .rev()
            .filter_map(|(tag, at)| {
                let center = to_pointer(*at, self.page_size);
                let dist_sq = (point - center).hypot2();
                (dist_sq <= radius_sq).then_some((tag, dist_sq))
            })
            .min_by(|a, b| {
                let rank = |tag: &MarkerTag| tag.room().is_none();
                rank(a.0).cmp(&rank(b.0)).then(a.1.total_cmp(&b.1))
            })
            .map(|(tag, _)| *tag)
    }

    fn add_marker(&mut self, at: NormalizedPoint, tag: MarkerTag) {
        self.markers.retain(|(t, _)| *t != tag);
        self.markers.push((tag, at));
        self.additions += 1;
    }

    fn remove_marker(&mut self, tag: &MarkerTag) {
        let before = self.markers.len();
        self.markers.retain(|(t, _)| t != tag);
        if self.markers.len() != before {
            self.removals += 1;
        }
    }

    fn markers(&self) -> Vec<(MarkerTag, NormalizedPoint)> {
        self.markers.clone()
    }
}
