//! # Tessellation Engine
//!
//! Per-frame area of control via planar Voronoi tessellation.
//!
//! ## Algorithm
//! 1. A site on the convex hull of the frame (vertex or on a hull edge) has
//!    an unbounded cell and receives the fallback area pitch_area / n
//! 2. Every other cell is bounded and built by clipping a bounding square
//!    with the perpendicular-bisector half-plane towards each other site;
//!    the square grows while the cell still reaches it and is smaller
//!    than the pitch
//! 3. Cell area = polygon area, clamped to the pitch area
//!
//! Frames with fewer than 4 sites, collinear sites or coincident sites do
//! not tessellate. That is reported as a tagged outcome, never as an error.

use std::collections::BTreeMap;

use geo::{Area, ConvexHull, Coord, LineString, MultiPoint, Polygon};
use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::models::{FrameIndex, PitchDimensions, TrackingSample};

/// Minimum number of sites for a tessellation.
pub const MIN_TESSELLATION_SITES: usize = 4;

/// Relative tolerance for on-hull and on-box tests.
const GEOMETRY_EPS: f64 = 1e-9;

/// Growth factor of the bounding square while a cell still reaches it.
const SQUARE_GROWTH: f64 = 16.0;

/// Largest bounding-square half-size tried before the clipped cell is used as is.
const MAX_SQUARE_HALF: f64 = 1e12;

/// entity_id → controlled area in square meters.
pub type ControlledAreaMap = BTreeMap<u32, f64>;

/// One Voronoi cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiCell {
    pub entity_id: u32,
    pub site: Point2<f64>,
    /// Counter-clockwise cell vertices; `None` for unbounded or degenerate cells
    pub polygon: Option<Vec<Point2<f64>>>,
    /// Controlled area (fallback area for unbounded cells)
    pub area: f64,
}

impl VoronoiCell {
    pub fn is_bounded(&self) -> bool {
        self.polygon.is_some()
    }
}

/// All cells of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTessellation {
    pub cells: Vec<VoronoiCell>,
    /// Area assigned to unbounded/degenerate cells
    pub fallback_area: f64,
}

impl FrameTessellation {
    pub fn areas(&self) -> ControlledAreaMap {
        self.cells.iter().map(|c| (c.entity_id, c.area)).collect()
    }

    pub fn cell(&self, entity_id: u32) -> Option<&VoronoiCell> {
        self.cells.iter().find(|c| c.entity_id == entity_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegenerateReason {
    /// All sites lie on one line
    Collinear,
    /// Two entities share a position
    CoincidentSites,
    /// A coordinate is NaN or infinite
    NonFinite,
}

/// Result of tessellating one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TessellationOutcome {
    Computed(FrameTessellation),
    /// Legitimately sparse frame
    InsufficientPoints { found: usize },
    /// Input the geometry cannot handle
    Degenerate { reason: DegenerateReason },
}

impl TessellationOutcome {
    /// Area map; empty unless the tessellation was computed.
    pub fn areas(&self) -> ControlledAreaMap {
        match self {
            TessellationOutcome::Computed(t) => t.areas(),
            _ => ControlledAreaMap::new(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, TessellationOutcome::Computed(_))
    }
}

/// Cross product of (a - o) and (b - o).
#[inline]
fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull vertices in counter-clockwise order, without the closing vertex.
fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let multi: MultiPoint<f64> = points.iter().map(|p| geo::Point::new(p.x, p.y)).collect();
    let hull = multi.convex_hull();
    let mut vertices: Vec<Point2<f64>> = hull.exterior().coords().map(|c| Point2::new(c.x, c.y)).collect();
    vertices.pop();
    vertices
}

/// Unsigned polygon area.
pub fn polygon_area(vertices: &[Point2<f64>]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let ring: LineString<f64> = vertices.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(ring, vec![]).unsigned_area()
}

/// Whether `p` lies on the boundary of the convex polygon `hull`.
fn on_hull_boundary(p: &Point2<f64>, hull: &[Point2<f64>], tol: f64) -> bool {
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let edge = b - a;
        let len = edge.norm();
        if len == 0.0 {
            continue;
        }
        if cross(&a, &b, p).abs() > tol * len {
            continue;
        }
        let t = (p - a).dot(&edge) / (len * len);
        if (-GEOMETRY_EPS..=1.0 + GEOMETRY_EPS).contains(&t) {
            return true;
        }
    }
    false
}

/// Keep the part of a convex polygon where `normal · x <= offset`
/// (Sutherland–Hodgman against a single half-plane).
fn clip_half_plane(polygon: &[Point2<f64>], normal: &Vector2<f64>, offset: f64) -> Vec<Point2<f64>> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for i in 0..polygon.len() {
        let cur = polygon[i];
        let next = polygon[(i + 1) % polygon.len()];
        let d_cur = normal.dot(&cur.coords) - offset;
        let d_next = normal.dot(&next.coords) - offset;
        if d_cur <= 0.0 {
            out.push(cur);
        }
        // Strict sign change only: a vertex on the line is already kept
        if (d_cur < 0.0 && d_next > 0.0) || (d_cur > 0.0 && d_next < 0.0) {
            let t = d_cur / (d_cur - d_next);
            out.push(cur + (next - cur) * t);
        }
    }
    out
}

/// Axis-aligned square the interior cells are clipped from.
#[derive(Debug, Clone, Copy)]
struct BoundingSquare {
    center: Point2<f64>,
    half: f64,
}

impl BoundingSquare {
    fn grown(&self) -> Self {
        Self {
            center: self.center,
            half: self.half * SQUARE_GROWTH,
        }
    }

    fn around(sites: &[Point2<f64>], pitch: &PitchDimensions) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in sites {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let extent = (max_x - min_x).max(max_y - min_y);
        Self {
            center: Point2::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            half: 10.0 * (extent + pitch.length_m.max(pitch.width_m)),
        }
    }

    fn polygon(&self) -> Vec<Point2<f64>> {
        let (cx, cy, h) = (self.center.x, self.center.y, self.half);
        vec![
            Point2::new(cx - h, cy - h),
            Point2::new(cx + h, cy - h),
            Point2::new(cx + h, cy + h),
            Point2::new(cx - h, cy + h),
        ]
    }

    fn touches(&self, p: &Point2<f64>) -> bool {
        let margin = self.half * (1.0 - 1e-6);
        (p.x - self.center.x).abs() >= margin || (p.y - self.center.y).abs() >= margin
    }
}

/// `sites[idx]` clipped against every bisector, inside `square`.
fn clipped_cell(idx: usize, sites: &[Point2<f64>], square: &BoundingSquare) -> Option<Vec<Point2<f64>>> {
    let p = sites[idx];
    let mut polygon = square.polygon();
    for (j, q) in sites.iter().enumerate() {
        if j == idx {
            continue;
        }
        // |x - p|² <= |x - q|²  <=>  (q - p)·x <= (|q|² - |p|²) / 2
        let normal = q - p;
        let offset = (q.coords.norm_squared() - p.coords.norm_squared()) / 2.0;
        polygon = clip_half_plane(&polygon, &normal, offset);
        if polygon.len() < 3 {
            return None;
        }
    }
    Some(polygon)
}

/// Voronoi cell of an interior site, `None` only when clipping degenerates.
///
/// The cell of a site strictly inside the hull is bounded but can be far
/// larger than the pitch. While the clipped polygon still reaches the
/// square and is smaller than `max_area`, the square grows; once the
/// polygon covers `max_area` the clamp makes its exact extent irrelevant.
fn bounded_cell(
    idx: usize,
    sites: &[Point2<f64>],
    square: &BoundingSquare,
    max_area: f64,
) -> Option<Vec<Point2<f64>>> {
    let mut square = *square;
    loop {
        let polygon = clipped_cell(idx, sites, &square)?;
        let reaches_square = polygon.iter().any(|v| square.touches(v));
        if !reaches_square || polygon_area(&polygon) >= max_area || square.half >= MAX_SQUARE_HALF {
            return Some(polygon);
        }
        square = square.grown();
    }
}

/// Tessellate a set of (entity_id, position) sites.
///
/// # Arguments
/// * `sites` - One position per entity in the frame
/// * `pitch` - Pitch dimensions, bound the areas and define the fallback
/// * `min_sites` - Fewer sites yield `InsufficientPoints`
pub fn tessellate(sites: &[(u32, Point2<f64>)], pitch: &PitchDimensions, min_sites: usize) -> TessellationOutcome {
    let n = sites.len();
    if n < min_sites.max(3) {
        return TessellationOutcome::InsufficientPoints { found: n };
    }

    let points: Vec<Point2<f64>> = sites.iter().map(|(_, p)| *p).collect();
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return TessellationOutcome::Degenerate {
            reason: DegenerateReason::NonFinite,
        };
    }

    let square = BoundingSquare::around(&points, pitch);
    let scale = square.half.max(1.0);
    let tol = GEOMETRY_EPS * scale;

    for i in 0..n {
        for j in (i + 1)..n {
            if (points[i] - points[j]).norm() <= tol {
                return TessellationOutcome::Degenerate {
                    reason: DegenerateReason::CoincidentSites,
                };
            }
        }
    }

    let hull = convex_hull(&points);
    if hull.len() < 3 || polygon_area(&hull) <= tol * scale {
        return TessellationOutcome::Degenerate {
            reason: DegenerateReason::Collinear,
        };
    }

    let max_area = pitch.area();
    let fallback_area = max_area / n as f64;

    let cells = sites
        .iter()
        .enumerate()
        .map(|(idx, (entity_id, site))| {
            let polygon = if on_hull_boundary(site, &hull, tol) {
                None
            } else {
                bounded_cell(idx, &points, &square, max_area)
            };
            let area = match &polygon {
                Some(vertices) => polygon_area(vertices).min(max_area),
                None => fallback_area,
            };
            VoronoiCell {
                entity_id: *entity_id,
                site: *site,
                polygon,
                area,
            }
        })
        .collect();

    TessellationOutcome::Computed(FrameTessellation {
        cells,
        fallback_area,
    })
}

/// Tessellate every entity present in `frame`.
pub fn tessellate_frame(
    samples: &[TrackingSample],
    index: &FrameIndex,
    frame: u32,
    pitch: &PitchDimensions,
    min_sites: usize,
) -> TessellationOutcome {
    let sites: Vec<(u32, Point2<f64>)> = index
        .frame(samples, frame)
        .map(|s| (s.entity_id, s.position()))
        .collect();
    tessellate(&sites, pitch, min_sites)
}

/// Controlled-area map of one frame of a tracking table.
///
/// Empty when the frame has fewer than 4 entities or cannot be tessellated.
pub fn controlled_areas(samples: &[TrackingSample], frame: u32, pitch: &PitchDimensions) -> ControlledAreaMap {
    let sites: Vec<(u32, Point2<f64>)> = samples
        .iter()
        .filter(|s| s.frame == frame)
        .map(|s| (s.entity_id, s.position()))
        .collect();
    let outcome = tessellate(&sites, pitch, MIN_TESSELLATION_SITES);
    if let TessellationOutcome::Degenerate { reason } = &outcome {
        log::debug!("frame {}: no tessellation ({:?})", frame, reason);
    }
    outcome.areas()
}

/// Outcome counters, for telling sparse frames apart from geometry failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TessellationStats {
    pub computed: u32,
    pub insufficient: u32,
    pub degenerate: u32,
}

/// Memoised per-frame area maps over one tracking table.
pub struct AreaCache<'a> {
    samples: &'a [TrackingSample],
    index: FrameIndex,
    pitch: PitchDimensions,
    min_sites: usize,
    maps: FxHashMap<u32, ControlledAreaMap>,
    stats: TessellationStats,
}

impl<'a> AreaCache<'a> {
    pub fn new(samples: &'a [TrackingSample], pitch: PitchDimensions, min_sites: usize) -> Self {
        Self {
            samples,
            index: FrameIndex::build(samples),
            pitch,
            min_sites,
            maps: FxHashMap::default(),
            stats: TessellationStats::default(),
        }
    }

    fn ensure(&mut self, frame: u32) {
        if self.maps.contains_key(&frame) {
            return;
        }
        let outcome = tessellate_frame(self.samples, &self.index, frame, &self.pitch, self.min_sites);
        match &outcome {
            TessellationOutcome::Computed(_) => self.stats.computed += 1,
            TessellationOutcome::InsufficientPoints { .. } => self.stats.insufficient += 1,
            TessellationOutcome::Degenerate { reason } => {
                self.stats.degenerate += 1;
                log::debug!("frame {}: no tessellation ({:?})", frame, reason);
            }
        }
        self.maps.insert(frame, outcome.areas());
    }

    /// Area map of `frame`, tessellated at most once.
    pub fn areas(&mut self, frame: u32) -> &ControlledAreaMap {
        self.ensure(frame);
        &self.maps[&frame]
    }

    /// Area maps of two frames at once.
    pub fn pair(&mut self, first: u32, second: u32) -> (&ControlledAreaMap, &ControlledAreaMap) {
        self.ensure(first);
        self.ensure(second);
        (&self.maps[&first], &self.maps[&second])
    }

    pub fn stats(&self) -> TessellationStats {
        self.stats
    }

    pub fn pitch(&self) -> &PitchDimensions {
        &self.pitch
    }
}
