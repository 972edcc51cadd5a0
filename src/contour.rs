// Hand mask -> finger count and fingertip.
// The hand is taken to be the largest outer boundary in the mask. Valleys
// between extended fingers show up as deep, narrow convexity defects of that
// boundary; counting them (plus an assumed thumb) gives the finger count.
// With a single finger up, the pen position is the centroid of the hull.

use imageproc::contours::{BorderType, find_contours};

use crate::config::{ASSUMED_THUMB, DEFAULT_MIN_DEFECT_DEPTH, MAX_FINGER_COUNT, MAX_GAP_ANGLE_DEG};
use crate::types::{Contour, HandMask, Point2D};

/// A concavity between two consecutive hull vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexityDefect {
    /// Contour index of the hull vertex where the concavity starts.
    pub start: usize,
    /// Contour index of the hull vertex where it ends.
    pub end: usize,
    /// Contour index of the point farthest from the hull edge.
    pub far: usize,
    /// Distance (pixels) from `far` to the hull edge.
    pub depth: f64,
}

/// Thresholds for turning defects into finger gaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    pub min_defect_depth: f64,
    pub max_gap_angle_deg: f64,
    pub assumed_thumb: u8,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_defect_depth: DEFAULT_MIN_DEFECT_DEPTH,
            max_gap_angle_deg: MAX_GAP_ANGLE_DEG,
            assumed_thumb: ASSUMED_THUMB,
        }
    }
}

/// Everything derived from one mask.
#[derive(Debug, Clone)]
pub struct HandShape {
    pub contour: Contour,
    /// Hull vertices as contour indices, in contour order.
    pub hull: Vec<usize>,
    pub defects: Vec<ConvexityDefect>,
    pub finger_count: u8,
    /// Hull centroid, only when exactly one finger is counted.
    pub fingertip: Option<Point2D>,
}

pub struct ContourAnalyzer {
    config: AnalyzerConfig,
}

impl ContourAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// `None` when the mask holds no boundary at all ("no hand observed").
    pub fn analyze(&self, mask: &HandMask) -> Option<HandShape> {
        let contour = largest_outer_contour(mask)?;
        let hull = convex_hull_indices(&contour);
        // Fewer than three hull vertices: no defects, but still a hand.
        let defects = convexity_defects(&contour, &hull);

        let gaps = defects
            .iter()
            .filter(|d| {
                gap_angle(contour[d.start], contour[d.end], contour[d.far])
                    .is_some_and(|angle| self.is_finger_gap(angle, d.depth))
            })
            .count();
        let finger_count = self.finger_count(gaps);

        let fingertip = if finger_count == 1 {
            let hull_points: Vec<Point2D> = hull.iter().map(|&i| contour[i]).collect();
            polygon_centroid(&hull_points)
        } else {
            None
        };

        Some(HandShape { contour, hull, defects, finger_count, fingertip })
    }

    /// Narrow (angle in radians) and deep enough to be the valley between two fingers.
    pub fn is_finger_gap(&self, angle: f64, depth: f64) -> bool {
        angle <= self.config.max_gap_angle_deg.to_radians() && depth > self.config.min_defect_depth
    }

    /// Gaps plus the assumed thumb, capped so the count stays in range.
    pub fn finger_count(&self, gaps: usize) -> u8 {
        let thumb = self.config.assumed_thumb.min(MAX_FINGER_COUNT);
        let room = (MAX_FINGER_COUNT - thumb) as usize;
        gaps.min(room) as u8 + thumb
    }
}

impl Default for ContourAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

/// Signed shoelace area; the sign follows the traversal direction.
pub fn signed_area(points: &[Point2D]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
    }
    twice / 2.0
}

/// Biggest (by enclosed area) outer boundary of the non-zero region(s).
pub fn largest_outer_contour(mask: &HandMask) -> Option<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && !c.points.is_empty())
        .map(|c| c.points.into_iter().map(|p| Point2D::new(p.x, p.y)).collect::<Contour>())
        .map(|c| (signed_area(&c).abs(), c))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c)
}

#[inline]
fn cross(o: Point2D, a: Point2D, b: Point2D) -> i64 {
    (i64::from(a.x) - i64::from(o.x)) * (i64::from(b.y) - i64::from(o.y))
        - (i64::from(a.y) - i64::from(o.y)) * (i64::from(b.x) - i64::from(o.x))
}

/// Convex hull as indices into `points` (monotone chain, collinear points
/// dropped), returned in ascending index order so consecutive entries follow
/// the boundary.
pub fn convex_hull_indices(points: &[Point2D]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (points[i].x, points[i].y));
    order.dedup_by_key(|i| points[*i]);
    if order.len() < 3 {
        return order;
    }

    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2
            && cross(points[lower[lower.len() - 2]], points[lower[lower.len() - 1]], points[i]) <= 0
        {
            lower.pop();
        }
        lower.push(i);
    }
    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2
            && cross(points[upper[upper.len() - 2]], points[upper[upper.len() - 1]], points[i]) <= 0
        {
            upper.pop();
        }
        upper.push(i);
    }
    // Last point of each chain is the first of the other.
    lower.pop();
    upper.pop();
    lower.extend(upper);

    lower.sort_unstable();
    lower.dedup();
    lower
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
fn distance_to_line(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let len = a.distance_to(&b);
    if len == 0.0 {
        return p.distance_to(&a);
    }
    (cross(a, b, p) as f64).abs() / len
}

/// Deepest contour point between each pair of consecutive hull vertices.
/// Degenerate hulls (fewer than three vertices) have no defects.
pub fn convexity_defects(contour: &[Point2D], hull: &[usize]) -> Vec<ConvexityDefect> {
    let n = contour.len();
    if hull.len() < 3 || n < 3 {
        return Vec::new();
    }

    let mut defects = Vec::new();
    for (k, &start) in hull.iter().enumerate() {
        let end = hull[(k + 1) % hull.len()];
        // Walk forward along the contour, wrapping past the last index.
        let stop = if end > start { end } else { end + n };
        let (a, b) = (contour[start], contour[end]);

        let mut far = None;
        let mut depth = 0.0;
        for j in (start + 1)..stop {
            let idx = j % n;
            let d = distance_to_line(contour[idx], a, b);
            if d > depth {
                depth = d;
                far = Some(idx);
            }
        }
        if let Some(far) = far {
            defects.push(ConvexityDefect { start, end, far, depth });
        }
    }
    defects
}

/// Angle at `far` in the triangle (start, end, far), law of cosines.
/// `None` when `far` coincides with either end (the angle is undefined).
pub fn gap_angle(start: Point2D, end: Point2D, far: Point2D) -> Option<f64> {
    let a = start.distance_to(&far);
    let b = end.distance_to(&far);
    let c = start.distance_to(&end);
    if a == 0.0 || b == 0.0 {
        return None;
    }
    let cos = ((a * a + b * b - c * c) / (2.0 * a * b)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// Area-weighted centroid of a closed polygon (first-order moments over the
/// zeroth). `None` when the polygon encloses no area.
pub fn polygon_centroid(points: &[Point2D]) -> Option<Point2D> {
    if points.len() < 3 {
        return None;
    }
    let (mut m00, mut m10, mut m01) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let (x0, y0, x1, y1) = (f64::from(p.x), f64::from(p.y), f64::from(q.x), f64::from(q.y));
        let c = x0 * y1 - x1 * y0;
        m00 += c;
        m10 += (x0 + x1) * c;
        m01 += (y0 + y1) * c;
    }
    m00 /= 2.0;
    if m00.abs() < f64::EPSILON {
        return None;
    }
    m10 /= 6.0;
    m01 /= 6.0;
    Some(Point2D::new((m10 / m00) as i32, (m01 / m00) as i32))
}
