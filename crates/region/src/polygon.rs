//! Planar intersection tests between a lon/lat rectangle and a ring.
//!
//! Boundary contact counts as intersection.

use sat_common::BoundingBox;

/// True when the closed rectangle and the ring share at least one point.
pub fn rect_intersects_ring(rect: &BoundingBox, ring: &[(f64, f64)]) -> bool {
    if ring.is_empty() {
        return false;
    }

    let (mut rmin_x, mut rmin_y) = (f64::INFINITY, f64::INFINITY);
    let (mut rmax_x, mut rmax_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in ring {
        rmin_x = rmin_x.min(x);
        rmin_y = rmin_y.min(y);
        rmax_x = rmax_x.max(x);
        rmax_y = rmax_y.max(y);
    }
    if rmax_x < rect.lon_min || rmin_x > rect.lon_max || rmax_y < rect.lat_min || rmin_y > rect.lat_max {
        return false;
    }

    // Ring vertex inside the rectangle
    if ring.iter().any(|&(x, y)| rect.contains_point(x, y)) {
        return true;
    }

    // Rectangle entirely inside the ring
    let corners = rect.corner_ring();
    if corners[..4].iter().any(|&p| point_in_ring(p, ring)) {
        return true;
    }

    // Crossing edges
    for edge in ring.windows(2) {
        for side in corners.windows(2) {
            if segments_intersect(edge[0], edge[1], side[0], side[1]) {
                return true;
            }
        }
    }

    false
}

/// Even-odd ray casting. Points exactly on an edge may fall either way;
/// callers cover the boundary with the segment test.
pub fn point_in_ring(p: (f64, f64), ring: &[(f64, f64)]) -> bool {
    let (px, py) = p;
    let mut inside = false;
    for edge in ring.windows(2) {
        let (x1, y1) = edge[0];
        let (x2, y2) = edge[1];
        if (y1 > py) != (y2 > py) {
            let x_cross = x1 + (py - y1) * (x2 - x1) / (y2 - y1);
            if px < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn orientation(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

/// Closed segment intersection, collinear overlap and touching included.
pub fn segments_intersect(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0)) {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
