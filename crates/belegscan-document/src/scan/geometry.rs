// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour helpers for boundary detection: outer-contour ranking and closed
// polygon simplification.

use imageproc::contours::{BorderType, Contour};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

/// Area enclosed by a closed polygon, via the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as f64 * points[j].y as f64;
        area -= points[j].x as f64 * points[i].y as f64;
    }
    area.abs() / 2.0
}

/// Keep outermost borders only and rank them by enclosed area, largest first.
///
/// Holes and anything nested inside another shape are dropped. Equal areas
/// keep their discovery order.
pub fn rank_outer_contours(contours: Vec<Contour<i32>>) -> Vec<Vec<Point<i32>>> {
    let mut ranked: Vec<(f64, Vec<Point<i32>>)> = contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| (polygon_area(&c.points), c.points))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.into_iter().map(|(_, points)| points).collect()
}

/// Simplify a closed contour with Douglas-Peucker.
///
/// The tolerance is `epsilon_ratio` times the closed perimeter. The curve is
/// split at two mutually distant points (found by two farthest-point hops) and
/// each half is simplified as an open chain, so the arbitrary start of the
/// contour never survives as a spurious vertex.
///
/// Returns `None` for contours too small to form a polygon.
pub fn approximate_closed(points: &[Point<i32>], epsilon_ratio: f64) -> Option<Vec<Point<i32>>> {
    if points.len() < 3 {
        return None;
    }
    let perimeter = arc_length(points, true);
    let epsilon = epsilon_ratio * perimeter;
    if !(epsilon > 0.0) {
        return None;
    }

    let a = farthest_from(points, points[0]);
    let rotated: Vec<Point<i32>> = points[a..].iter().chain(&points[..a]).copied().collect();
    let b = farthest_from(&rotated, rotated[0]);
    if b == 0 {
        return None;
    }

    let first = &rotated[..=b];
    let mut second: Vec<Point<i32>> = rotated[b..].to_vec();
    second.push(rotated[0]);

    let mut simplified = approximate_polygon_dp(first, epsilon, false);
    simplified.pop();
    simplified.extend(approximate_polygon_dp(&second, epsilon, false));
    simplified.pop();
    simplified.dedup();
    Some(simplified)
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let dist = dx * dx + dy * dy;
        if dist > best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
