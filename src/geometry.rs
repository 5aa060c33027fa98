pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    (ax - bx).hypot(ay - by)
}

/// Distance from `(px, py)` to the segment `(x1, y1)-(x2, y2)`; the
/// projection is clamped to the segment ends.
pub fn point_segment_distance(px: f32, py: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        return distance(px, py, x1, y1);
    }
    let t = (((px - x1) * dx + (py - y1) * dy) / length_sq).clamp(0.0, 1.0);
    distance(px, py, x1 + t * dx, y1 + t * dy)
}

/// Linear interpolation from `from` to `to` as `elapsed` runs over
/// `0..=duration`. A zero-length window yields `to`.
pub fn lerp_over(from: f32, to: f32, elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return to;
    }
    from + (to - from) * (elapsed / duration)
}
