use glam::Vec2;

/// Radial pull gain relative to gravity.
const ATTRACT_GAIN: f32 = 5.0;

/// Drag-along gain for pointer displacement since the previous frame.
const DRAG_GAIN: f32 = 0.5;

/// Pointer (cursor) stimulus state for the current frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerParams {
    /// World-space pointer position.
    pub position: Vec2,
    /// Attract button held.
    pub attract: bool,
}

/// Velocity impulse pulling a particle toward the pointer (Clavet force
/// stage).
///
/// Radial pull scaled by inverse distance inside the attract radius,
/// plus a drag-along term proportional to the pointer displacement since
/// the previous frame.
pub fn attract_impulse(
    pos: Vec2,
    pointer: &PointerParams,
    prev_position: Vec2,
    gravity: f32,
    attract_radius: f32,
    dt: f32,
) -> Vec2 {
    if !pointer.attract {
        return Vec2::ZERO;
    }
    let dir = pointer.position - pos;
    if dir == Vec2::ZERO {
        return Vec2::ZERO;
    }
    let dist_sq = dir.length_squared();
    if dist_sq >= attract_radius * attract_radius {
        return Vec2::ZERO;
    }

    let mut impulse = dir / dist_sq.sqrt() * ATTRACT_GAIN * gravity * dt;
    if pointer.position != prev_position {
        impulse += (pointer.position - prev_position) * gravity * DRAG_GAIN * dt;
    }
    impulse
}

/// Acceleration pulling a particle toward the pointer (PBF prediction).
pub fn attract_acceleration(
    pos: Vec2,
    pointer: &PointerParams,
    gravity: f32,
    attract_radius: f32,
) -> Vec2 {
    if !pointer.attract {
        return Vec2::ZERO;
    }
    let dir = pointer.position - pos;
    if dir == Vec2::ZERO {
        return Vec2::ZERO;
    }
    let dist_sq = dir.length_squared();
    if dist_sq >= attract_radius * attract_radius {
        return Vec2::ZERO;
    }
    dir / dist_sq.sqrt() * ATTRACT_GAIN * gravity
}
