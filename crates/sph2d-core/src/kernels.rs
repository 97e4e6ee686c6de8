use glam::Vec2;
use std::f32::consts::PI;

/// SPH smoothing kernels, precomputed for a fixed smoothing radius `h`.
///
/// Every kernel is a pure function of the two point positions: it returns
/// `0.0` (or `Vec2::ZERO`) outside the support radius and is safe to
/// evaluate at zero separation.
pub struct Kernels {
    radius: f32,
    radius_sq: f32,
    poly6_norm: f32,
    poly6_gradient_norm: f32,
    spiky_norm: f32,
    spiky_gradient_norm: f32,
    viscosity_laplacian_norm: f32,
}

impl Kernels {
    pub fn new(smoothing_radius: f32) -> Self {
        let h = smoothing_radius;
        let h6 = h.powi(6);
        let h9 = h.powi(9);
        Self {
            radius: h,
            radius_sq: h * h,
            poly6_norm: 315.0 / (64.0 * PI * h9),
            poly6_gradient_norm: 945.0 / (32.0 * PI * h9),
            spiky_norm: 15.0 / (PI * h6),
            spiky_gradient_norm: -45.0 / (PI * h6),
            viscosity_laplacian_norm: 45.0 / (PI * h6),
        }
    }

    /// Smoothing radius this kernel set was built for.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Poly6 density kernel: `315 / (64 pi h^9) * (h^2 - r^2)^3` for
    /// `r < h`, else `0.0`.
    #[inline]
    pub fn poly6(&self, pos: Vec2, neighbour: Vec2) -> f32 {
        let f = self.radius_sq - (pos - neighbour).length_squared();
        if f < 0.0 {
            return 0.0;
        }
        self.poly6_norm * f * f * f
    }

    /// Gradient of the poly6 kernel with respect to `pos`.
    #[inline]
    pub fn poly6_gradient(&self, pos: Vec2, neighbour: Vec2) -> Vec2 {
        let r = pos - neighbour;
        let f = self.radius_sq - r.length_squared();
        if f < 0.0 {
            return Vec2::ZERO;
        }
        self.poly6_gradient_norm * f * f * -r
    }

    /// Poly6 evaluated at the tensile reference distance `delta_q`
    /// (`|delta_q|^2 = 0.1 h^2`).
    #[inline]
    pub fn poly6_delta_q(&self) -> f32 {
        let f = self.radius_sq - 0.1 * self.radius_sq;
        self.poly6_norm * f * f * f
    }

    /// Spiky pressure kernel: `15 / (pi h^6) * (h - r)^3` for `r < h`,
    /// else `0.0`.
    #[inline]
    pub fn spiky(&self, pos: Vec2, neighbour: Vec2) -> f32 {
        let f = self.radius - (pos - neighbour).length();
        if f < 0.0 {
            return 0.0;
        }
        self.spiky_norm * f * f * f
    }

    /// Gradient of the spiky kernel.
    ///
    /// Returns `Vec2::ZERO` at zero separation (the unit vector is
    /// undefined there) and once `r >= h`.
    #[inline]
    pub fn spiky_gradient(&self, pos: Vec2, neighbour: Vec2) -> Vec2 {
        let r = pos - neighbour;
        if r == Vec2::ZERO || self.radius_sq - r.length_squared() < 0.0 {
            return Vec2::ZERO;
        }
        let r_len = r.length();
        let f = self.radius - r_len;
        self.spiky_gradient_norm * f * f * r / r_len
    }

    /// Viscosity kernel, zero outside support and at zero separation.
    #[inline]
    pub fn viscosity(&self, pos: Vec2, neighbour: Vec2) -> f32 {
        let h = self.radius;
        let r = (pos - neighbour).length();
        if r == 0.0 || h - r < 0.0 {
            return 0.0;
        }
        -(r * r * r) / (2.0 * h * h * h) + (r * r) / (h * h) + h / (2.0 * r) - 1.0
    }

    /// Laplacian of the viscosity kernel: `45 / (pi h^6) * (h - r)` for
    /// `r < h`, else `0.0`.
    #[inline]
    pub fn viscosity_laplacian(&self, pos: Vec2, neighbour: Vec2) -> f32 {
        let f = self.radius - (pos - neighbour).length();
        if f < 0.0 {
            return 0.0;
        }
        self.viscosity_laplacian_norm * f
    }
}
