//! Parameters of the edge-loop operators.

/// How the blend weight ramps across a blend zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendType {
    /// Weight grows linearly with arc length.
    #[default]
    Linear,
    /// Weight follows a smoothstep of the arc-length fraction.
    Smooth,
}

/// Fade-out zones at the two ends of an open loop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Blend {
    /// Number of vertices blended at the start of the loop.
    pub start: usize,
    /// Number of vertices blended at the end of the loop.
    pub end: usize,
    /// Weight profile.
    pub kind: BlendType,
}

impl Blend {
    /// Check if the blend changes anything.
    pub fn is_none(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

/// Which loop ends take their tangent from the mesh beyond the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rails {
    /// Use the edge continuing past the first vertex.
    pub start: bool,
    /// Use the edge continuing past the last vertex.
    pub end: bool,
}

impl Rails {
    /// Rails on both ends.
    pub fn both() -> Self {
        Self {
            start: true,
            end: true,
        }
    }
}

/// Options for [`set_flow`](super::EdgeLoop::set_flow).
#[derive(Debug, Clone, PartialEq)]
pub struct FlowOptions {
    /// Curve tension. Higher values bulge more.
    pub tension: f64,

    /// Number of times the flow pass is repeated.
    pub iterations: usize,

    /// Crease angle in degrees. Ring turns sharper than this are replaced
    /// by a straight extrapolation.
    pub min_angle: f64,

    /// End blending applied after the last iteration.
    pub blend: Blend,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            tension: 1.8,
            iterations: 1,
            min_angle: 0.0,
            blend: Blend::default(),
        }
    }
}

impl FlowOptions {
    /// Set the tension.
    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension;
        self
    }

    /// Set the number of iterations (at least one).
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Set the crease angle in degrees, clamped to `[0, 180]`.
    pub fn with_min_angle(mut self, degrees: f64) -> Self {
        self.min_angle = degrees.clamp(0.0, 180.0);
        self
    }

    /// Set the end blending.
    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }
}

/// Options for [`set_curve_flow`](super::EdgeLoop::set_curve_flow).
#[derive(Debug, Clone, PartialEq)]
pub struct CurveOptions {
    /// Handle length as a fraction of half the end-to-end distance.
    pub tension: f64,

    /// Ends whose tangent follows the mesh past the loop.
    pub rails: Rails,

    /// End blending.
    pub blend: Blend,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            tension: 1.0,
            rails: Rails::default(),
            blend: Blend::default(),
        }
    }
}

impl CurveOptions {
    /// Set the tension.
    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension;
        self
    }

    /// Set the rail ends.
    pub fn with_rails(mut self, rails: Rails) -> Self {
        self.rails = rails;
        self
    }

    /// Set the end blending.
    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }
}

/// Options for [`set_linear`](super::EdgeLoop::set_linear).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearOptions {
    /// Distribute vertices at equal steps instead of projecting them.
    pub space_evenly: bool,
}

impl LinearOptions {
    /// Enable even spacing.
    pub fn with_space_evenly(mut self, space_evenly: bool) -> Self {
        self.space_evenly = space_evenly;
        self
    }
}
