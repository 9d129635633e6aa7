//! Engine-wide defaults shared by the curve solver, the driver and the config presets.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Frame rate used when a profile does not override it.
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 60;

/// Hover transitions (mouse enter/leave).
pub const DEFAULT_HOVER_DURATION_MS: u64 = 150;

/// Press transitions (mouse down/up).
pub const DEFAULT_PRESS_DURATION_MS: u64 = 100;

/// Resize transitions of panels and windows.
pub const DEFAULT_RESIZE_DURATION_MS: u64 = 250;

/// Open/close transitions of popups and windows.
pub const DEFAULT_OPEN_CLOSE_DURATION_MS: u64 = 200;

/// Newton-Raphson iterations before the curve solver falls back to bisection.
pub const CURVE_NEWTON_ITERATIONS: usize = 8;

/// Bisection iterations; 2^-32 is far below the solver tolerance.
pub const CURVE_BISECTION_ITERATIONS: usize = 32;

/// Absolute tolerance on `Bx(t) - x` accepted by the curve solver.
pub const CURVE_TOLERANCE: f64 = 1e-5;

/// Below this magnitude `Bx'(t)` is treated as zero.
pub const CURVE_DERIVATIVE_EPSILON: f64 = 1e-9;
