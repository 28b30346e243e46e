//! Coordinate values and angle helpers shared by projections and the solar model

mod math;
mod pair;

pub use math::{clamp, window};
pub use pair::CoordinatePair;
