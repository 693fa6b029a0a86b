mod helpers;
mod points;

pub mod op;

pub use helpers::{parse_boolean_flag, parse_env_value};
pub use points::{Points, PointsConversionError, POINTS_PER_UNIT};
