//! Problem inputs: the asset universe and the encoding parameters.

mod params;
mod universe;

pub use params::{ConstraintMode, ParametersBuilder, ProblemParameters};
pub use universe::AssetUniverse;
