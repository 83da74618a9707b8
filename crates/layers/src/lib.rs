pub mod labels;
pub mod layer;
pub mod markers;
pub mod symbology;

pub use layer::*;
