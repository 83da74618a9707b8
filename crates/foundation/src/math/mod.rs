pub mod great_circle;
pub mod precision;
pub mod sphere;
pub mod vec;

pub use great_circle::*;
pub use precision::*;
pub use sphere::*;
pub use vec::*;
