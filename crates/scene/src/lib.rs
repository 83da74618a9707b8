pub mod camera;
pub mod config;
pub mod director;
pub mod entity;
pub mod events;
pub mod labels;
pub mod markers;
pub mod picking;
pub mod selection;
pub mod session;

pub use camera::*;
pub use config::*;
pub use director::*;
pub use entity::*;
pub use events::*;
pub use labels::*;
pub use markers::*;
pub use picking::*;
pub use selection::*;
pub use session::*;
