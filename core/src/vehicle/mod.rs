pub mod geometry;
pub mod stability;

pub use geometry::{combined_cog_height, VehicleGeometry};
pub use stability::{critical_radius, critical_speed};
