pub mod angular;

pub use angular::{
    angular_distance, normalize_heading, turn_radius_from_angle, turn_radius_from_speed,
};
