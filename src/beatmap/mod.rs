pub mod generator;
pub mod note;
pub mod params;
pub mod sustain;
