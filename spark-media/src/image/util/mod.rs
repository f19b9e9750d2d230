pub mod crop;
pub mod draw;
pub mod flip;
