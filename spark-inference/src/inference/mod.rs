pub mod rotated;
