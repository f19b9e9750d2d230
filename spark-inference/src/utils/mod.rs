pub mod extractor;
pub mod graph;
pub mod polygon;
pub mod transform;
