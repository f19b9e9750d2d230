pub mod image;

pub use crate::image::image::Image;
pub use crate::image::util::draw::RGB;
