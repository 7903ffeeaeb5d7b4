pub mod document;
pub mod normalize;

pub use document::{Ancestor, PageDocument, PageImage};
