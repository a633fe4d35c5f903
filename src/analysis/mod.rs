mod classifier;
mod markup;

pub use classifier::{Classifier, classify};
pub use markup::strip_markup;
