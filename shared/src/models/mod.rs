//! Domain models for the GTM admin platform

mod annotation;
mod product;
mod tool;
mod workshop;

pub use annotation::*;
pub use product::*;
pub use tool::*;
pub use workshop::*;
