pub mod booking;
pub mod extras;
pub mod pricing;

pub use booking::*;
pub use extras::*;
pub use pricing::*;
