pub mod booking_form;
pub mod duration;
pub mod extras_pricer;
pub mod price_engine;

pub use booking_form::*;
pub use duration::*;
pub use extras_pricer::*;
pub use price_engine::*;
