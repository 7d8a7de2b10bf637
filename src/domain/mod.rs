pub mod environment;
pub mod phase;
pub mod plant;
pub mod record;

pub use environment::*;
pub use phase::*;
pub use plant::*;
pub use record::*;
