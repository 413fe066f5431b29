pub mod electrician;
pub mod job;
pub mod three_phase;
pub mod types;

pub use electrician::*;
pub use job::*;
pub use three_phase::*;
pub use types::*;
