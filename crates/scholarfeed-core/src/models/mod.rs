pub mod publication;
pub mod stats;
pub mod stored;

pub use publication::*;
pub use stats::*;
pub use stored::*;
