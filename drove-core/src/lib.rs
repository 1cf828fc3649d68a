mod config;
mod constants;
mod error;
mod event;
mod operation;
mod outcome;
mod random;
mod session;
mod stats;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use event::*;
pub use operation::*;
pub use outcome::*;
pub use random::*;
pub use session::*;
pub use stats::*;
