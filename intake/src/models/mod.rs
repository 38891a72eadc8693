mod bureau;
mod identity;

pub use bureau::*;
pub use identity::*;
