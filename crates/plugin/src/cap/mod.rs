pub mod matcher;
pub mod parse;
pub mod stubs;

pub use matcher::*;
pub use parse::*;
pub use stubs::*;
