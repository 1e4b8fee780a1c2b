pub mod element;
pub mod file;
pub mod index;
pub mod language;
pub mod stub;

pub use element::*;
pub use file::*;
pub use index::*;
pub use language::*;
pub use stub::*;
