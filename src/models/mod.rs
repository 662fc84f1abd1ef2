pub mod enums;
pub mod field;
pub mod result;

pub use enums::*;
pub use field::*;
pub use result::*;
