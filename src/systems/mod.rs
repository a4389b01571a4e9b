pub mod ai;
pub mod coordination;
pub mod spawners;

pub use ai::*;
pub use coordination::*;
pub use spawners::*;
