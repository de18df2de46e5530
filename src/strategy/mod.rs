pub mod implementations;
pub mod recursion;
pub mod traits;
