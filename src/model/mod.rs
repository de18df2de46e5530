pub mod demand;
pub mod instance;
pub mod state_space;
