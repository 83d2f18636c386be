pub mod frames;
pub mod utils;
pub mod viewer;
