pub mod sleep;
pub mod utils;
