pub mod completions;
pub mod dataset;
pub mod solve;
pub mod util;
pub mod validate;
