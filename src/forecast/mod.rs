pub mod corrently;

pub use corrently::*;
