pub mod template;

pub use template::{render, truncate_content};
