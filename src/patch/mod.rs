mod writer;

pub use writer::{generate_patch, MAGIC};
