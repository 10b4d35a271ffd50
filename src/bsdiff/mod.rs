mod extend;
mod writer;

pub use writer::{generate_bsdiff, BsdiffOptions, MAGIC};
