mod entry;
mod generator;

pub use entry::DeltaEntry;
pub use generator::{BsdiffGenerator, DeltaGenerator, FileByFileGenerator};
