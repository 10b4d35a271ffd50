mod diviner;
mod params;

pub use diviner::{compress_with, decompress, divine, DivinationResult};
pub use params::{canonical_try_order, DeflateParameters};
