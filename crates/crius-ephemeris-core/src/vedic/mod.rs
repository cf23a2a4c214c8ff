pub mod options;

pub use options::{DashaLevel, VedicOptions};
