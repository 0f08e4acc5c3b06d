pub mod processor;

pub use processor::{CycleReport, VideoProcessor};
