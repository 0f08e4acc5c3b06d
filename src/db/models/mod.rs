mod summary;
mod video;

pub use summary::{BandCount, BandEngagement, ChannelSummary, VideoSummary};
pub use video::VideoRecord;
