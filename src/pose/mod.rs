pub mod frame;
pub mod keypoint;
pub mod model;

pub use frame::{Detection, DetectionBatch, RawFrame};
pub use keypoint::Joint;
pub use model::KeypointModel;
