pub mod interpolate;
pub mod matcher;
pub mod normalize;
pub mod slot;

pub use interpolate::interpolate;
pub use matcher::{FrameMatcher, MatchCandidate, MatchOutcome};
pub use normalize::{normalize, NormalizeOptions};
pub use slot::{BoundingBox, MotionData, PersonSlot};
