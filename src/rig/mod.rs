pub mod bone;
pub mod kinematics;
pub mod look;
pub mod scale;
pub mod skeleton;

pub use bone::{Bone, BoneMap, Side};
pub use kinematics::{Landmarks, Rig, RigOutput};
pub use look::LookController;
pub use scale::auto_scale;
pub use skeleton::{PoseSkeleton, Skeleton};
