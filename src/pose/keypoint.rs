use serde::{Deserialize, Serialize};

/// 意味的な関節名
///
/// 2種類の検出器トポロジーの和集合。どのインデックスに対応するかは
/// [`KeypointModel`](super::KeypointModel) が決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Joint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftIndex = 11,
    RightIndex = 12,
    LeftHip = 13,
    RightHip = 14,
    LeftKnee = 15,
    RightKnee = 16,
    LeftAnkle = 17,
    RightAnkle = 18,
    LeftFoot = 19,
    RightFoot = 20,
    Pelvis = 21,
    Spine = 22,
    Spine1 = 23,
    Spine2 = 24,
    Neck = 25,
    LeftArm = 26,
    RightArm = 27,
    LeftEyeInside = 28,
    LeftEyeOutside = 29,
    RightEyeInside = 30,
    RightEyeOutside = 31,
    LeftMouth = 32,
    RightMouth = 33,
    LeftPinky = 34,
    RightPinky = 35,
    LeftThumb = 36,
    RightThumb = 37,
    LeftHeel = 38,
    RightHeel = 39,
    BodyTop = 40,
    LeftPalm = 41,
    LeftHand = 42,
    RightPalm = 43,
    RightHand = 44,
}

impl Joint {
    pub const COUNT: usize = 45;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftIndex,
        Joint::RightIndex,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftFoot,
        Joint::RightFoot,
        Joint::Pelvis,
        Joint::Spine,
        Joint::Spine1,
        Joint::Spine2,
        Joint::Neck,
        Joint::LeftArm,
        Joint::RightArm,
        Joint::LeftEyeInside,
        Joint::LeftEyeOutside,
        Joint::RightEyeInside,
        Joint::RightEyeOutside,
        Joint::LeftMouth,
        Joint::RightMouth,
        Joint::LeftPinky,
        Joint::RightPinky,
        Joint::LeftThumb,
        Joint::RightThumb,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::BodyTop,
        Joint::LeftPalm,
        Joint::LeftHand,
        Joint::RightPalm,
        Joint::RightHand,
    ];

    /// 検出器出力の `joints` 配列で使われる名前
    pub fn name(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "leftEye",
            Joint::RightEye => "rightEye",
            Joint::LeftEar => "leftEar",
            Joint::RightEar => "rightEar",
            Joint::LeftShoulder => "leftShoulder",
            Joint::RightShoulder => "rightShoulder",
            Joint::LeftElbow => "leftElbow",
            Joint::RightElbow => "rightElbow",
            Joint::LeftWrist => "leftWrist",
            Joint::RightWrist => "rightWrist",
            Joint::LeftIndex => "leftIndex",
            Joint::RightIndex => "rightIndex",
            Joint::LeftHip => "leftHip",
            Joint::RightHip => "rightHip",
            Joint::LeftKnee => "leftKnee",
            Joint::RightKnee => "rightKnee",
            Joint::LeftAnkle => "leftAnkle",
            Joint::RightAnkle => "rightAnkle",
            Joint::LeftFoot => "leftFoot",
            Joint::RightFoot => "rightFoot",
            Joint::Pelvis => "pelvis",
            Joint::Spine => "spine",
            Joint::Spine1 => "spine1",
            Joint::Spine2 => "spine2",
            Joint::Neck => "neck",
            Joint::LeftArm => "leftArm",
            Joint::RightArm => "rightArm",
            Joint::LeftEyeInside => "leftEyeInside",
            Joint::LeftEyeOutside => "leftEyeOutside",
            Joint::RightEyeInside => "rightEyeInside",
            Joint::RightEyeOutside => "rightEyeOutside",
            Joint::LeftMouth => "leftMouth",
            Joint::RightMouth => "rightMouth",
            Joint::LeftPinky => "leftPinky",
            Joint::RightPinky => "rightPinky",
            Joint::LeftThumb => "leftThumb",
            Joint::RightThumb => "rightThumb",
            Joint::LeftHeel => "leftHeel",
            Joint::RightHeel => "rightHeel",
            Joint::BodyTop => "bodyTop",
            Joint::LeftPalm => "leftPalm",
            Joint::LeftHand => "leftHand",
            Joint::RightPalm => "rightPalm",
            Joint::RightHand => "rightHand",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|j| j.name() == name)
    }
}
