//! 解決済みボーン姿勢を OSC/UDP で外部レンダラーへ送る

use anyhow::{Context, Result};
use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::net::UdpSocket;

use crate::geometry::{euler_to_quaternion, sum, Point};
use crate::rig::{Bone, Skeleton};

/// 既定の送信先
pub const SINK_DEFAULT_ADDR: &str = "127.0.0.1:39580";

const BONE_ADDR: &str = "/rig/bone";
const VISIBILITY_ADDR: &str = "/rig/visibility";

/// 1ボーン分の姿勢
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    /// ワールド位置 (x, y, z)
    pub position: Point,
    /// 回転 (クォータニオン: x, y, z, w)
    pub rotation: [f32; 4],
}

impl BonePose {
    /// スケルトンのボーンから作る。ルート位置を足してワールド座標にする
    pub fn from_skeleton<S: Skeleton + ?Sized>(skeleton: &S, bone: Bone) -> Option<Self> {
        let local = skeleton.bone_position(bone)?;
        let rotation = skeleton.bone_rotation(bone)?;
        Some(Self {
            position: sum(&local, &skeleton.root_position()),
            rotation: euler_to_quaternion(&rotation),
        })
    }
}

/// 引数: person, bone, x, y, z, qx, qy, qz, qw
pub fn build_bone_message(person: i32, bone: Bone, pose: &BonePose) -> OscMessage {
    OscMessage {
        addr: BONE_ADDR.to_string(),
        args: vec![
            OscType::Int(person),
            OscType::String(bone.name().to_string()),
            OscType::Float(pose.position[0]),
            OscType::Float(pose.position[1]),
            OscType::Float(pose.position[2]),
            OscType::Float(pose.rotation[0]),
            OscType::Float(pose.rotation[1]),
            OscType::Float(pose.rotation[2]),
            OscType::Float(pose.rotation[3]),
        ],
    }
}

/// 引数: person, visibility
pub fn build_visibility_message(person: i32, visibility: f32) -> OscMessage {
    OscMessage {
        addr: VISIBILITY_ADDR.to_string(),
        args: vec![OscType::Int(person), OscType::Float(visibility)],
    }
}

/// OSCメッセージをバイト列にエンコード
pub fn encode_osc_message(msg: &OscMessage) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(msg.clone());
    let encoded = encoder::encode(&packet).context("failed to encode OSC message")?;
    Ok(encoded)
}

pub struct BoneSink {
    socket: UdpSocket,
    target_addr: String,
}

impl BoneSink {
    pub fn new(target_addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").context("failed to bind UDP socket")?;
        Ok(Self {
            socket,
            target_addr: target_addr.to_string(),
        })
    }

    pub fn send_message(&self, msg: &OscMessage) -> Result<()> {
        let data = encode_osc_message(msg)?;
        self.socket.send_to(&data, &self.target_addr)?;
        Ok(())
    }

    /// 1人分の全ボーンと不透明度を送る。送ったボーン数を返す
    pub fn send_skeleton<S: Skeleton + ?Sized>(&self, person: i32, skeleton: &S) -> Result<usize> {
        let mut sent = 0;
        for bone in Bone::ALL {
            if let Some(pose) = BonePose::from_skeleton(skeleton, bone) {
                self.send_message(&build_bone_message(person, bone, &pose))?;
                sent += 1;
            }
        }
        self.send_message(&build_visibility_message(person, skeleton.visibility()))?;
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::PoseSkeleton;

    #[test]
    fn test_bone_pose_adds_root() {
        let mut s = PoseSkeleton::humanoid();
        s.set_root_position([1.0, 0.0, -2.0]);
        let pose = BonePose::from_skeleton(&s, Bone::Hips).unwrap();
        assert_eq!(pose.position, [1.0, 0.95, -2.0]);
        // 腰は y 軸まわりに π
        assert!((pose.rotation[1].abs() - 1.0).abs() < 1e-6);
        assert!(pose.rotation[3].abs() < 1e-6);
    }

    #[test]
    fn test_missing_bone_has_no_pose() {
        let s = PoseSkeleton::humanoid().without(&[Bone::Neck]);
        assert!(BonePose::from_skeleton(&s, Bone::Neck).is_none());
    }

    #[test]
    fn test_build_bone_message_args() {
        let pose = BonePose {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
        };
        let msg = build_bone_message(2, Bone::LeftForeArm, &pose);
        assert_eq!(msg.addr, "/rig/bone");

        // 引数: person, bone, x, y, z, qx, qy, qz, qw
        assert_eq!(msg.args.len(), 9);
        assert_eq!(msg.args[0], OscType::Int(2));
        assert_eq!(msg.args[1], OscType::String("LeftForeArm".to_string()));
        assert_eq!(msg.args[2], OscType::Float(1.0));
        assert_eq!(msg.args[4], OscType::Float(3.0));
        assert_eq!(msg.args[8], OscType::Float(1.0));
    }

    #[test]
    fn test_send_skeleton_over_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = receiver.local_addr().unwrap().to_string();
        let sink = BoneSink::new(&addr).unwrap();
        let s = PoseSkeleton::humanoid();
        let sent = sink.send_skeleton(0, &s).unwrap();
        assert_eq!(sent, Bone::COUNT);

        let mut buf = [0u8; 1024];
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..n]).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/rig/bone");
                assert_eq!(msg.args[1], OscType::String("Hips".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
