//! 検出サーバーとの TCP プロトコル
//!
//! 長さプレフィックス付きフレームに bincode でエンコードしたメッセージを載せる。

use anyhow::Context;
use bytes::{Bytes, BytesMut};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::RigError;
use crate::pose::{KeypointModel, RawFrame};

// --- Message types ---

/// クライアント → 検出サーバー
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// モデルを読み込んで1回空推論させる
    Warmup { model: KeypointModel },
    /// 次のフレームを検出する。`generation` は結果にそのまま返される
    Detect {
        timestamp_us: u64,
        generation: u64,
        model: KeypointModel,
    },
}

/// 検出サーバー → クライアント
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Ready { models: Vec<KeypointModel> },
    WarmedUp { model: KeypointModel },
    Result { generation: u64, frame: RawFrame },
}

// --- TCP codec helpers ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// 長さプレフィックス付きのメッセージストリームを作る
pub fn message_stream(stream: TcpStream, max_frame_length: usize) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_length)
        .new_codec();
    Framed::new(stream, codec)
}

pub fn encode_message<T: Serialize>(msg: &T) -> anyhow::Result<Bytes> {
    let data = bincode::serialize(msg).map_err(RigError::from)?;
    Ok(Bytes::from(data))
}

pub fn decode_message<T: DeserializeOwned>(bytes: &[u8]) -> anyhow::Result<T> {
    let msg = bincode::deserialize(bytes).map_err(RigError::from)?;
    Ok(msg)
}

/// メッセージを送る（ストリーム本体、split 後の送信側のどちらでも可）
pub async fn send_message<T, S>(sink: &mut S, msg: &T) -> anyhow::Result<()>
where
    T: Serialize,
    S: Sink<Bytes, Error = std::io::Error> + Unpin,
{
    let data = encode_message(msg)?;
    sink.send(data).await.context("failed to send message")?;
    Ok(())
}

/// メッセージを1つ受け取る。相手が切断したら `RigError::ConnectionClosed`
pub async fn recv_message<T, R>(stream: &mut R) -> anyhow::Result<T>
where
    T: DeserializeOwned,
    R: Stream<Item = Result<BytesMut, std::io::Error>> + Unpin,
{
    match stream.next().await {
        Some(Ok(bytes)) => decode_message(&bytes),
        Some(Err(e)) => Err(anyhow::Error::new(e).context("failed to read message")),
        None => Err(RigError::ConnectionClosed.into()),
    }
}
