//! Shared test support: an in-memory framing collaborator and a reference
//! argument codec standing in for the real AMF implementation.

#![allow(dead_code)]

use std::io::{Read, Write};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use rtmp::{AmfCodec, EncodingType, Frame, FrameIo, Message, Result, RtmpError, Value};

/// Length-prefixed tagged encoding of ordered values.
pub struct TestCodec;

impl AmfCodec for TestCodec {
    fn encode(&self, writer: &mut dyn Write, values: &[Value]) -> Result<()> {
        for value in values {
            write_value(writer, value).map_err(RtmpError::Transport)?;
        }
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        loop {
            let mut tag = [0u8; 1];
            match reader.read_exact(&mut tag) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(RtmpError::Transport(e)),
            }
            values.push(read_value(tag[0], reader).map_err(RtmpError::Transport)?);
        }
        Ok(values)
    }
}

fn write_value(w: &mut dyn Write, value: &Value) -> std::io::Result<()> {
    match value {
        Value::Null => w.write_all(&[0]),
        Value::Boolean(b) => {
            w.write_all(&[1])?;
            w.write_all(&[u8::from(*b)])
        }
        Value::Number(n) => {
            w.write_all(&[2])?;
            w.write_all(&n.to_be_bytes())
        }
        Value::String(s) => {
            w.write_all(&[3])?;
            write_bytes(w, s.as_bytes())
        }
        Value::Object(pairs) => {
            w.write_all(&[4])?;
            w.write_all(&(pairs.len() as u32).to_be_bytes())?;
            for (key, value) in pairs {
                write_bytes(w, key.as_bytes())?;
                write_value(w, value)?;
            }
            Ok(())
        }
    }
}

fn write_bytes(w: &mut dyn Write, bytes: &[u8]) -> std::io::Result<()> {
    w.write_all(&(bytes.len() as u32).to_be_bytes())?;
    w.write_all(bytes)
}

fn read_value(tag: u8, r: &mut dyn Read) -> std::io::Result<Value> {
    Ok(match tag {
        0 => Value::Null,
        1 => {
            let mut b = [0u8; 1];
            r.read_exact(&mut b)?;
            Value::Boolean(b[0] != 0)
        }
        2 => {
            let mut b = [0u8; 8];
            r.read_exact(&mut b)?;
            Value::Number(f64::from_be_bytes(b))
        }
        3 => Value::String(read_string(r)?),
        4 => {
            let mut b = [0u8; 4];
            r.read_exact(&mut b)?;
            let count = u32::from_be_bytes(b);
            let mut pairs = Vec::new();
            for _ in 0..count {
                let key = read_string(r)?;
                let mut tag = [0u8; 1];
                r.read_exact(&mut tag)?;
                pairs.push((key, read_value(tag[0], r)?));
            }
            Value::Object(pairs)
        }
        other => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("bad value tag {other}"),
            ))
        }
    })
}

fn read_string(r: &mut dyn Read) -> std::io::Result<String> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    let len = u32::from_be_bytes(b) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Minimal framing collaborator over an in-memory transport.
///
/// Wire format per frame: kind, encoding, stream id, timestamp, payload
/// length, payload. No chunk splitting; every frame is complete.
pub struct PipeFramer<T> {
    transport: T,
}

impl<T> PipeFramer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: AsyncRead + AsyncWrite + Unpin + Send> FrameIo for PipeFramer<T> {
    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        let kind = match self.transport.read_u8().await {
            Ok(kind) => kind,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(RtmpError::Transport(e)),
        };
        let encoding = EncodingType::from_byte(self.transport.read_u8().await?);
        let stream_id = self.transport.read_u32().await?;
        let timestamp = self.transport.read_u32().await?;
        let len = self.transport.read_u32().await? as usize;
        let mut payload = vec![0u8; len];
        self.transport.read_exact(&mut payload).await?;
        let payload = Bytes::from(payload);

        let message = match kind {
            0 => Message::Audio(payload),
            1 => Message::Video(payload),
            2 => Message::Command { encoding, payload },
            3 => Message::Data { encoding, payload },
            other => {
                return Err(RtmpError::ProtocolViolation(format!(
                    "bad frame kind {other}"
                )))
            }
        };
        Ok(Some(Frame {
            stream_id,
            timestamp,
            message,
        }))
    }

    async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        let (kind, encoding, payload) = match &frame.message {
            Message::Audio(payload) => (0u8, EncodingType::default(), payload.clone()),
            Message::Video(payload) => (1, EncodingType::default(), payload.clone()),
            Message::Command { encoding, payload } => (2, *encoding, payload.clone()),
            Message::Data { encoding, payload } => (3, *encoding, payload.clone()),
        };
        self.transport.write_u8(kind).await?;
        self.transport.write_u8(encoding.as_byte()).await?;
        self.transport.write_u32(frame.stream_id).await?;
        self.transport.write_u32(frame.timestamp).await?;
        self.transport.write_u32(payload.len() as u32).await?;
        self.transport.write_all(&payload).await?;
        self.transport.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.transport.shutdown().await?;
        Ok(())
    }
}

/// Encode a command body `[name, transaction id, args...]`.
pub fn command_payload(name: &str, transaction_id: f64, args: &[Value]) -> Bytes {
    let mut values = vec![Value::from(name), Value::Number(transaction_id)];
    values.extend_from_slice(args);
    let mut body = Vec::new();
    TestCodec.encode(&mut body, &values).unwrap();
    Bytes::from(body)
}

/// Decode a command or data body back into its ordered values.
pub fn decode_payload(payload: &[u8]) -> Vec<Value> {
    let mut reader = payload;
    TestCodec.decode(&mut reader).unwrap()
}
