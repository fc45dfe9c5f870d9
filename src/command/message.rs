//! Typed commands and their wire argument mapping.
//!
//! Each variant maps bidirectionally to the ordered argument list of the
//! wire command encoding. By convention the first argument is the command
//! object placeholder, ignored by most variants. Type or count mismatches
//! produce a [`MappingError`] naming the command and the offending
//! position.

use crate::codec::{EncodingType, Value};
use crate::error::MappingError;

use super::status::StatusInfo;

/// Typed session/stream commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `connect`: opens the control stream for the session.
    Connect {
        /// The command object carrying app name and client properties.
        command_object: Value,
    },
    /// `_result` answering `connect`.
    ConnectResult {
        /// Server properties object.
        properties: Value,
        /// Outcome information object.
        information: Value,
    },
    /// `createStream`: asks the server to allocate a new stream id.
    CreateStream,
    /// `_result` answering `createStream`.
    CreateStreamResult {
        /// Allocated stream id.
        stream_id: u32,
    },
    /// `publish`: starts publishing on the target stream.
    Publish {
        /// Name of the stream being published.
        publishing_name: String,
        /// Publishing type (`live`, `record`, `append`).
        publishing_type: String,
    },
    /// `play`: starts playback on the target stream. Receive-only: a server
    /// never sends a play request.
    Play {
        /// Name of the stream to play.
        stream_name: String,
        /// Start position.
        start: f64,
    },
    /// `onStatus` notification.
    OnStatus(StatusInfo),
    /// `deleteStream`: removes a stream from the connection.
    DeleteStream {
        /// Id of the stream to delete.
        stream_id: u32,
    },
    /// `FCPublish` announcement.
    FcPublish {
        /// Announced stream name.
        stream_name: String,
    },
    /// `FCUnpublish` announcement.
    FcUnpublish {
        /// Announced stream name.
        stream_name: String,
    },
    /// `releaseStream` request.
    ReleaseStream {
        /// Stream name to release.
        stream_name: String,
    },
    /// `@setDataFrame` data message (`onMetaData` and friends).
    SetDataFrame {
        /// Frame event name, e.g. `onMetaData`.
        event: String,
        /// Metadata object.
        metadata: Value,
    },
    /// `getStreamLength` query.
    GetStreamLength {
        /// Stream name being queried.
        stream_name: String,
    },
    /// `ping` keep-alive.
    Ping,
    /// `closeStream` on the target stream.
    CloseStream,
}

impl Command {
    /// Wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Connect { .. } => "connect",
            Command::ConnectResult { .. } | Command::CreateStreamResult { .. } => "_result",
            Command::CreateStream => "createStream",
            Command::Publish { .. } => "publish",
            Command::Play { .. } => "play",
            Command::OnStatus(_) => "onStatus",
            Command::DeleteStream { .. } => "deleteStream",
            Command::FcPublish { .. } => "FCPublish",
            Command::FcUnpublish { .. } => "FCUnpublish",
            Command::ReleaseStream { .. } => "releaseStream",
            Command::SetDataFrame { .. } => "@setDataFrame",
            Command::GetStreamLength { .. } => "getStreamLength",
            Command::Ping => "ping",
            Command::CloseStream => "closeStream",
        }
    }

    /// True for data-channel commands whose body carries no transaction id.
    pub fn is_data(&self) -> bool {
        matches!(self, Command::SetDataFrame { .. })
    }

    /// Map a received `(name, args)` pair to a typed command.
    pub fn from_args(name: &str, args: &[Value]) -> Result<Self, MappingError> {
        match name {
            "connect" => Ok(Command::Connect {
                command_object: object_arg(args, 0, "connect")?.clone(),
            }),
            "_result" => from_result_args(args),
            "createStream" => Ok(Command::CreateStream),
            "publish" => Ok(Command::Publish {
                publishing_name: string_arg(args, 1, "publish")?,
                publishing_type: string_arg(args, 2, "publish")?,
            }),
            "play" => Ok(Command::Play {
                stream_name: string_arg(args, 1, "play")?,
                start: number_arg(args, 2, "play")?,
            }),
            "onStatus" => {
                let info = object_arg(args, 1, "onStatus")?;
                StatusInfo::from_value(info)
                    .map(Command::OnStatus)
                    .ok_or(MappingError::TypeMismatch {
                        command: "onStatus",
                        position: 1,
                        expected: "status info object",
                    })
            }
            "deleteStream" => Ok(Command::DeleteStream {
                stream_id: number_arg(args, 1, "deleteStream")? as u32,
            }),
            "FCPublish" => Ok(Command::FcPublish {
                stream_name: string_arg(args, 1, "FCPublish")?,
            }),
            "FCUnpublish" => Ok(Command::FcUnpublish {
                stream_name: string_arg(args, 1, "FCUnpublish")?,
            }),
            "releaseStream" => Ok(Command::ReleaseStream {
                stream_name: string_arg(args, 1, "releaseStream")?,
            }),
            "@setDataFrame" => Ok(Command::SetDataFrame {
                event: string_arg(args, 0, "@setDataFrame")?,
                metadata: object_arg(args, 1, "@setDataFrame")?.clone(),
            }),
            "getStreamLength" => Ok(Command::GetStreamLength {
                stream_name: string_arg(args, 1, "getStreamLength")?,
            }),
            "ping" => Ok(Command::Ping),
            "closeStream" => Ok(Command::CloseStream),
            other => Err(MappingError::UnknownCommand(other.to_string())),
        }
    }

    /// Produce the ordered argument list for outbound encoding.
    ///
    /// Receive-only variants refuse to serialize: the asymmetry is part of
    /// the protocol (a server never sends `play`).
    pub fn to_args(&self, _encoding: EncodingType) -> Result<Vec<Value>, MappingError> {
        match self {
            Command::Connect { command_object } => Ok(vec![command_object.clone()]),
            Command::ConnectResult {
                properties,
                information,
            } => Ok(vec![properties.clone(), information.clone()]),
            Command::CreateStream => Ok(vec![Value::Null]),
            Command::CreateStreamResult { stream_id } => {
                Ok(vec![Value::Null, Value::Number(f64::from(*stream_id))])
            }
            Command::Publish {
                publishing_name,
                publishing_type,
            } => Ok(vec![
                Value::Null,
                Value::from(publishing_name.as_str()),
                Value::from(publishing_type.as_str()),
            ]),
            Command::Play { .. } => Err(MappingError::EncodeUnsupported("play")),
            Command::OnStatus(info) => Ok(vec![Value::Null, info.to_value()]),
            Command::DeleteStream { stream_id } => {
                Ok(vec![Value::Null, Value::Number(f64::from(*stream_id))])
            }
            Command::FcPublish { stream_name }
            | Command::FcUnpublish { stream_name }
            | Command::ReleaseStream { stream_name }
            | Command::GetStreamLength { stream_name } => {
                Ok(vec![Value::Null, Value::from(stream_name.as_str())])
            }
            Command::SetDataFrame { event, metadata } => {
                Ok(vec![Value::from(event.as_str()), metadata.clone()])
            }
            Command::Ping | Command::CloseStream => Ok(vec![Value::Null]),
        }
    }
}

/// `_result` answers both `connect` and `createStream`; the reply layouts
/// differ in the second position.
fn from_result_args(args: &[Value]) -> Result<Command, MappingError> {
    match args.get(1) {
        Some(Value::Number(n)) => Ok(Command::CreateStreamResult {
            stream_id: *n as u32,
        }),
        _ => Ok(Command::ConnectResult {
            properties: arg(args, 0, "_result")?.clone(),
            information: object_arg(args, 1, "_result")?.clone(),
        }),
    }
}

fn arg<'a>(
    args: &'a [Value],
    position: usize,
    command: &'static str,
) -> Result<&'a Value, MappingError> {
    args.get(position)
        .ok_or(MappingError::MissingArgument { command, position })
}

fn string_arg(
    args: &[Value],
    position: usize,
    command: &'static str,
) -> Result<String, MappingError> {
    match arg(args, position, command)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(MappingError::TypeMismatch {
            command,
            position,
            expected: "string",
        }),
    }
}

fn number_arg(args: &[Value], position: usize, command: &'static str) -> Result<f64, MappingError> {
    match arg(args, position, command)? {
        Value::Number(n) => Ok(*n),
        _ => Err(MappingError::TypeMismatch {
            command,
            position,
            expected: "number",
        }),
    }
}

fn object_arg<'a>(
    args: &'a [Value],
    position: usize,
    command: &'static str,
) -> Result<&'a Value, MappingError> {
    match arg(args, position, command)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err(MappingError::TypeMismatch {
            command,
            position,
            expected: "object",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::status::{StatusCode, StatusLevel};

    #[test]
    fn test_publish_round_trip() {
        let original = Command::Publish {
            publishing_name: "mystream".to_string(),
            publishing_type: "live".to_string(),
        };
        let args = original.to_args(EncodingType::Amf0).unwrap();
        let recovered = Command::from_args("publish", &args).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_publish_type_mismatch_names_position() {
        let args = vec![Value::Null, Value::Number(1.0)];
        let err = Command::from_args("publish", &args).unwrap_err();
        assert_eq!(
            err,
            MappingError::TypeMismatch {
                command: "publish",
                position: 1,
                expected: "string",
            }
        );
    }

    #[test]
    fn test_publish_missing_argument() {
        let args = vec![Value::Null, Value::from("mystream")];
        let err = Command::from_args("publish", &args).unwrap_err();
        assert_eq!(
            err,
            MappingError::MissingArgument {
                command: "publish",
                position: 2,
            }
        );
    }

    #[test]
    fn test_play_is_receive_only() {
        let args = vec![Value::Null, Value::from("camera1"), Value::Number(-2.0)];
        let play = Command::from_args("play", &args).unwrap();
        assert_eq!(
            play,
            Command::Play {
                stream_name: "camera1".to_string(),
                start: -2.0,
            }
        );
        assert_eq!(
            play.to_args(EncodingType::Amf0),
            Err(MappingError::EncodeUnsupported("play"))
        );
    }

    #[test]
    fn test_on_status_round_trip() {
        let original = Command::OnStatus(StatusInfo::status(
            StatusCode::PublishStart,
            "Publishing camera1.",
        ));
        let args = original.to_args(EncodingType::Amf0).unwrap();
        assert!(args[0].is_null());
        let recovered = Command::from_args("onStatus", &args).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_on_status_levels() {
        let info = StatusInfo::error(StatusCode::PlayFailed, "no such stream");
        assert_eq!(info.level, StatusLevel::Error);
        let args = Command::OnStatus(info).to_args(EncodingType::Amf0).unwrap();
        assert_eq!(
            args[1].get("level").and_then(Value::as_str),
            Some("error")
        );
    }

    #[test]
    fn test_result_disambiguation() {
        // createStream reply: number in position 1.
        let create = Command::from_args("_result", &[Value::Null, Value::Number(5.0)]).unwrap();
        assert_eq!(create, Command::CreateStreamResult { stream_id: 5 });

        // connect reply: two objects.
        let props = Value::Object(vec![("fmsVer".to_string(), Value::from("FMS/3,0,1,123"))]);
        let info = StatusInfo::status(StatusCode::ConnectSuccess, "Connection succeeded.")
            .to_value();
        let connect =
            Command::from_args("_result", &[props.clone(), info.clone()]).unwrap();
        assert_eq!(
            connect,
            Command::ConnectResult {
                properties: props,
                information: info,
            }
        );
    }

    #[test]
    fn test_delete_stream_maps_number_to_id() {
        let cmd = Command::from_args("deleteStream", &[Value::Null, Value::Number(3.0)]).unwrap();
        assert_eq!(cmd, Command::DeleteStream { stream_id: 3 });
        let args = cmd.to_args(EncodingType::Amf0).unwrap();
        assert_eq!(args[1].as_number(), Some(3.0));
    }

    #[test]
    fn test_set_data_frame_round_trip() {
        let original = Command::SetDataFrame {
            event: "onMetaData".to_string(),
            metadata: Value::Object(vec![
                ("width".to_string(), Value::Number(1280.0)),
                ("height".to_string(), Value::Number(720.0)),
            ]),
        };
        let args = original.to_args(EncodingType::Amf0).unwrap();
        let recovered = Command::from_args("@setDataFrame", &args).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::from_args("frobnicate", &[]).unwrap_err();
        assert_eq!(err, MappingError::UnknownCommand("frobnicate".to_string()));
    }

    #[test]
    fn test_fc_publish_and_release() {
        for (name, expected) in [
            (
                "FCPublish",
                Command::FcPublish {
                    stream_name: "camera1".to_string(),
                },
            ),
            (
                "releaseStream",
                Command::ReleaseStream {
                    stream_name: "camera1".to_string(),
                },
            ),
        ] {
            let cmd = Command::from_args(name, &[Value::Null, Value::from("camera1")]).unwrap();
            assert_eq!(cmd, expected);
            assert_eq!(cmd.name(), name);
        }
    }
}
