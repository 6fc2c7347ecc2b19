use super::*;
use bytes::Bytes;
use chunk_io::{ChunkDeserializer, ChunkSerializer, Packet};
use freshet_amf0::{Amf0Object, Amf0Value};
use messages::{MessagePayload, RtmpMessage, SharedObjectEvent, UserControlEventType};
use rand;
use time::RtmpTimestamp;

#[test]
fn new_session_and_successful_connect_creates_set_chunk_size_message() {
    let app_name = "test".to_string();
    let mut config = ClientSessionConfig::new();
    config.chunk_size = 1111;

    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    assert_eq!(
        deserializer.get_max_chunk_size(),
        1111,
        "Incorrect deserializer default chunk size"
    );
}

#[test]
fn can_send_connect_request() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let results = session.request_connection(app_name.clone()).unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![results]);

    assert_eq!(responses.len(), 1, "Expected 1 response");
    match responses.remove(0) {
        (
            payload,
            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
            },
        ) => {
            assert_eq!(payload.message_stream_id, 0, "Unexpected message stream id");
            assert_eq!(
                command_name,
                "connect".to_string(),
                "Unexpected command name"
            );
            assert_ne!(transaction_id, 0.0, "Transaction id should not be zero");
            assert_eq!(
                additional_arguments.len(),
                0,
                "Expected no additional arguments"
            );

            match command_object {
                Amf0Value::Object(properties) => {
                    assert_eq!(
                        properties.get("app"),
                        Some(&Amf0Value::Utf8String(app_name.clone())),
                        "Unexpected app name"
                    );
                    assert_eq!(
                        properties.get("objectEncoding"),
                        Some(&Amf0Value::Number(0.0)),
                        "Unexpected object encoding"
                    );
                    assert_eq!(
                        properties.get("flashVer"),
                        Some(&Amf0Value::Utf8String(config.flash_version.clone())),
                        "Unexpected flash version"
                    );
                }

                x => panic!(
                    "Expected Amf0Value::Object for command object, instead received: {:?}",
                    x
                ),
            }
        }

        x => panic!("Expected Amf0Command, instead received: {:?}", x),
    }
}

#[test]
fn can_send_connect_request_with_tc_url() {
    let app_name = "test".to_string();
    let mut config = ClientSessionConfig::new();
    let tc_url = "rtmp://1.2.3.4:1935/app".to_string();
    config.tc_url = Some(tc_url.clone());

    let mut deserializer = ChunkDeserializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let results = session.request_connection(app_name.clone()).unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![results]);

    assert_eq!(responses.len(), 1, "Expected 1 response");
    match responses.remove(0) {
        (
            _,
            RtmpMessage::Amf0Command { command_object, .. },
        ) => match command_object {
            Amf0Value::Object(properties) => {
                assert_eq!(
                    properties.get("tcUrl"),
                    Some(&Amf0Value::Utf8String(tc_url.clone())),
                    "Unexpected tcUrl"
                );
            }

            x => panic!(
                "Expected Amf0Value::Object for command object, instead received: {:?}",
                x
            ),
        },

        x => panic!("Expected Amf0Command, instead received: {:?}", x),
    }
}

#[test]
fn can_process_connect_success_response() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let results = session.request_connection(app_name.clone()).unwrap();
    consume_results(&mut deserializer, vec![results]);

    let response = get_connect_success_response(&mut serializer);
    let results = session.handle_input(&response.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::ConnectionRequestAccepted => (),
        x => panic!(
            "Expected connection accepted event, instead received: {:?}",
            x
        ),
    }
}

#[test]
fn connect_success_response_sends_window_acknowledgement_size() {
    let app_name = "test".to_string();
    let mut config = ClientSessionConfig::new();
    config.window_ack_size = 123456;

    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let results = session.request_connection(app_name.clone()).unwrap();
    consume_results(&mut deserializer, vec![results]);

    let response = get_connect_success_response(&mut serializer);
    let results = session.handle_input(&response.bytes[..]).unwrap();
    let (responses, _) = split_results(&mut deserializer, results);

    assert_vec_contains!(
        responses,
        &(_, RtmpMessage::WindowAcknowledgement { size: 123456 })
    );
}

#[test]
fn event_raised_when_connect_request_rejected() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let results = session.request_connection(app_name.clone()).unwrap();
    consume_results(&mut deserializer, vec![results]);

    let response = get_connect_error_response(&mut serializer);
    let results = session.handle_input(&response.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::ConnectionRequestRejected { description } => {
            assert!(description.len() > 0, "Expected a non-empty description");
        }

        x => panic!(
            "Expected connection rejected event, instead received: {:?}",
            x
        ),
    }
}

#[test]
fn cant_send_connect_request_when_already_connected() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    match session.request_connection(app_name.clone()) {
        Err(ClientSessionError::CantConnectWhileAlreadyConnected) => (),
        x => panic!("Expected connect while connected error, instead got: {:?}", x),
    }
}

#[test]
fn can_send_and_accept_play_request() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    perform_successful_play_request(
        config.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );
}

#[test]
fn can_send_and_accept_publish_request() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    perform_successful_publish_request(&mut session, &mut serializer, &mut deserializer);
}

#[test]
fn play_request_in_disconnected_state_returns_error() {
    let config = ClientSessionConfig::new();
    let (mut session, _) = ClientSession::new(config.clone()).unwrap();

    match session.request_playback("key".to_string()) {
        Err(ClientSessionError::SessionInInvalidState { .. }) => (),
        x => panic!("Expected invalid state error, instead got: {:?}", x),
    }
}

#[test]
fn create_stream_response_without_stream_id_returns_error() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let result = session.request_playback("key".to_string()).unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![result]);
    let transaction_id = match responses.remove(0) {
        (_, RtmpMessage::Amf0Command { transaction_id, .. }) => transaction_id,
        x => panic!("Unexpected response seen: {:?}", x),
    };

    let message = RtmpMessage::Amf0Command {
        command_name: "_result".to_string(),
        transaction_id,
        command_object: Amf0Value::Null,
        additional_arguments: Vec::new(),
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();

    match session.handle_input(&packet.bytes[..]) {
        Err(ClientSessionError::CreateStreamResponseHadNoStreamNumber) => (),
        x => panic!("Expected missing stream number error, instead got: {:?}", x),
    }
}

#[test]
fn metadata_event_raised_when_received_during_playback() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let stream_id = perform_successful_play_request(
        config.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let mut properties = Amf0Object::new();
    properties.insert("width", Amf0Value::Number(1920.0));
    properties.insert("height", Amf0Value::Number(1080.0));
    properties.insert("videocodecid", Amf0Value::Utf8String("avc1".to_string()));
    properties.insert("framerate", Amf0Value::Number(30.0));
    properties.insert("audiocodecid", Amf0Value::Utf8String("mp4a".to_string()));
    properties.insert("stereo", Amf0Value::Boolean(true));

    let message = RtmpMessage::Amf0Data {
        values: vec![
            Amf0Value::Utf8String("onMetaData".to_string()),
            Amf0Value::Object(properties),
        ],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), stream_id)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::StreamMetadataReceived { metadata } => {
            assert_eq!(metadata.video_width, Some(1920), "Unexpected video width");
            assert_eq!(metadata.video_height, Some(1080), "Unexpected video height");
            assert_eq!(
                metadata.video_codec,
                Some("avc1".to_string()),
                "Unexpected video codec"
            );
            assert_eq!(
                metadata.video_frame_rate,
                Some(30.0),
                "Unexpected frame rate"
            );
            assert_eq!(
                metadata.audio_codec,
                Some("mp4a".to_string()),
                "Unexpected audio codec"
            );
            assert_eq!(metadata.audio_is_stereo, Some(true), "Unexpected stereo flag");
        }

        x => panic!("Expected metadata event, instead received: {:?}", x),
    }
}

#[test]
fn audio_and_video_events_raised_when_received_during_playback() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let stream_id = perform_successful_play_request(
        config.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let video_message = RtmpMessage::VideoData {
        data: Bytes::from(vec![1_u8, 2, 3]),
    };

    let payload = video_message
        .into_message_payload(RtmpTimestamp::new(1234), stream_id)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::VideoDataReceived { data, timestamp } => {
            assert_eq!(&data[..], &[1_u8, 2, 3], "Unexpected video data");
            assert_eq!(timestamp, RtmpTimestamp::new(1234), "Unexpected timestamp");
        }

        x => panic!("Expected video data event, instead received: {:?}", x),
    }

    let audio_message = RtmpMessage::AudioData {
        data: Bytes::from(vec![4_u8, 5, 6]),
    };

    let payload = audio_message
        .into_message_payload(RtmpTimestamp::new(1235), stream_id)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::AudioDataReceived { data, timestamp } => {
            assert_eq!(&data[..], &[4_u8, 5, 6], "Unexpected audio data");
            assert_eq!(timestamp, RtmpTimestamp::new(1235), "Unexpected timestamp");
        }

        x => panic!("Expected audio data event, instead received: {:?}", x),
    }
}

#[test]
fn aggregate_message_raises_event_for_each_sub_message() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let stream_id = perform_successful_play_request(
        config.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let audio_payload = MessagePayload {
        timestamp: RtmpTimestamp::new(100),
        type_id: 8,
        message_stream_id: stream_id,
        data: Bytes::from(vec![1_u8, 2]),
    };

    let video_payload = MessagePayload {
        timestamp: RtmpTimestamp::new(105),
        type_id: 9,
        message_stream_id: stream_id,
        data: Bytes::from(vec![3_u8, 4]),
    };

    let message = RtmpMessage::Aggregate {
        messages: vec![audio_payload, video_payload],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(100), stream_id)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 2, "Expected two events returned");
    assert_vec_contains!(
        events,
        &ClientSessionEvent::AudioDataReceived { ref data, timestamp }
            if &data[..] == &[1_u8, 2] && timestamp == RtmpTimestamp::new(100)
    );
    assert_vec_contains!(
        events,
        &ClientSessionEvent::VideoDataReceived { ref data, timestamp }
            if &data[..] == &[3_u8, 4] && timestamp == RtmpTimestamp::new(105)
    );
}

#[test]
fn can_publish_metadata_while_publishing() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let stream_id =
        perform_successful_publish_request(&mut session, &mut serializer, &mut deserializer);

    let mut metadata = StreamMetadata::new();
    metadata.video_width = Some(1280);
    metadata.video_height = Some(720);
    metadata.encoder = Some("test encoder".to_string());

    let result = session.publish_metadata(&metadata).unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![result]);

    assert_eq!(responses.len(), 1, "Expected one response");
    match responses.remove(0) {
        (payload, RtmpMessage::Amf0Data { values }) => {
            assert_eq!(
                payload.message_stream_id, stream_id,
                "Unexpected message stream id"
            );
            assert_eq!(
                values[0],
                Amf0Value::Utf8String("@setDataFrame".to_string()),
                "Unexpected first data value"
            );
            assert_eq!(
                values[1],
                Amf0Value::Utf8String("onMetaData".to_string()),
                "Unexpected second data value"
            );

            match values[2] {
                Amf0Value::Object(ref properties) => {
                    assert_eq!(
                        properties.get("width"),
                        Some(&Amf0Value::Number(1280.0)),
                        "Unexpected width"
                    );
                    assert_eq!(
                        properties.get("height"),
                        Some(&Amf0Value::Number(720.0)),
                        "Unexpected height"
                    );
                    assert_eq!(
                        properties.get("encoder"),
                        Some(&Amf0Value::Utf8String("test encoder".to_string())),
                        "Unexpected encoder"
                    );
                }

                ref x => panic!("Expected amf0 object, instead received: {:?}", x),
            }
        }

        x => panic!("Expected Amf0Data, instead received: {:?}", x),
    }
}

#[test]
fn can_publish_video_data_while_publishing() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let stream_id =
        perform_successful_publish_request(&mut session, &mut serializer, &mut deserializer);

    let result = session
        .publish_video_data(Bytes::from(vec![1_u8, 2, 3]), RtmpTimestamp::new(1234), false)
        .unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![result]);

    assert_eq!(responses.len(), 1, "Expected one response");
    match responses.remove(0) {
        (payload, RtmpMessage::VideoData { data }) => {
            assert_eq!(
                payload.message_stream_id, stream_id,
                "Unexpected message stream id"
            );
            assert_eq!(
                payload.timestamp,
                RtmpTimestamp::new(1234),
                "Unexpected timestamp"
            );
            assert_eq!(&data[..], &[1_u8, 2, 3], "Unexpected video data");
        }

        x => panic!("Expected video data, instead received: {:?}", x),
    }
}

#[test]
fn can_publish_audio_data_while_publishing() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let stream_id =
        perform_successful_publish_request(&mut session, &mut serializer, &mut deserializer);

    let result = session
        .publish_audio_data(Bytes::from(vec![4_u8, 5, 6]), RtmpTimestamp::new(500), false)
        .unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![result]);

    assert_eq!(responses.len(), 1, "Expected one response");
    match responses.remove(0) {
        (payload, RtmpMessage::AudioData { data }) => {
            assert_eq!(
                payload.message_stream_id, stream_id,
                "Unexpected message stream id"
            );
            assert_eq!(
                payload.timestamp,
                RtmpTimestamp::new(500),
                "Unexpected timestamp"
            );
            assert_eq!(&data[..], &[4_u8, 5, 6], "Unexpected audio data");
        }

        x => panic!("Expected audio data, instead received: {:?}", x),
    }
}

#[test]
fn publish_video_data_before_publishing_returns_error() {
    let config = ClientSessionConfig::new();
    let (mut session, _) = ClientSession::new(config.clone()).unwrap();

    match session.publish_video_data(Bytes::from(vec![1_u8]), RtmpTimestamp::new(0), false) {
        Err(ClientSessionError::SessionInInvalidState { .. }) => (),
        x => panic!("Expected invalid state error, instead got: {:?}", x),
    }
}

#[test]
fn stop_publishing_sends_delete_stream_command() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let stream_id =
        perform_successful_publish_request(&mut session, &mut serializer, &mut deserializer);

    let result = session.stop_publishing().unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![result]);

    assert_eq!(responses.len(), 1, "Expected one response");
    match responses.remove(0) {
        (
            payload,
            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
            },
        ) => {
            assert_eq!(payload.message_stream_id, 0, "Unexpected message stream id");
            assert_eq!(command_name, "deleteStream", "Unexpected command name");
            assert_eq!(command_object, Amf0Value::Null, "Unexpected command object");
            assert_eq!(
                additional_arguments.len(),
                1,
                "Unexpected number of additional arguments"
            );
            assert_eq!(
                additional_arguments[0],
                Amf0Value::Number(stream_id as f64),
                "Unexpected argument stream id"
            );
            assert_eq!(transaction_id, 0.0, "Unexpected transaction id");
        }

        x => panic!("Expected Amf0 command, instead received: {:?}", x),
    }
}

#[test]
fn ping_request_from_server_automatically_answered() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let message = RtmpMessage::UserControl {
        event_type: UserControlEventType::PingRequest,
        stream_id: None,
        buffer_length: None,
        timestamp: Some(RtmpTimestamp::new(523)),
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (mut responses, events) = split_results(&mut deserializer, results);

    assert_eq!(responses.len(), 1, "Expected one response");
    assert_eq!(events.len(), 0, "Expected no events");
    match responses.remove(0) {
        (
            _,
            RtmpMessage::UserControl {
                event_type,
                timestamp,
                ..
            },
        ) => {
            assert_eq!(
                event_type,
                UserControlEventType::PingResponse,
                "Unexpected event type"
            );
            assert_eq!(
                timestamp,
                Some(RtmpTimestamp::new(523)),
                "Unexpected timestamp"
            );
        }

        x => panic!("Expected ping response, instead received: {:?}", x),
    }
}

#[test]
fn ping_response_from_server_raises_event() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let (result, sent_timestamp) = session.send_ping_request().unwrap();
    consume_results(&mut deserializer, vec![result]);

    let message = RtmpMessage::UserControl {
        event_type: UserControlEventType::PingResponse,
        stream_id: None,
        buffer_length: None,
        timestamp: Some(sent_timestamp),
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::PingResponseReceived { timestamp } => {
            assert_eq!(timestamp, sent_timestamp, "Unexpected timestamp");
        }

        x => panic!("Expected ping response event, instead received: {:?}", x),
    }
}

#[test]
fn shared_object_message_from_server_raises_event() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let message = RtmpMessage::SharedObject {
        name: "leaderboard".to_string(),
        version: 4,
        persistent: true,
        events: vec![SharedObjectEvent::Change {
            key: "score".to_string(),
            value: Amf0Value::Number(100.0),
        }],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::SharedObjectMessageReceived {
            name,
            version,
            persistent,
            events,
        } => {
            assert_eq!(name, "leaderboard".to_string(), "Unexpected name");
            assert_eq!(version, 4, "Unexpected version");
            assert_eq!(persistent, true, "Unexpected persistence flag");
            assert_eq!(
                events,
                vec![SharedObjectEvent::Change {
                    key: "score".to_string(),
                    value: Amf0Value::Number(100.0),
                }],
                "Unexpected events"
            );
        }

        x => panic!("Expected shared object event, instead received: {:?}", x),
    }
}

#[test]
fn can_send_shared_object_message_when_connected() {
    let app_name = "test".to_string();
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    perform_successful_connect(
        app_name.clone(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let result = session
        .send_shared_object_message(
            "leaderboard".to_string(),
            0,
            false,
            vec![SharedObjectEvent::Use],
        )
        .unwrap();
    let (mut responses, _) = split_results(&mut deserializer, vec![result]);

    assert_eq!(responses.len(), 1, "Expected one response");
    match responses.remove(0) {
        (
            _,
            RtmpMessage::SharedObject {
                name,
                version,
                persistent,
                events,
            },
        ) => {
            assert_eq!(name, "leaderboard".to_string(), "Unexpected name");
            assert_eq!(version, 0, "Unexpected version");
            assert_eq!(persistent, false, "Unexpected persistence flag");
            assert_eq!(events, vec![SharedObjectEvent::Use], "Unexpected events");
        }

        x => panic!("Expected shared object message, instead received: {:?}", x),
    }
}

#[test]
fn acknowledgement_sent_after_peer_window_size_exceeded() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let message = RtmpMessage::WindowAcknowledgement { size: 1 };
    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (responses, _) = split_results(&mut deserializer, results);

    assert_vec_contains!(responses, &(_, RtmpMessage::Acknowledgement { .. }));
}

#[test]
fn acknowledgement_from_server_raises_event() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let message = RtmpMessage::Acknowledgement {
        sequence_number: 9999,
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, events) = split_results(&mut deserializer, results);

    assert_vec_contains!(
        events,
        &ClientSessionEvent::AcknowledgementReceived {
            sequence_number: 9999,
        }
    );
}

#[test]
fn untracked_transaction_result_raises_command_response_event() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let message = RtmpMessage::Amf0Command {
        command_name: "_result".to_string(),
        transaction_id: 500.0,
        command_object: Amf0Value::Null,
        additional_arguments: Vec::new(),
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::CommandResponseReceived {
            transaction_id,
            success,
            ..
        } => {
            assert_eq!(transaction_id, 500.0, "Unexpected transaction id");
            assert!(success, "Expected a success response");
        }

        x => panic!("Expected command response event, instead received: {:?}", x),
    }
}

#[test]
fn command_request_response_raises_event_with_matching_transaction_id() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);
    perform_successful_connect(
        "some_app".to_string(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let (transaction_id, result) = session
        .send_command_request(
            "getStreamLength".to_string(),
            Amf0Value::Null,
            vec![Amf0Value::Utf8String("stream_key".to_string())],
        )
        .unwrap();

    let (mut responses, _) = split_results(&mut deserializer, vec![result]);
    assert_eq!(responses.len(), 1, "Expected one response");

    let (_, message) = responses.remove(0);
    match message {
        RtmpMessage::Amf0Command {
            command_name,
            transaction_id: sent_transaction_id,
            ..
        } => {
            assert_eq!(command_name, "getStreamLength", "Unexpected command name");
            assert_eq!(
                sent_transaction_id, transaction_id,
                "Unexpected transaction id"
            );
        }

        x => panic!("Expected Amf0Command, instead received: {:?}", x),
    }

    let message = RtmpMessage::Amf0Command {
        command_name: "_result".to_string(),
        transaction_id,
        command_object: Amf0Value::Null,
        additional_arguments: vec![Amf0Value::Number(120.5)],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, events) = split_results(&mut deserializer, results);

    assert_vec_contains!(
        events,
        &ClientSessionEvent::CommandResponseReceived {
            transaction_id: id,
            success: true,
            ..
        } if id == transaction_id
    );
}

#[test]
fn non_stream_status_notification_raises_status_event() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);
    perform_successful_connect(
        "some_app".to_string(),
        &mut session,
        &mut serializer,
        &mut deserializer,
    );

    let mut properties = Amf0Object::new();
    properties.insert(
        "level".to_string(),
        Amf0Value::Utf8String("status".to_string()),
    );
    properties.insert(
        "code".to_string(),
        Amf0Value::Utf8String("NetConnection.Connect.Closed".to_string()),
    );
    properties.insert(
        "description".to_string(),
        Amf0Value::Utf8String("Connection closing".to_string()),
    );

    let message = RtmpMessage::Amf0Command {
        command_name: "onStatus".to_string(),
        transaction_id: 0.0,
        command_object: Amf0Value::Null,
        additional_arguments: vec![Amf0Value::Object(properties)],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, events) = split_results(&mut deserializer, results);

    assert_vec_contains!(
        events,
        &ClientSessionEvent::StatusReceived {
            ref code,
            ref description,
        } if code == "NetConnection.Connect.Closed" && description == "Connection closing"
    );
}

#[test]
fn unhandleable_command_raises_event() {
    let config = ClientSessionConfig::new();
    let mut deserializer = ChunkDeserializer::new();
    let mut serializer = ChunkSerializer::new();
    let (mut session, initial_results) = ClientSession::new(config.clone()).unwrap();
    consume_results(&mut deserializer, initial_results);

    let message = RtmpMessage::Amf0Command {
        command_name: "onBWDone".to_string(),
        transaction_id: 0.0,
        command_object: Amf0Value::Null,
        additional_arguments: vec![Amf0Value::Number(8192.0)],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    let results = session.handle_input(&packet.bytes[..]).unwrap();
    let (_, mut events) = split_results(&mut deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::UnhandleableAmf0Command { command_name, .. } => {
            assert_eq!(command_name, "onBWDone".to_string(), "Unexpected command name");
        }

        x => panic!("Expected unhandleable command event, instead received: {:?}", x),
    }
}

fn split_results(
    deserializer: &mut ChunkDeserializer,
    mut results: Vec<ClientSessionResult>,
) -> (Vec<(MessagePayload, RtmpMessage)>, Vec<ClientSessionEvent>) {
    let mut responses = Vec::new();
    let mut events = Vec::new();

    for result in results.drain(..) {
        match result {
            ClientSessionResult::OutboundResponse(packet) => {
                let payload = deserializer
                    .get_next_message(&packet.bytes[..])
                    .unwrap()
                    .unwrap();
                let message = payload.to_rtmp_message().unwrap();
                match message {
                    RtmpMessage::SetChunkSize { size } => {
                        deserializer.set_max_chunk_size(size as usize).unwrap()
                    }
                    _ => (),
                }

                println!("response received: {:?}", message);
                responses.push((payload, message));
            }

            ClientSessionResult::RaisedEvent(event) => {
                println!("event received: {:?}", event);
                events.push(event);
            }

            ClientSessionResult::UnhandleableMessageReceived(payload) => {
                println!("unhandleable message: {:?}", payload);
            }
        }
    }

    (responses, events)
}

fn consume_results(deserializer: &mut ChunkDeserializer, results: Vec<ClientSessionResult>) {
    // Needed to keep the deserializer up to date
    split_results(deserializer, results);
}

fn get_connect_success_response(serializer: &mut ChunkSerializer) -> Packet {
    let mut command_properties = Amf0Object::new();
    command_properties.insert("fmsVer", Amf0Value::Utf8String("fms".to_string()));
    command_properties.insert("capabilities", Amf0Value::Number(31.0));

    let mut additional_properties = Amf0Object::new();
    additional_properties.insert("level", Amf0Value::Utf8String("status".to_string()));
    additional_properties.insert(
        "code",
        Amf0Value::Utf8String("NetConnection.Connect.Success".to_string()),
    );
    additional_properties.insert("description", Amf0Value::Utf8String("hi".to_string()));
    additional_properties.insert("objectEncoding", Amf0Value::Number(0.0));

    let message = RtmpMessage::Amf0Command {
        command_name: "_result".to_string(),
        transaction_id: 1.0,
        command_object: Amf0Value::Object(command_properties),
        additional_arguments: vec![Amf0Value::Object(additional_properties)],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    serializer.serialize(&payload, false, false).unwrap()
}

fn get_connect_error_response(serializer: &mut ChunkSerializer) -> Packet {
    let mut command_properties = Amf0Object::new();
    command_properties.insert("fmsVer", Amf0Value::Utf8String("fms".to_string()));
    command_properties.insert("capabilities", Amf0Value::Number(31.0));

    let mut additional_properties = Amf0Object::new();
    additional_properties.insert("level", Amf0Value::Utf8String("error".to_string()));
    additional_properties.insert(
        "code",
        Amf0Value::Utf8String("NetConnection.Connect.Failed".to_string()),
    );
    additional_properties.insert("description", Amf0Value::Utf8String("hi".to_string()));
    additional_properties.insert("objectEncoding", Amf0Value::Number(0.0));

    let message = RtmpMessage::Amf0Command {
        command_name: "_error".to_string(),
        transaction_id: 1.0,
        command_object: Amf0Value::Object(command_properties),
        additional_arguments: vec![Amf0Value::Object(additional_properties)],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    serializer.serialize(&payload, false, false).unwrap()
}

fn get_create_stream_success_response(
    transaction_id: f64,
    serializer: &mut ChunkSerializer,
) -> (u32, Packet) {
    let stream_id = rand::random::<u32>();
    let message = RtmpMessage::Amf0Command {
        command_name: "_result".to_string(),
        command_object: Amf0Value::Null,
        additional_arguments: vec![Amf0Value::Number(stream_id as f64)],
        transaction_id,
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), 0)
        .unwrap();
    let packet = serializer.serialize(&payload, false, false).unwrap();
    (stream_id, packet)
}

fn get_play_success_response(serializer: &mut ChunkSerializer, stream_id: u32) -> Packet {
    get_on_status_response(serializer, stream_id, "NetStream.Play.Start")
}

fn get_publish_success_response(serializer: &mut ChunkSerializer, stream_id: u32) -> Packet {
    get_on_status_response(serializer, stream_id, "NetStream.Publish.Start")
}

fn get_on_status_response(
    serializer: &mut ChunkSerializer,
    stream_id: u32,
    code: &str,
) -> Packet {
    let mut additional_properties = Amf0Object::new();
    additional_properties.insert("level", Amf0Value::Utf8String("status".to_string()));
    additional_properties.insert("code", Amf0Value::Utf8String(code.to_string()));
    additional_properties.insert("description", Amf0Value::Utf8String("hi".to_string()));

    let message = RtmpMessage::Amf0Command {
        command_name: "onStatus".to_string(),
        transaction_id: 0.0,
        command_object: Amf0Value::Null,
        additional_arguments: vec![Amf0Value::Object(additional_properties)],
    };

    let payload = message
        .into_message_payload(RtmpTimestamp::new(0), stream_id)
        .unwrap();
    serializer.serialize(&payload, false, false).unwrap()
}

fn perform_successful_connect(
    app_name: String,
    session: &mut ClientSession,
    serializer: &mut ChunkSerializer,
    deserializer: &mut ChunkDeserializer,
) {
    let results = session.request_connection(app_name).unwrap();
    consume_results(deserializer, vec![results]);

    let response = get_connect_success_response(serializer);
    let results = session.handle_input(&response.bytes[..]).unwrap();
    let (_, mut events) = split_results(deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::ConnectionRequestAccepted => (),
        x => panic!(
            "Expected connection accepted event, instead received: {:?}",
            x
        ),
    }
}

fn perform_successful_play_request(
    config: ClientSessionConfig,
    session: &mut ClientSession,
    serializer: &mut ChunkSerializer,
    deserializer: &mut ChunkDeserializer,
) -> u32 {
    let stream_key = "abcd".to_string();
    let result = session.request_playback(stream_key.clone()).unwrap();
    let (mut responses, _) = split_results(deserializer, vec![result]);

    assert_eq!(responses.len(), 1, "Unexpected number of responses");
    let transaction_id = match responses.remove(0) {
        (
            payload,
            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
            },
        ) => {
            assert_eq!(payload.message_stream_id, 0, "Unexpected stream id");
            assert_eq!(command_name, "createStream", "Unexpected command name");
            assert_eq!(command_object, Amf0Value::Null, "Unexpected command object");
            assert_eq!(
                additional_arguments.len(),
                0,
                "Unexpected number of additional arguments"
            );
            transaction_id
        }

        x => panic!("Unexpected response seen: {:?}", x),
    };

    let (created_stream_id, create_stream_response) =
        get_create_stream_success_response(transaction_id, serializer);
    let results = session
        .handle_input(&create_stream_response.bytes[..])
        .unwrap();
    let (mut responses, _) = split_results(deserializer, results);

    assert_eq!(responses.len(), 2, "Unexpected number of responses");
    match responses.remove(0) {
        (
            payload,
            RtmpMessage::UserControl {
                event_type,
                stream_id,
                buffer_length,
                timestamp,
            },
        ) => {
            assert_eq!(payload.message_stream_id, 0, "Unexpected message stream id");
            assert_eq!(
                stream_id,
                Some(created_stream_id),
                "Unexpected user control stream id"
            );
            assert_eq!(
                event_type,
                UserControlEventType::SetBufferLength,
                "Unexpected user control event type"
            );
            assert_eq!(
                buffer_length,
                Some(config.playback_buffer_length_ms),
                "Unexpected playback buffer length"
            );
            assert_eq!(timestamp, None, "Unexpected timestamp");
        }

        x => panic!(
            "Expected set buffer length message, instead received: {:?}",
            x
        ),
    }

    match responses.remove(0) {
        (
            payload,
            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
            },
        ) => {
            assert_eq!(
                payload.message_stream_id, created_stream_id,
                "Unexpected message stream id"
            );
            assert_eq!(command_name, "play".to_string(), "Unexpected command name");
            assert_eq!(transaction_id, 0.0, "Unexpected transaction id");
            assert_eq!(command_object, Amf0Value::Null, "Unexpected command object");
            assert_eq!(
                additional_arguments.len(),
                1,
                "Unexpected number of additional arguments"
            );
            assert_eq!(
                additional_arguments[0],
                Amf0Value::Utf8String(stream_key.clone()),
                "Unexpected stream key"
            );
        }

        x => panic!("Expected play message, instead received: {:?}", x),
    };

    let play_response = get_play_success_response(serializer, created_stream_id);
    let results = session.handle_input(&play_response.bytes[..]).unwrap();
    let (_, mut events) = split_results(deserializer, results);

    assert_eq!(events.len(), 1, "Expected one event returned");
    match events.remove(0) {
        ClientSessionEvent::PlaybackRequestAccepted => (),
        x => panic!(
            "Expected playback accepted event, instead received: {:?}",
            x
        ),
    }

    created_stream_id
}

fn perform_successful_publish_request(
    session: &mut ClientSession,
    serializer: &mut ChunkSerializer,
    deserializer: &mut ChunkDeserializer,
) -> u32 {
    let stream_key = "abcd".to_string();
    let result = session
        .request_publishing(stream_key.clone(), PublishRequestType::Live)
        .unwrap();
    let (mut responses, _) = split_results(deserializer, vec![result]);

    assert_eq!(responses.len(), 1, "Unexpected number of responses");
    let transaction_id = match responses.remove(0) {
        (
            payload,
            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
            },
        ) => {
            assert_eq!(payload.message_stream_id, 0, "Unexpected stream id");
            assert_eq!(command_name, "createStream", "Unexpected command name");
            assert_eq!(command_object, Amf0Value::Null, "Unexpected command object");
            assert_eq!(
                additional_arguments.len(),
                0,
                "Unexpected number of additional arguments"
            );
            transaction_id
        }

        x => panic!("Unexpected response seen: {:?}", x),
    };

    let (created_stream_id, create_stream_response) =
        get_create_stream_success_response(transaction_id, serializer);
    let results = session
        .handle_input(&create_stream_response.bytes[..])
        .unwrap();
    let (mut responses, _) = split_results(deserializer, results);

    assert_eq!(responses.len(), 1, "Unexpected number of responses");
    match responses.remove(0) {
        (
            payload,
            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
            },
        ) => {
            assert_eq!(
                payload.message_stream_id, created_stream_id,
                "Unexpected message stream id"
            );
            assert_eq!(
                command_name,
                "publish".to_string(),
                "Unexpected command name"
            );
            assert_eq!(command_object, Amf0Value::Null, "Unexpected command object");
            assert_eq!(transaction_id, 0.0, "Unexpected transaction id");
            assert_eq!(
                additional_arguments.len(),
                2,
                "Unexpected number of additional arguments"
            );
            assert_eq!(
                additional_arguments[0],
                Amf0Value::Utf8String(stream_key.clone()),
                "Unexpected stream key"
            );
            assert_eq!(
                additional_arguments[1],
                Amf0Value::Utf8String("live".to_string()),
                "Unexpected publish type"
            );
        }

        x => panic!("Expected amf0 command, received: {:?}", x),
    };

    let publish_response = get_publish_success_response(serializer, created_stream_id);
    let results = session.handle_input(&publish_response.bytes[..]).unwrap();
    let (_, mut events) = split_results(deserializer, results);

    assert_eq!(events.len(), 1, "Unexpected number of events");
    match events.remove(0) {
        ClientSessionEvent::PublishRequestAccepted => (),
        x => panic!(
            "Expected publish request accepted event, instead received: {:?}",
            x
        ),
    }

    created_stream_id
}
