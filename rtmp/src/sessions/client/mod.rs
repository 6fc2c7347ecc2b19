mod config;
mod errors;
mod events;
mod outstanding_transaction;
mod publish_request_type;
mod result;
mod state;

#[cfg(test)]
mod tests;

pub use self::config::ClientSessionConfig;
pub use self::errors::ClientSessionError;
pub use self::events::ClientSessionEvent;
pub use self::publish_request_type::PublishRequestType;
pub use self::result::ClientSessionResult;
pub use self::state::ClientState;

use std::collections::HashMap;
use std::time::Instant;

use bytes::Bytes;
use freshet_amf0::{Amf0Object, Amf0Value};

use self::outstanding_transaction::{OutstandingTransaction, TransactionPurpose};
use chunk_io::{ChunkDeserializer, ChunkSerializer};
use messages::{MessagePayload, RtmpMessage, SharedObjectEvent, UserControlEventType};
use sessions::StreamMetadata;
use time::RtmpTimestamp;

/// A session for a client application connecting to an RTMP server.
///
/// The session works on a sans-IO basis.  Bytes received from the server are passed into
/// `handle_input()` and every method returns `ClientSessionResult`s describing packets that
/// must be sent to the server (in order) and events for the consuming application to react
/// to.  The session itself never touches the network.
///
/// The session assumes the handshake has already been completed, and any leftover bytes the
/// handshake handler returned should be the first input passed in.
pub struct ClientSession {
    config: ClientSessionConfig,
    serializer: ChunkSerializer,
    deserializer: ChunkDeserializer,
    current_state: ClientState,
    connected_app_name: Option<String>,
    next_request_number: u32,
    outstanding_requests: HashMap<u32, OutstandingTransaction>,
    active_stream_id: Option<u32>,
    peer_window_ack_size: Option<u32>,
    bytes_received: u32,
    bytes_received_since_last_ack: u32,
    start_time: Instant,
}

impl ClientSession {
    /// Creates a new client session.  Any results returned must be handled before results
    /// from any other session method.
    pub fn new(
        config: ClientSessionConfig,
    ) -> Result<(ClientSession, Vec<ClientSessionResult>), ClientSessionError> {
        let session = ClientSession {
            config,
            serializer: ChunkSerializer::new(),
            deserializer: ChunkDeserializer::new(),
            current_state: ClientState::Disconnected,
            connected_app_name: None,
            next_request_number: 1,
            outstanding_requests: HashMap::new(),
            active_stream_id: None,
            peer_window_ack_size: None,
            bytes_received: 0,
            bytes_received_since_last_ack: 0,
            start_time: Instant::now(),
        };

        Ok((session, Vec::new()))
    }

    /// The state the session is currently in
    pub fn get_current_state(&self) -> ClientState {
        self.current_state.clone()
    }

    /// Takes in bytes that are encoding RTMP chunks from the server and returns any responses
    /// or events that can be reacted to.
    pub fn handle_input(
        &mut self,
        bytes: &[u8],
    ) -> Result<Vec<ClientSessionResult>, ClientSessionError> {
        let mut results = Vec::new();
        let mut bytes_to_process = bytes;

        self.bytes_received = self.bytes_received.wrapping_add(bytes.len() as u32);
        self.bytes_received_since_last_ack += bytes.len() as u32;

        loop {
            match self.deserializer.get_next_message(bytes_to_process)? {
                None => break,
                Some(payload) => self.handle_message_payload(payload, &mut results)?,
            }

            bytes_to_process = &[];
        }

        if let Some(window_size) = self.peer_window_ack_size {
            if self.bytes_received_since_last_ack >= window_size {
                self.bytes_received_since_last_ack = 0;
                let message = RtmpMessage::Acknowledgement {
                    sequence_number: self.bytes_received,
                };

                results.push(self.send_message(message, 0, false)?);
            }
        }

        Ok(results)
    }

    /// Requests a connection to the specified RTMP application
    pub fn request_connection(
        &mut self,
        app_name: String,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Disconnected => (),
            _ => return Err(ClientSessionError::CantConnectWhileAlreadyConnected),
        }

        let mut command_object = Amf0Object::new();
        command_object.insert("app", Amf0Value::Utf8String(app_name.clone()));
        command_object.insert(
            "flashVer",
            Amf0Value::Utf8String(self.config.flash_version.clone()),
        );

        if let Some(ref swf_url) = self.config.swf_url {
            command_object.insert("swfUrl", Amf0Value::Utf8String(swf_url.clone()));
        }

        if let Some(ref tc_url) = self.config.tc_url {
            command_object.insert("tcUrl", Amf0Value::Utf8String(tc_url.clone()));
        }

        command_object.insert("fpad", Amf0Value::Boolean(false));
        command_object.insert("capabilities", Amf0Value::Number(239.0));
        command_object.insert("audioCodecs", Amf0Value::Number(1024.0));
        command_object.insert("videoCodecs", Amf0Value::Number(128.0));
        command_object.insert("videoFunction", Amf0Value::Number(1.0));

        if let Some(ref page_url) = self.config.page_url {
            command_object.insert("pageUrl", Amf0Value::Utf8String(page_url.clone()));
        }

        command_object.insert("objectEncoding", Amf0Value::Number(0.0));

        let transaction = self.get_next_request_number();
        self.outstanding_requests.insert(
            transaction,
            OutstandingTransaction::ConnectionRequested { app_name },
        );

        self.send_command(
            0,
            transaction as f64,
            "connect".to_string(),
            Amf0Value::Object(command_object),
            Vec::new(),
        )
    }

    /// Requests playback of the specified stream key.  The session must have already had its
    /// connection request accepted.
    pub fn request_playback(
        &mut self,
        stream_key: String,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Connected => (),
            _ => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
        }

        let purpose = TransactionPurpose::PlayRequest { stream_key };
        self.request_create_stream(purpose)
    }

    /// Requests publishing on the specified stream key.  The session must have already had its
    /// connection request accepted.
    pub fn request_publishing(
        &mut self,
        stream_key: String,
        request_type: PublishRequestType,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Connected => (),
            _ => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
        }

        let purpose = TransactionPurpose::PublishRequest {
            stream_key,
            request_type,
        };

        self.request_create_stream(purpose)
    }

    /// Stops an active or requested publishing session by deleting the stream that was
    /// created for it.  The session can then issue another publish or playback request.
    pub fn stop_publishing(&mut self) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Publishing { .. } | ClientState::PublishRequested { .. } => (),
            _ => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
        }

        self.current_state = ClientState::Connected;
        self.send_delete_stream()
    }

    /// Stops an active or requested playback session by deleting the stream that was
    /// created for it.  The session can then issue another publish or playback request.
    pub fn stop_playback(&mut self) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Playing { .. } | ClientState::PlayRequested { .. } => (),
            _ => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
        }

        self.current_state = ClientState::Connected;
        self.send_delete_stream()
    }

    /// Sends the metadata of the stream being published to the server
    pub fn publish_metadata(
        &mut self,
        metadata: &StreamMetadata,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Publishing { .. } => (),
            _ => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
        }

        let stream_id = match self.active_stream_id {
            Some(x) => x,
            None => return Err(ClientSessionError::NoKnownActiveStreamIdWhenRequired),
        };

        let message = RtmpMessage::Amf0Data {
            values: vec![
                Amf0Value::Utf8String("@setDataFrame".to_string()),
                Amf0Value::Utf8String("onMetaData".to_string()),
                Amf0Value::Object(metadata.to_amf0_object()),
            ],
        };

        self.send_message(message, stream_id, false)
    }

    /// Sends video data for the stream being published to the server
    pub fn publish_video_data(
        &mut self,
        data: Bytes,
        timestamp: RtmpTimestamp,
        can_be_dropped: bool,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Publishing { .. } => (),
            _ => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
        }

        let stream_id = match self.active_stream_id {
            Some(x) => x,
            None => return Err(ClientSessionError::NoKnownActiveStreamIdWhenRequired),
        };

        let message = RtmpMessage::VideoData { data };
        let payload = message.into_message_payload(timestamp, stream_id)?;
        let packet = self.serializer.serialize(&payload, false, can_be_dropped)?;
        Ok(ClientSessionResult::OutboundResponse(packet))
    }

    /// Sends audio data for the stream being published to the server
    pub fn publish_audio_data(
        &mut self,
        data: Bytes,
        timestamp: RtmpTimestamp,
        can_be_dropped: bool,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Publishing { .. } => (),
            _ => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
        }

        let stream_id = match self.active_stream_id {
            Some(x) => x,
            None => return Err(ClientSessionError::NoKnownActiveStreamIdWhenRequired),
        };

        let message = RtmpMessage::AudioData { data };
        let payload = message.into_message_payload(timestamp, stream_id)?;
        let packet = self.serializer.serialize(&payload, false, can_be_dropped)?;
        Ok(ClientSessionResult::OutboundResponse(packet))
    }

    /// Sends an ordered batch of events for the named shared object to the server.  Returns
    /// the packet to send along with nothing else, as shared object responses come back
    /// asynchronously as `SharedObjectMessageReceived` events.
    pub fn send_shared_object_message(
        &mut self,
        name: String,
        version: u32,
        persistent: bool,
        events: Vec<SharedObjectEvent>,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        match self.current_state {
            ClientState::Disconnected => {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.current_state.clone(),
                })
            }
            _ => (),
        }

        let message = RtmpMessage::SharedObject {
            name,
            version,
            persistent,
            events,
        };

        self.send_message(message, 0, false)
    }

    /// Sends an arbitrary command to the server with the next transaction id.
    ///
    /// The session does not track the transaction itself.  The server's reply (if any)
    /// surfaces as a `CommandResponseReceived` event carrying the returned transaction
    /// id, so callers can maintain their own pending-response bookkeeping.
    pub fn send_command_request(
        &mut self,
        command_name: String,
        command_object: Amf0Value,
        additional_arguments: Vec<Amf0Value>,
    ) -> Result<(f64, ClientSessionResult), ClientSessionError> {
        let transaction = self.get_next_request_number() as f64;
        let result = self.send_command(
            0,
            transaction,
            command_name,
            command_object,
            additional_arguments,
        )?;

        Ok((transaction, result))
    }

    /// Sends a ping request to the server.  Returns the packet to send and the timestamp that
    /// was contained in the ping request, so consumers can match it against the raised
    /// `PingResponseReceived` event for round trip time calculations.
    pub fn send_ping_request(
        &mut self,
    ) -> Result<(ClientSessionResult, RtmpTimestamp), ClientSessionError> {
        let timestamp = self.get_epoch();
        let message = RtmpMessage::UserControl {
            event_type: UserControlEventType::PingRequest,
            stream_id: None,
            buffer_length: None,
            timestamp: Some(timestamp),
        };

        let result = self.send_message(message, 0, false)?;
        Ok((result, timestamp))
    }

    fn request_create_stream(
        &mut self,
        purpose: TransactionPurpose,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        let transaction = self.get_next_request_number();
        self.outstanding_requests
            .insert(transaction, OutstandingTransaction::CreateStream { purpose });

        self.send_command(
            0,
            transaction as f64,
            "createStream".to_string(),
            Amf0Value::Null,
            Vec::new(),
        )
    }

    fn send_delete_stream(&mut self) -> Result<ClientSessionResult, ClientSessionError> {
        let stream_id = match self.active_stream_id.take() {
            Some(x) => x,
            None => return Err(ClientSessionError::NoKnownActiveStreamIdWhenRequired),
        };

        self.send_command(
            0,
            0.0,
            "deleteStream".to_string(),
            Amf0Value::Null,
            vec![Amf0Value::Number(stream_id as f64)],
        )
    }

    fn handle_message_payload(
        &mut self,
        payload: MessagePayload,
        results: &mut Vec<ClientSessionResult>,
    ) -> Result<(), ClientSessionError> {
        let message = match payload.to_rtmp_message() {
            Ok(message) => message,
            Err(_) => {
                results.push(ClientSessionResult::UnhandleableMessageReceived(payload));
                return Ok(());
            }
        };

        match message {
            RtmpMessage::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
            } => self.handle_amf0_command(
                command_name,
                transaction_id,
                command_object,
                additional_arguments,
                results,
            )?,

            RtmpMessage::Amf0Data { values } => self.handle_amf0_data(values, results),

            RtmpMessage::AudioData { data } => {
                let event = ClientSessionEvent::AudioDataReceived {
                    data,
                    timestamp: payload.timestamp,
                };

                results.push(ClientSessionResult::RaisedEvent(event));
            }

            RtmpMessage::VideoData { data } => {
                let event = ClientSessionEvent::VideoDataReceived {
                    data,
                    timestamp: payload.timestamp,
                };

                results.push(ClientSessionResult::RaisedEvent(event));
            }

            RtmpMessage::Aggregate { messages } => {
                for sub_payload in messages {
                    self.handle_message_payload(sub_payload, results)?;
                }
            }

            RtmpMessage::SetChunkSize { size } => {
                self.deserializer.set_max_chunk_size(size as usize)?;
            }

            RtmpMessage::WindowAcknowledgement { size } => {
                self.peer_window_ack_size = Some(size);
            }

            RtmpMessage::Acknowledgement { sequence_number } => {
                let event = ClientSessionEvent::AcknowledgementReceived { sequence_number };
                results.push(ClientSessionResult::RaisedEvent(event));
            }

            RtmpMessage::SharedObject {
                name,
                version,
                persistent,
                events,
            } => {
                let event = ClientSessionEvent::SharedObjectMessageReceived {
                    name,
                    version,
                    persistent,
                    events,
                };

                results.push(ClientSessionResult::RaisedEvent(event));
            }

            RtmpMessage::UserControl {
                event_type,
                timestamp,
                ..
            } => self.handle_user_control(event_type, timestamp, results)?,

            // We don't perform any bandwidth limiting of our own, and aborted chunk streams
            // are dealt with inside the deserializer.
            RtmpMessage::SetPeerBandwidth { .. } => (),
            RtmpMessage::Abort { .. } => (),

            RtmpMessage::Unknown { .. } => {
                results.push(ClientSessionResult::UnhandleableMessageReceived(payload));
            }
        }

        Ok(())
    }

    fn handle_amf0_command(
        &mut self,
        command_name: String,
        transaction_id: f64,
        command_object: Amf0Value,
        additional_arguments: Vec<Amf0Value>,
        results: &mut Vec<ClientSessionResult>,
    ) -> Result<(), ClientSessionError> {
        match command_name.as_str() {
            "_result" => self.handle_command_result(
                transaction_id,
                command_object,
                additional_arguments,
                results,
            )?,

            "_error" => self.handle_command_error(
                transaction_id,
                command_object,
                additional_arguments,
                results,
            ),

            "onStatus" => self.handle_on_status(additional_arguments, results)?,

            _ => {
                let event = ClientSessionEvent::UnhandleableAmf0Command {
                    command_name,
                    transaction_id,
                    command_object,
                    additional_values: additional_arguments,
                };

                results.push(ClientSessionResult::RaisedEvent(event));
            }
        }

        Ok(())
    }

    fn handle_command_result(
        &mut self,
        transaction_id: f64,
        command_object: Amf0Value,
        additional_arguments: Vec<Amf0Value>,
        results: &mut Vec<ClientSessionResult>,
    ) -> Result<(), ClientSessionError> {
        let outstanding_request = self.outstanding_requests.remove(&(transaction_id as u32));
        match outstanding_request {
            Some(OutstandingTransaction::ConnectionRequested { app_name }) => {
                self.connected_app_name = Some(app_name);
                self.current_state = ClientState::Connected;

                let epoch = self.get_epoch();
                let chunk_size_packet = self
                    .serializer
                    .set_max_chunk_size(self.config.chunk_size, epoch)?;

                results.push(ClientSessionResult::OutboundResponse(chunk_size_packet));

                let ack_message = RtmpMessage::WindowAcknowledgement {
                    size: self.config.window_ack_size,
                };

                results.push(self.send_message(ack_message, 0, false)?);
                results.push(ClientSessionResult::RaisedEvent(
                    ClientSessionEvent::ConnectionRequestAccepted,
                ));
            }

            Some(OutstandingTransaction::CreateStream { purpose }) => {
                let stream_id = match additional_arguments.into_iter().next() {
                    Some(Amf0Value::Number(stream_id)) => stream_id as u32,
                    _ => return Err(ClientSessionError::CreateStreamResponseHadNoStreamNumber),
                };

                self.active_stream_id = Some(stream_id);
                match purpose {
                    TransactionPurpose::PlayRequest { stream_key } => {
                        self.start_playback(stream_id, stream_key, results)?;
                    }

                    TransactionPurpose::PublishRequest {
                        stream_key,
                        request_type,
                    } => {
                        self.start_publishing(stream_id, stream_key, request_type, results)?;
                    }
                }
            }

            None => {
                let event = ClientSessionEvent::CommandResponseReceived {
                    transaction_id,
                    success: true,
                    command_object,
                    additional_values: additional_arguments,
                };

                results.push(ClientSessionResult::RaisedEvent(event));
            }
        }

        Ok(())
    }

    fn handle_command_error(
        &mut self,
        transaction_id: f64,
        command_object: Amf0Value,
        additional_arguments: Vec<Amf0Value>,
        results: &mut Vec<ClientSessionResult>,
    ) {
        let outstanding_request = self.outstanding_requests.remove(&(transaction_id as u32));
        match outstanding_request {
            Some(OutstandingTransaction::ConnectionRequested { .. }) => {
                let description = get_error_description(&additional_arguments);
                let event = ClientSessionEvent::ConnectionRequestRejected { description };
                results.push(ClientSessionResult::RaisedEvent(event));
            }

            _ => {
                let event = ClientSessionEvent::CommandResponseReceived {
                    transaction_id,
                    success: false,
                    command_object,
                    additional_values: additional_arguments,
                };

                results.push(ClientSessionResult::RaisedEvent(event));
            }
        }
    }

    fn handle_on_status(
        &mut self,
        additional_arguments: Vec<Amf0Value>,
        results: &mut Vec<ClientSessionResult>,
    ) -> Result<(), ClientSessionError> {
        let (code, description) = match additional_arguments.into_iter().next() {
            Some(Amf0Value::Object(properties)) => {
                let code = match properties.get("code") {
                    Some(&Amf0Value::Utf8String(ref code)) => code.clone(),
                    _ => return Err(ClientSessionError::InvalidOnStatusArguments),
                };

                let description = match properties.get("description") {
                    Some(&Amf0Value::Utf8String(ref description)) => description.clone(),
                    _ => String::new(),
                };

                (code, description)
            }
            _ => return Err(ClientSessionError::InvalidOnStatusArguments),
        };

        match code.as_str() {
            "NetStream.Play.Start" => {
                if let ClientState::PlayRequested { stream_key } = self.current_state.clone() {
                    self.current_state = ClientState::Playing { stream_key };
                    results.push(ClientSessionResult::RaisedEvent(
                        ClientSessionEvent::PlaybackRequestAccepted,
                    ));
                }
            }

            "NetStream.Publish.Start" => {
                if let ClientState::PublishRequested { stream_key } = self.current_state.clone() {
                    self.current_state = ClientState::Publishing { stream_key };
                    results.push(ClientSessionResult::RaisedEvent(
                        ClientSessionEvent::PublishRequestAccepted,
                    ));
                }
            }

            // Other codes (NetStream.Play.Reset, NetConnection.Connect.Closed, etc..)
            // get surfaced for the consuming application to dispatch on.
            _ => {
                results.push(ClientSessionResult::RaisedEvent(
                    ClientSessionEvent::StatusReceived { code, description },
                ));
            }
        }

        Ok(())
    }

    fn handle_amf0_data(&mut self, values: Vec<Amf0Value>, results: &mut Vec<ClientSessionResult>) {
        let mut iterator = values.into_iter();
        match iterator.next() {
            Some(Amf0Value::Utf8String(ref name)) if name == "onMetaData" => (),
            _ => return,
        }

        if let Some(Amf0Value::Object(properties)) = iterator.next() {
            let mut metadata = StreamMetadata::new();
            metadata.apply_metadata_values(&properties);

            let event = ClientSessionEvent::StreamMetadataReceived { metadata };
            results.push(ClientSessionResult::RaisedEvent(event));
        }
    }

    fn handle_user_control(
        &mut self,
        event_type: UserControlEventType,
        timestamp: Option<RtmpTimestamp>,
        results: &mut Vec<ClientSessionResult>,
    ) -> Result<(), ClientSessionError> {
        match event_type {
            UserControlEventType::PingRequest => {
                let message = RtmpMessage::UserControl {
                    event_type: UserControlEventType::PingResponse,
                    stream_id: None,
                    buffer_length: None,
                    timestamp,
                };

                results.push(self.send_message(message, 0, false)?);
            }

            UserControlEventType::PingResponse => {
                let event = ClientSessionEvent::PingResponseReceived {
                    timestamp: timestamp.unwrap_or(RtmpTimestamp::new(0)),
                };

                results.push(ClientSessionResult::RaisedEvent(event));
            }

            // Stream begin/eof/dry and recorded notifications carry no actionable
            // information for us.
            _ => (),
        }

        Ok(())
    }

    fn start_playback(
        &mut self,
        stream_id: u32,
        stream_key: String,
        results: &mut Vec<ClientSessionResult>,
    ) -> Result<(), ClientSessionError> {
        let buffer_message = RtmpMessage::UserControl {
            event_type: UserControlEventType::SetBufferLength,
            stream_id: Some(stream_id),
            buffer_length: Some(self.config.playback_buffer_length_ms),
            timestamp: None,
        };

        results.push(self.send_message(buffer_message, 0, false)?);

        let play_result = self.send_command(
            stream_id,
            0.0,
            "play".to_string(),
            Amf0Value::Null,
            vec![Amf0Value::Utf8String(stream_key.clone())],
        )?;

        results.push(play_result);
        self.current_state = ClientState::PlayRequested { stream_key };
        Ok(())
    }

    fn start_publishing(
        &mut self,
        stream_id: u32,
        stream_key: String,
        request_type: PublishRequestType,
        results: &mut Vec<ClientSessionResult>,
    ) -> Result<(), ClientSessionError> {
        let mode = match request_type {
            PublishRequestType::Live => "live",
            PublishRequestType::Record => "record",
            PublishRequestType::Append => "append",
        };

        let publish_result = self.send_command(
            stream_id,
            0.0,
            "publish".to_string(),
            Amf0Value::Null,
            vec![
                Amf0Value::Utf8String(stream_key.clone()),
                Amf0Value::Utf8String(mode.to_string()),
            ],
        )?;

        results.push(publish_result);
        self.current_state = ClientState::PublishRequested { stream_key };
        Ok(())
    }

    fn send_command(
        &mut self,
        stream_id: u32,
        transaction_id: f64,
        command_name: String,
        command_object: Amf0Value,
        additional_arguments: Vec<Amf0Value>,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        let message = RtmpMessage::Amf0Command {
            command_name,
            transaction_id,
            command_object,
            additional_arguments,
        };

        self.send_message(message, stream_id, false)
    }

    fn send_message(
        &mut self,
        message: RtmpMessage,
        stream_id: u32,
        can_be_dropped: bool,
    ) -> Result<ClientSessionResult, ClientSessionError> {
        let epoch = self.get_epoch();
        let payload = message.into_message_payload(epoch, stream_id)?;
        let packet = self.serializer.serialize(&payload, false, can_be_dropped)?;
        Ok(ClientSessionResult::OutboundResponse(packet))
    }

    fn get_next_request_number(&mut self) -> u32 {
        let number = self.next_request_number;
        self.next_request_number += 1;
        number
    }

    fn get_epoch(&self) -> RtmpTimestamp {
        RtmpTimestamp::new(self.start_time.elapsed().as_millis() as u32)
    }
}

fn get_error_description(additional_arguments: &[Amf0Value]) -> String {
    if let Some(&Amf0Value::Object(ref properties)) = additional_arguments.first() {
        if let Some(&Amf0Value::Utf8String(ref description)) = properties.get("description") {
            return description.clone();
        }

        if let Some(&Amf0Value::Utf8String(ref code)) = properties.get("code") {
            return code.clone();
        }
    }

    String::new()
}
