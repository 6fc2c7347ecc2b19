/*!
This module contains a blocking connection driver that puts a network underneath the
sans-IO protocol pieces.

A `Connection` owns one transport (selected by the url scheme), runs the handshake,
and services a client session from a single thread: bytes the transport reads are fed
into the session, packets the session produces are queued on the transport, and session
events are translated into `ConnectionEvent`s for the application.  It also layers the
pieces the session itself stays agnostic of: command responders matched by transaction
id, the legacy Adobe authentication retry dance, shared object synchronization, and a
once-per-second statistics tick with a backpressure hint for publishers.

Applications drive the connection by calling `service()` in a loop.  Every call
performs one bounded round of network work, so the loop stays responsive without
busy-waiting (the transport's read timeout provides the pacing).
*/

mod backpressure;
mod config;
mod errors;
mod events;
mod pending_calls;

pub use self::config::ConnectionConfig;
pub use self::errors::ConnectionError;
pub use self::events::ConnectionEvent;
pub use self::pending_calls::{CommandResponse, Responder};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use freshet_amf0::Amf0Value;

use self::backpressure::BackpressureWindow;
use self::pending_calls::PendingCalls;
use auth::{generate_client_challenge, make_auth_url};
use handshake::{Handshake, HandshakeProcessResult, PeerType};
use sessions::{
    ClientSession, ClientSessionEvent, ClientSessionResult, ClientState, PublishRequestType,
    StreamMetadata,
};
use shared_object::{SharedObjectHandle, SharedObjectMessage};
use time::RtmpTimestamp;
use transport::{RtmptTransport, TcpTransport, Transport, TransportError};
use uri::{RtmpUri, UriScheme};

const STATISTICS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(PartialEq, Debug)]
enum AuthStage {
    NotAttempted,
    CredentialsSent,
    ChallengeSent,
}

#[derive(PartialEq, Debug)]
enum RejectionDisposition {
    /// The server hinted that it wants `authmod=adobe` credentials
    CredentialRetry,

    /// The server issued a salt/challenge that needs a digest response
    ChallengeRetry,

    /// Nothing can be retried (bad credentials, unknown user, or no auth hint at all)
    Fatal,
}

/// A blocking client connection to an RTMP server
pub struct Connection {
    config: ConnectionConfig,
    uri: RtmpUri,
    transport: Box<dyn Transport>,
    session: ClientSession,
    pending_calls: PendingCalls,
    shared_objects: HashMap<String, SharedObjectHandle>,
    pending_events: Vec<ConnectionEvent>,
    connected: bool,
    closed: bool,
    auth_stage: AuthStage,
    auth_app: Option<String>,
    backpressure: BackpressureWindow,
    last_statistics_at: Instant,
    last_bytes_in: u64,
    last_bytes_out: u64,
}

impl Connection {
    /// Connects to the server named by the url, runs the handshake, and sends the
    /// connect command.  The server's answer arrives asynchronously: keep calling
    /// `service()` and wait for a `Connected` or `ConnectionRejected` event.
    pub fn connect(url: &str, config: ConnectionConfig) -> Result<Connection, ConnectionError> {
        let uri = RtmpUri::parse(url)?;
        let mut transport = open_transport(&uri, config.read_timeout)?;
        let remaining_bytes = run_handshake(transport.as_mut(), config.handshake_timeout)?;

        info!(host = %uri.host, port = uri.port, app = %uri.app, "Handshake completed");

        let mut session_config = config.session.clone();
        if session_config.tc_url.is_none() {
            session_config.tc_url = Some(uri.tc_url());
        }

        let (session, initial_results) = ClientSession::new(session_config)?;
        let app_name = uri.app.clone();

        let mut connection = Connection {
            config,
            uri,
            transport,
            session,
            pending_calls: PendingCalls::new(),
            shared_objects: HashMap::new(),
            pending_events: Vec::new(),
            connected: false,
            closed: false,
            auth_stage: AuthStage::NotAttempted,
            auth_app: None,
            backpressure: BackpressureWindow::new(),
            last_statistics_at: Instant::now(),
            last_bytes_in: 0,
            last_bytes_out: 0,
        };

        let mut events = Vec::new();
        connection.handle_session_results(initial_results, &mut events)?;

        let result = connection.session.request_connection(app_name)?;
        connection.handle_session_results(vec![result], &mut events)?;

        if !remaining_bytes.is_empty() {
            let results = connection.session.handle_input(&remaining_bytes)?;
            connection.handle_session_results(results, &mut events)?;
        }

        connection.pending_events = events;
        Ok(connection)
    }

    /// True once the server has accepted the connect request
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Total number of protocol bytes received from the server
    pub fn bytes_in(&self) -> u64 {
        self.transport.bytes_in()
    }

    /// Total number of protocol bytes handed to the network
    pub fn bytes_out(&self) -> u64 {
        self.transport.bytes_out()
    }

    /// Performs one bounded round of work: flushes queued output, reads whatever the
    /// server sent, feeds it through the session, and returns the events that resulted.
    /// Call this in a loop; the transport's read timeout paces it.
    pub fn service(&mut self) -> Result<Vec<ConnectionEvent>, ConnectionError> {
        if self.closed {
            return Err(ConnectionError::ConnectionClosed);
        }

        let mut events = std::mem::replace(&mut self.pending_events, Vec::new());

        let bytes = match self.transport.service() {
            Ok(bytes) => bytes,
            Err(TransportError::ConnectionClosed) => {
                info!("Server closed the connection");
                self.tear_down();
                events.push(ConnectionEvent::Closed);
                return Ok(events);
            }

            Err(error) => return Err(ConnectionError::TransportFailure(error)),
        };

        if !bytes.is_empty() {
            let results = self.session.handle_input(&bytes)?;
            self.handle_session_results(results, &mut events)?;
        }

        if self.last_statistics_at.elapsed() >= STATISTICS_INTERVAL {
            self.tick_statistics(&mut events);
        }

        Ok(events)
    }

    /// Sends an arbitrary command to the server.  The responder is invoked exactly once
    /// when the server's `_result` or `_error` reply arrives, and is dropped without
    /// being invoked if the connection closes first.
    pub fn call(
        &mut self,
        command_name: String,
        command_object: Amf0Value,
        arguments: Vec<Amf0Value>,
        responder: Responder,
    ) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::ConnectionClosed);
        }

        let (transaction_id, result) =
            self.session
                .send_command_request(command_name, command_object, arguments)?;

        self.dispatch_result(result)?;
        self.pending_calls.register(transaction_id, responder);
        Ok(())
    }

    /// Requests publishing on the specified stream key.  Completion is signalled by a
    /// `PublishStarted` event.
    pub fn request_publishing(
        &mut self,
        stream_key: String,
        request_type: PublishRequestType,
    ) -> Result<(), ConnectionError> {
        let result = self.session.request_publishing(stream_key, request_type)?;
        self.dispatch_result(result)
    }

    /// Requests playback of the specified stream key.  Completion is signalled by a
    /// `PlaybackStarted` event.
    pub fn request_playback(&mut self, stream_key: String) -> Result<(), ConnectionError> {
        let result = self.session.request_playback(stream_key)?;
        self.dispatch_result(result)
    }

    /// Stops an active or requested publishing session
    pub fn stop_publishing(&mut self) -> Result<(), ConnectionError> {
        let result = self.session.stop_publishing()?;
        self.dispatch_result(result)
    }

    /// Stops an active or requested playback session
    pub fn stop_playback(&mut self) -> Result<(), ConnectionError> {
        let result = self.session.stop_playback()?;
        self.dispatch_result(result)
    }

    /// Announces the metadata of the stream being published
    pub fn publish_metadata(&mut self, metadata: &StreamMetadata) -> Result<(), ConnectionError> {
        let result = self.session.publish_metadata(metadata)?;
        self.dispatch_result(result)
    }

    /// Sends video data for the stream being published
    pub fn publish_video_data(
        &mut self,
        data: Bytes,
        timestamp: RtmpTimestamp,
        can_be_dropped: bool,
    ) -> Result<(), ConnectionError> {
        let result = self
            .session
            .publish_video_data(data, timestamp, can_be_dropped)?;

        self.dispatch_result(result)
    }

    /// Sends audio data for the stream being published
    pub fn publish_audio_data(
        &mut self,
        data: Bytes,
        timestamp: RtmpTimestamp,
        can_be_dropped: bool,
    ) -> Result<(), ConnectionError> {
        let result = self
            .session
            .publish_audio_data(data, timestamp, can_be_dropped)?;

        self.dispatch_result(result)
    }

    /// Sends a ping request to the server.  Returns the timestamp the request carried
    /// so it can be matched against the eventual `PingResponseReceived` event.
    pub fn send_ping_request(&mut self) -> Result<RtmpTimestamp, ConnectionError> {
        let (result, timestamp) = self.session.send_ping_request()?;
        self.dispatch_result(result)?;
        Ok(timestamp)
    }

    /// Attaches a shared object to the connection.  If the connection is already
    /// established synchronization starts immediately, otherwise it starts once the
    /// server accepts the connect request.  Messages from the server for the object
    /// are applied to it and surfaced as `SharedObjectSynchronized` events.
    pub fn attach_shared_object(
        &mut self,
        handle: SharedObjectHandle,
    ) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::ConnectionClosed);
        }

        let (name, message) = {
            let mut shared_object = handle.lock();
            let message = if self.connected {
                Some(shared_object.start_synchronization())
            } else {
                None
            };

            (shared_object.get_name().to_string(), message)
        };

        self.shared_objects.insert(name, handle);
        if let Some(message) = message {
            self.send_shared_object_update(message)?;
        }

        Ok(())
    }

    /// Sends an outbound shared object message produced by one of the instance methods
    /// (`set_property()`, `clear()`, `close()`) to the server
    pub fn send_shared_object_update(
        &mut self,
        message: SharedObjectMessage,
    ) -> Result<(), ConnectionError> {
        let result = self.session.send_shared_object_message(
            message.name,
            message.version,
            message.persistent,
            message.events,
        )?;

        self.dispatch_result(result)
    }

    /// Closes the connection.  Any active publish or playback session is stopped on a
    /// best effort basis, pending responders are dropped without being invoked, and
    /// the transport is torn down.  Further calls fail with `ConnectionClosed`.
    pub fn close(&mut self) -> Result<(), ConnectionError> {
        if self.closed {
            return Ok(());
        }

        let stop_result = match self.session.get_current_state() {
            ClientState::Publishing { .. } | ClientState::PublishRequested { .. } => {
                self.session.stop_publishing().ok()
            }

            ClientState::Playing { .. } | ClientState::PlayRequested { .. } => {
                self.session.stop_playback().ok()
            }

            _ => None,
        };

        if let Some(ClientSessionResult::OutboundResponse(packet)) = stop_result {
            let _ = self.transport.write(&packet.bytes);
            let _ = self.transport.service();
        }

        self.tear_down();
        Ok(())
    }

    fn dispatch_result(&mut self, result: ClientSessionResult) -> Result<(), ConnectionError> {
        let mut events = std::mem::replace(&mut self.pending_events, Vec::new());
        let outcome = self.handle_session_results(vec![result], &mut events);
        self.pending_events = events;
        outcome
    }

    fn handle_session_results(
        &mut self,
        results: Vec<ClientSessionResult>,
        events: &mut Vec<ConnectionEvent>,
    ) -> Result<(), ConnectionError> {
        for result in results {
            match result {
                ClientSessionResult::OutboundResponse(packet) => {
                    self.transport.write(&packet.bytes)?;
                }

                ClientSessionResult::RaisedEvent(event) => {
                    self.handle_session_event(event, events)?;
                }

                ClientSessionResult::UnhandleableMessageReceived(payload) => {
                    debug!(
                        type_id = payload.type_id,
                        "Ignoring message of unknown type"
                    );
                }
            }
        }

        Ok(())
    }

    fn handle_session_event(
        &mut self,
        event: ClientSessionEvent,
        events: &mut Vec<ConnectionEvent>,
    ) -> Result<(), ConnectionError> {
        match event {
            ClientSessionEvent::ConnectionRequestAccepted => {
                info!("Connection request accepted by the server");
                self.connected = true;

                let sync_messages: Vec<SharedObjectMessage> = self
                    .shared_objects
                    .values()
                    .map(|handle| handle.lock().start_synchronization())
                    .collect();

                for message in sync_messages {
                    let result = self.session.send_shared_object_message(
                        message.name,
                        message.version,
                        message.persistent,
                        message.events,
                    )?;

                    self.handle_session_results(vec![result], events)?;
                }

                events.push(ConnectionEvent::Connected);
            }

            ClientSessionEvent::ConnectionRequestRejected { description } => {
                self.handle_rejection(description, events)?;
            }

            ClientSessionEvent::PlaybackRequestAccepted => {
                events.push(ConnectionEvent::PlaybackStarted);
            }

            ClientSessionEvent::PublishRequestAccepted => {
                events.push(ConnectionEvent::PublishStarted);
            }

            ClientSessionEvent::StreamMetadataReceived { metadata } => {
                events.push(ConnectionEvent::MetadataReceived { metadata });
            }

            ClientSessionEvent::VideoDataReceived { data, timestamp } => {
                events.push(ConnectionEvent::VideoDataReceived { data, timestamp });
            }

            ClientSessionEvent::AudioDataReceived { data, timestamp } => {
                events.push(ConnectionEvent::AudioDataReceived { data, timestamp });
            }

            ClientSessionEvent::SharedObjectMessageReceived {
                name,
                version,
                persistent: _,
                events: object_events,
            } => {
                let outcome = match self.shared_objects.get(&name) {
                    Some(handle) => Some(handle.lock().handle_message(version, object_events)),
                    None => {
                        debug!(name = %name, "Message for an unattached shared object");
                        None
                    }
                };

                if let Some((notification, reply)) = outcome {
                    if let Some(reply) = reply {
                        let result = self.session.send_shared_object_message(
                            reply.name,
                            reply.version,
                            reply.persistent,
                            reply.events,
                        )?;

                        self.handle_session_results(vec![result], events)?;
                    }

                    events.push(ConnectionEvent::SharedObjectSynchronized(notification));
                }
            }

            ClientSessionEvent::PingResponseReceived { timestamp } => {
                events.push(ConnectionEvent::PingResponseReceived { timestamp });
            }

            ClientSessionEvent::AcknowledgementReceived { sequence_number } => {
                events.push(ConnectionEvent::AcknowledgementReceived { sequence_number });
            }

            ClientSessionEvent::CommandResponseReceived {
                transaction_id,
                success,
                command_object,
                additional_values,
            } => {
                let response = CommandResponse {
                    success,
                    command_object,
                    additional_values,
                };

                if !self.pending_calls.complete(transaction_id, response) {
                    debug!(transaction_id, "Reply for a transaction with no responder");
                }
            }

            ClientSessionEvent::UnhandleableAmf0Command { command_name, .. } => {
                debug!(command_name = %command_name, "Ignoring unhandleable command");
            }

            ClientSessionEvent::StatusReceived { code, description } => {
                if code == "NetConnection.Connect.Closed" {
                    info!("Server is closing the connection");
                    self.tear_down();
                    events.push(ConnectionEvent::Closed);
                } else {
                    events.push(ConnectionEvent::StatusReceived { code, description });
                }
            }
        }

        Ok(())
    }

    fn handle_rejection(
        &mut self,
        description: String,
        events: &mut Vec<ConnectionEvent>,
    ) -> Result<(), ConnectionError> {
        let credentials = match (self.uri.username.clone(), self.uri.password.clone()) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        };

        match classify_rejection(&description) {
            RejectionDisposition::CredentialRetry => {
                if let Some((username, _)) = credentials {
                    if self.auth_stage == AuthStage::NotAttempted {
                        info!("Server requires authentication, retrying with credentials");
                        self.auth_stage = AuthStage::CredentialsSent;
                        let app = app_with_credentials(&self.uri.app, &username);
                        return self.reconnect(app, events);
                    }
                }
            }

            RejectionDisposition::ChallengeRetry => {
                if let Some((username, password)) = credentials {
                    if self.auth_stage != AuthStage::ChallengeSent {
                        info!("Server issued an authentication challenge, retrying");
                        self.auth_stage = AuthStage::ChallengeSent;

                        let base = match self.auth_app.take() {
                            Some(app) => app,
                            None => app_with_credentials(&self.uri.app, &username),
                        };

                        let challenge = generate_client_challenge();
                        let app =
                            make_auth_url(&base, &username, &password, &description, &challenge);

                        return self.reconnect(app, events);
                    }
                }
            }

            RejectionDisposition::Fatal => (),
        }

        warn!(description = %description, "Connection request rejected");
        events.push(ConnectionEvent::ConnectionRejected { description });
        Ok(())
    }

    // Authentication retries start the conversation over: new socket, new handshake,
    // new session, with the auth parameters folded into the app and tcUrl
    fn reconnect(
        &mut self,
        app: String,
        events: &mut Vec<ConnectionEvent>,
    ) -> Result<(), ConnectionError> {
        let _ = self.transport.close();
        self.transport = open_transport(&self.uri, self.config.read_timeout)?;
        let remaining_bytes =
            run_handshake(self.transport.as_mut(), self.config.handshake_timeout)?;

        let mut session_config = self.config.session.clone();
        session_config.tc_url = Some(format!(
            "{}://{}:{}/{}",
            self.uri.scheme, self.uri.host, self.uri.port, app
        ));

        let (session, initial_results) = ClientSession::new(session_config)?;
        self.session = session;
        self.pending_calls.clear();
        self.connected = false;
        self.auth_app = Some(app.clone());

        // The new transport starts its byte counters over
        self.last_bytes_in = 0;
        self.last_bytes_out = 0;
        self.backpressure.reset();

        self.handle_session_results(initial_results, events)?;

        let result = self.session.request_connection(app)?;
        self.handle_session_results(vec![result], events)?;

        if !remaining_bytes.is_empty() {
            let results = self.session.handle_input(&remaining_bytes)?;
            self.handle_session_results(results, events)?;
        }

        Ok(())
    }

    fn tick_statistics(&mut self, events: &mut Vec<ConnectionEvent>) {
        let elapsed = self.last_statistics_at.elapsed();
        self.last_statistics_at = Instant::now();

        let bytes_in = self.transport.bytes_in();
        let bytes_out = self.transport.bytes_out();
        let seconds = elapsed.as_secs_f64();
        let bytes_in_per_second =
            (bytes_in.saturating_sub(self.last_bytes_in) as f64 / seconds) as u64;
        let bytes_out_per_second =
            (bytes_out.saturating_sub(self.last_bytes_out) as f64 / seconds) as u64;
        self.last_bytes_in = bytes_in;
        self.last_bytes_out = bytes_out;

        let queued_byte_count = self.transport.pending_out();
        events.push(ConnectionEvent::Statistics {
            bytes_in_per_second,
            bytes_out_per_second,
            queued_byte_count,
        });

        if self.backpressure.push(queued_byte_count) {
            warn!(queued_byte_count, "Outgoing queue depth keeps rising");
            events.push(ConnectionEvent::BandwidthDegraded { queued_byte_count });
        }
    }

    fn tear_down(&mut self) {
        self.connected = false;
        self.closed = true;
        self.pending_calls.clear();
        self.backpressure.reset();
        let _ = self.transport.close();
    }
}

fn open_transport(
    uri: &RtmpUri,
    read_timeout: Duration,
) -> Result<Box<dyn Transport>, TransportError> {
    let transport: Box<dyn Transport> = match uri.scheme {
        UriScheme::Rtmp => Box::new(TcpTransport::connect(
            &uri.host,
            uri.port,
            false,
            read_timeout,
        )?),

        UriScheme::Rtmps => Box::new(TcpTransport::connect(
            &uri.host,
            uri.port,
            true,
            read_timeout,
        )?),

        UriScheme::Rtmpt => Box::new(RtmptTransport::connect(&uri.host, uri.port, read_timeout)?),
    };

    Ok(transport)
}

fn run_handshake(
    transport: &mut dyn Transport,
    timeout: Duration,
) -> Result<Vec<u8>, ConnectionError> {
    let mut handshake = Handshake::new(PeerType::Client);
    let p0_and_p1 = handshake.generate_outbound_p0_and_p1()?;
    transport.write(&p0_and_p1)?;

    let deadline = Instant::now() + timeout;
    loop {
        let bytes = transport.service()?;
        if bytes.is_empty() {
            if Instant::now() >= deadline {
                return Err(ConnectionError::HandshakeTimedOut);
            }

            continue;
        }

        match handshake.process_bytes(&bytes)? {
            HandshakeProcessResult::InProgress { response_bytes } => {
                if !response_bytes.is_empty() {
                    transport.write(&response_bytes)?;
                }
            }

            HandshakeProcessResult::Completed {
                response_bytes,
                remaining_bytes,
            } => {
                if !response_bytes.is_empty() {
                    transport.write(&response_bytes)?;
                }

                return Ok(remaining_bytes);
            }
        }
    }
}

fn app_with_credentials(app: &str, username: &str) -> String {
    let separator = if app.contains('?') { '&' } else { '?' };
    format!("{}{}authmod=adobe&user={}", app, separator, username)
}

fn classify_rejection(description: &str) -> RejectionDisposition {
    if description.contains("reason=authfailed") || description.contains("reason=nosuchuser") {
        return RejectionDisposition::Fatal;
    }

    if description.contains("reason=needauth") {
        return RejectionDisposition::ChallengeRetry;
    }

    if description.contains("authmod=adobe") {
        return RejectionDisposition::CredentialRetry;
    }

    RejectionDisposition::Fatal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_authmod_hint_asks_for_credential_retry() {
        let description = "[ AccessManager.Reject ] : [ code=403 need auth; authmod=adobe ] : ";
        assert_eq!(
            classify_rejection(description),
            RejectionDisposition::CredentialRetry
        );
    }

    #[test]
    fn needauth_rejection_asks_for_challenge_retry() {
        let description = "[ AccessManager.Reject ] : [ authmod=adobe ] : \
                           ?reason=needauth&user=tester&salt=salty&challenge=abcd1234&opaque=";
        assert_eq!(
            classify_rejection(description),
            RejectionDisposition::ChallengeRetry
        );
    }

    #[test]
    fn failed_authentication_is_fatal() {
        let description =
            "[ AccessManager.Reject ] : [ authmod=adobe ] : ?reason=authfailed&opaque=";
        assert_eq!(classify_rejection(description), RejectionDisposition::Fatal);
    }

    #[test]
    fn unknown_user_is_fatal() {
        let description =
            "[ AccessManager.Reject ] : [ authmod=adobe ] : ?reason=nosuchuser&opaque=";
        assert_eq!(classify_rejection(description), RejectionDisposition::Fatal);
    }

    #[test]
    fn rejection_without_auth_hint_is_fatal() {
        assert_eq!(
            classify_rejection("No application named live"),
            RejectionDisposition::Fatal
        );
    }

    #[test]
    fn credentials_are_appended_to_the_app() {
        assert_eq!(
            app_with_credentials("live", "tester"),
            "live?authmod=adobe&user=tester"
        );
    }

    #[test]
    fn credentials_join_an_existing_app_query() {
        assert_eq!(
            app_with_credentials("live?instance=1", "tester"),
            "live?instance=1&authmod=adobe&user=tester"
        );
    }
}
