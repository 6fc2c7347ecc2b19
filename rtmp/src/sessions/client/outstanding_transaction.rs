use super::PublishRequestType;

/// The reason a `createStream` request was issued, so that the right follow up command
/// can be sent once the server hands us a stream id.
pub enum TransactionPurpose {
    PlayRequest {
        stream_key: String,
    },

    PublishRequest {
        stream_key: String,
        request_type: PublishRequestType,
    },
}

/// A request we have sent to the server that we are still waiting on a response for
pub enum OutstandingTransaction {
    ConnectionRequested {
        app_name: String,
    },

    CreateStream {
        purpose: TransactionPurpose,
    },
}
