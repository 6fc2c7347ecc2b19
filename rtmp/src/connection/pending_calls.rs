use std::collections::HashMap;

use freshet_amf0::Amf0Value;

/// The server's answer to a command sent via `Connection::call()`
#[derive(PartialEq, Debug)]
pub struct CommandResponse {
    /// True when the server replied with `_result`, false for `_error`
    pub success: bool,
    pub command_object: Amf0Value,
    pub additional_values: Vec<Amf0Value>,
}

pub type Responder = Box<dyn FnOnce(CommandResponse)>;

/// Tracks responders for commands whose replies have not arrived yet.
///
/// A responder is invoked at most once: completing a transaction removes it before the
/// callback runs, and clearing the table drops all parked responders without invoking
/// them.
pub struct PendingCalls {
    responders: HashMap<u64, Responder>,
}

impl PendingCalls {
    pub fn new() -> PendingCalls {
        PendingCalls {
            responders: HashMap::new(),
        }
    }

    /// Parks a responder to be invoked when the reply for the transaction arrives
    pub fn register(&mut self, transaction_id: f64, responder: Responder) {
        self.responders.insert(transaction_id as u64, responder);
    }

    /// Delivers a reply to the responder parked for the transaction, if any.  Returns
    /// false when no responder was waiting on the transaction.
    pub fn complete(&mut self, transaction_id: f64, response: CommandResponse) -> bool {
        match self.responders.remove(&(transaction_id as u64)) {
            Some(responder) => {
                responder(response);
                true
            }

            None => false,
        }
    }

    /// Drops all parked responders without invoking them
    pub fn clear(&mut self) {
        self.responders.clear();
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }
}
