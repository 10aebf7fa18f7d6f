// ============================================================
// Layer 3 — Message Domain Type
// ============================================================
// A message is one of M symbols. The transmitter sees it as
// an index (fed to an embedding lookup); the receiver and the
// BER sweep compare against its one-hot form.

use serde::{Deserialize, Serialize};

use crate::domain::error::LinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    index: usize,
}

impl Message {
    /// Create a message, checking the index against M
    pub fn new(index: usize, num_messages: usize) -> Result<Self, LinkError> {
        if index >= num_messages {
            return Err(LinkError::InvalidArgument(format!(
                "message index {index} out of range for M = {num_messages}"
            )));
        }
        Ok(Self { index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// One-hot vector of length M with a single 1.0 at `index`
    pub fn one_hot(&self, num_messages: usize) -> Vec<f32> {
        let mut row = vec![0.0f32; num_messages];
        row[self.index] = 1.0;
        row
    }
}

/// Flatten a slice of messages into a row-major [len, M] one-hot matrix
pub fn one_hot_matrix(messages: &[Message], num_messages: usize) -> Vec<f32> {
    messages
        .iter()
        .flat_map(|msg| msg.one_hot(num_messages))
        .collect()
}
