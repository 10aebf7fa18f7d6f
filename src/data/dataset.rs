use burn::data::dataset::Dataset;

use crate::domain::{error::LinkError, message::Message, traits::MessageSource};

/// A fixed-size set of independently drawn messages.
pub struct MessageDataset {
    messages:     Vec<Message>,
    num_messages: usize,
}

impl MessageDataset {
    pub fn new(messages: Vec<Message>, num_messages: usize) -> Result<Self, LinkError> {
        if let Some(bad) = messages.iter().find(|m| m.index() >= num_messages) {
            return Err(LinkError::shape_mismatch(
                "message dataset",
                &[num_messages],
                &[bad.index() + 1],
            ));
        }
        Ok(Self { messages, num_messages })
    }

    /// Draw `count` fresh messages from `source`
    pub fn generate(
        source:       &mut impl MessageSource,
        count:        usize,
        num_messages: usize,
    ) -> Result<Self, LinkError> {
        Self::new(source.generate(count)?, num_messages)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn num_messages(&self) -> usize {
        self.num_messages
    }

    /// Row-major [len, M] one-hot labels
    pub fn one_hot_labels(&self) -> Vec<f32> {
        crate::domain::message::one_hot_matrix(&self.messages, self.num_messages)
    }
}

impl Dataset<Message> for MessageDataset {
    fn get(&self, index: usize) -> Option<Message> {
        self.messages.get(index).copied()
    }

    fn len(&self) -> usize {
        self.messages.len()
    }
}
