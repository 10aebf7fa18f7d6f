// ============================================================
// Layer 4 — Message Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<Message> into
// the tensors the autoencoder consumes.
//
//   Input:  N messages
//   Output: MessageBatch with
//             indices [N, 1]  Int    — embedding lookup input
//             targets [N]     Int    — class labels for the loss
//             one_hot [N, M]  Float  — labels in one-hot form
//
// The batcher knows M so every batch it builds is checked
// against the message dimensionality before it leaves here.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::message::{one_hot_matrix, Message};

// ─── MessageBatch ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct MessageBatch<B: Backend> {
    /// Message indices — shape: [batch_size, 1]
    pub indices: Tensor<B, 2, Int>,

    /// Same indices flattened — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,

    /// One-hot labels — shape: [batch_size, M]
    pub one_hot: Tensor<B, 2>,
}

// ─── MessageBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct MessageBatcher<B: Backend> {
    pub device:       B::Device,
    pub num_messages: usize,
}

impl<B: Backend> MessageBatcher<B> {
    pub fn new(device: B::Device, num_messages: usize) -> Self {
        Self { device, num_messages }
    }
}

impl<B: Backend> Batcher<Message, MessageBatch<B>> for MessageBatcher<B> {
    fn batch(&self, items: Vec<Message>) -> MessageBatch<B> {
        let batch_size = items.len();

        let ids: Vec<i32> = items
            .iter()
            .map(|m| m.index() as i32)
            .collect();

        let indices = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let targets = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device);

        let one_hot = Tensor::<B, 2>::from_data(
            TensorData::new(one_hot_matrix(&items, self.num_messages), [batch_size, self.num_messages]),
            &self.device,
        );

        MessageBatch { indices, targets, one_hot }
    }
}
