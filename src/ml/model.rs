// ============================================================
// Layer 5 — Autoencoder Model
// ============================================================
// Transmitter and receiver of the link as one Burn module.
//
//   Encoder:  index ─► Embedding(M, M)
//                    ─► Linear(M, M) ► ReLU ► BatchNorm
//                    ─► Linear(M, M) ► ReLU ► BatchNorm
//                    ─► Linear(M, n)        ► BatchNorm      = channel symbols
//
//   Decoder:  symbols ─► Linear(n, M) ► ReLU ► BatchNorm
//                     ─► Linear(M, M) ► ReLU ► BatchNorm
//                     ─► Linear(M, M) ► softmax            = message distribution
//
// The final BatchNorm keeps the symbols zero-mean / unit-variance
// per batch instead of a hard power constraint.
//
// The channel is not part of the module. forward_through() places
// a ChannelModel between encode() and decode(): the full channel
// while training, its fading stage alone for validation and for
// the predictions of the BER sweep.
//
// BatchNorm uses batch statistics on an autodiff backend and its
// running statistics after model.valid().

use burn::{
    nn::{
        BatchNorm, BatchNormConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        loss::CrossEntropyLossConfig,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};
use rand::Rng;

use crate::domain::error::LinkError;
use crate::ml::channel::ChannelModel;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
#[derive(Config, Debug)]
pub struct AutoencoderConfig {
    pub num_messages: usize,
    pub num_channels: usize,
}

impl AutoencoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Autoencoder<B> {
        let m = self.num_messages;
        let n = self.num_channels;

        let encoder = Encoder {
            embedding: EmbeddingConfig::new(m, m).init(device),
            hidden1:   LinearConfig::new(m, m).init(device),
            norm1:     BatchNormConfig::new(m).init(device),
            hidden2:   LinearConfig::new(m, m).init(device),
            norm2:     BatchNormConfig::new(m).init(device),
            project:   LinearConfig::new(m, n).init(device),
            norm_out:  BatchNormConfig::new(n).init(device),
        };

        let decoder = Decoder {
            hidden1: LinearConfig::new(n, m).init(device),
            norm1:   BatchNormConfig::new(m).init(device),
            hidden2: LinearConfig::new(m, m).init(device),
            norm2:   BatchNormConfig::new(m).init(device),
            output:  LinearConfig::new(m, m).init(device),
        };

        Autoencoder { encoder, decoder, num_messages: m, num_channels: n }
    }
}

// ─── Encoder (transmitter) ────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding: Embedding<B>,
    pub hidden1:   Linear<B>,
    pub norm1:     BatchNorm<B, 0>,
    pub hidden2:   Linear<B>,
    pub norm2:     BatchNorm<B, 0>,
    pub project:   Linear<B>,
    pub norm_out:  BatchNorm<B, 0>,
}

impl<B: Backend> Encoder<B> {
    /// indices: [batch, 1] → symbols: [batch, num_channels]
    pub fn forward(&self, indices: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let x = self.embedding.forward(indices);       // [batch, 1, M]
        let [batch_size, seq_len, d_embed] = x.dims();
        let x = x.reshape([batch_size, seq_len * d_embed]);
        let x = self.norm1.forward(relu(self.hidden1.forward(x)));
        let x = self.norm2.forward(relu(self.hidden2.forward(x)));
        self.norm_out.forward(self.project.forward(x))
    }
}

// ─── Decoder (receiver) ───────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub hidden1: Linear<B>,
    pub norm1:   BatchNorm<B, 0>,
    pub hidden2: Linear<B>,
    pub norm2:   BatchNorm<B, 0>,
    pub output:  Linear<B>,
}

impl<B: Backend> Decoder<B> {
    /// symbols: [batch, num_channels] → logits: [batch, M]
    pub fn forward(&self, symbols: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.norm1.forward(relu(self.hidden1.forward(symbols)));
        let x = self.norm2.forward(relu(self.hidden2.forward(x)));
        self.output.forward(x)
    }
}

// ─── Autoencoder ──────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Autoencoder<B: Backend> {
    pub encoder:      Encoder<B>,
    pub decoder:      Decoder<B>,
    pub num_messages: usize,
    pub num_channels: usize,
}

pub struct AutoencoderOutput<B: Backend> {
    /// Pre-softmax scores — shape: [batch, M]
    pub logits: Tensor<B, 2>,
}

impl<B: Backend> AutoencoderOutput<B> {
    /// Message distribution, rows sum to 1
    pub fn probabilities(&self) -> Tensor<B, 2> {
        softmax(self.logits.clone(), 1)
    }

    /// Most likely message per row — shape: [batch]
    pub fn predicted(&self) -> Tensor<B, 1, Int> {
        self.logits.clone().argmax(1).flatten::<1>(0, 1)
    }
}

impl<B: Backend> Autoencoder<B> {
    pub fn encode(&self, indices: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        self.encoder.forward(indices)
    }

    pub fn decode(&self, symbols: Tensor<B, 2>) -> AutoencoderOutput<B> {
        AutoencoderOutput { logits: self.decoder.forward(symbols) }
    }

    /// Encoder straight into decoder, no channel
    #[cfg(test)]
    pub fn forward(&self, indices: Tensor<B, 2, Int>) -> AutoencoderOutput<B> {
        self.decode(self.encode(indices))
    }

    /// Encoder → channel → decoder
    pub fn forward_through<R: Rng + ?Sized>(
        &self,
        indices: Tensor<B, 2, Int>,
        channel: &ChannelModel,
        rng:     &mut R,
    ) -> Result<AutoencoderOutput<B>, LinkError> {
        let symbols = self.encode(indices);
        let [_, width] = symbols.dims();
        if width != self.num_channels {
            return Err(LinkError::shape_mismatch(
                "encoder output",
                &[self.num_channels],
                &[width],
            ));
        }
        let received = channel.apply_tensor(symbols, rng)?;
        Ok(self.decode(received))
    }

    /// Categorical cross-entropy of the decoder output against the sent messages
    pub fn loss(&self, output: &AutoencoderOutput<B>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        let ce = CrossEntropyLossConfig::new().init(&output.logits.device());
        ce.forward(output.logits.clone(), targets)
    }
}
