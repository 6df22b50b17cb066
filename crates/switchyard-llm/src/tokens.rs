use tiktoken_rs::{CoreBPE, o200k_base};

/// Token estimate used for history budgeting
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// `o200k_base` tokenizer, falling back to a bytes/4 estimate when the
/// encoding cannot be loaded
pub struct TiktokenCounter {
    bpe: Option<CoreBPE>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        let bpe = match o200k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load o200k_base, estimating tokens from length");
                None
            }
        };
        Self { bpe }
    }
}

impl Default for TiktokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe
            .as_ref()
            .map_or_else(|| text.len() / 4, |bpe| bpe.encode_with_special_tokens(text).len())
    }
}

/// Length-based estimate, one token per four bytes
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthEstimate;

impl TokenCounter for LengthEstimate {
    fn count(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }
}
