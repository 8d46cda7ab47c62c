//! Token budget gate applied before the extraction call.

use crate::error::ExtractionError;
use tiktoken_rs::CoreBPE;

/// Outcome of checking a document against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCheck {
    /// The document fits; carries its token count.
    Within(usize),
    /// The document is too long; carries its token count.
    Exceeded(usize),
}

impl BudgetCheck {
    pub fn tokens(&self) -> usize {
        match self {
            BudgetCheck::Within(n) | BudgetCheck::Exceeded(n) => *n,
        }
    }

    pub fn is_within(&self) -> bool {
        matches!(self, BudgetCheck::Within(_))
    }
}

/// Counts tokens with the `o200k_base` encoding used by GPT-4o models.
pub struct TokenBudget {
    encoder: CoreBPE,
    limit: usize,
}

impl TokenBudget {
    pub fn new(limit: usize) -> Result<Self, ExtractionError> {
        let encoder =
            tiktoken_rs::o200k_base().map_err(|e| ExtractionError::Tokenizer(e.to_string()))?;
        Ok(Self { encoder, limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn count(&self, text: &str) -> usize {
        self.encoder.encode_with_special_tokens(text).len()
    }

    /// A document whose count equals the limit still passes.
    pub fn check(&self, text: &str) -> BudgetCheck {
        let tokens = self.count(text);
        if tokens > self.limit {
            BudgetCheck::Exceeded(tokens)
        } else {
            BudgetCheck::Within(tokens)
        }
    }
}

impl std::fmt::Debug for TokenBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBudget")
            .field("encoding", &"o200k_base")
            .field("limit", &self.limit)
            .finish()
    }
}
