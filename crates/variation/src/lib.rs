//! Anti-repetition selection — per-user template pools built from message
//! history, and a rule-driven selector with four variation strategies.

pub mod phrases;
pub mod pool;
pub mod selector;

pub use phrases::{apply_random_phrases, phrase_bank, PhraseBank};
pub use pool::PoolBuilder;
pub use selector::{filter_candidates, hybrid_score, least_recent, SelectionOutcome, VariationSelector};
