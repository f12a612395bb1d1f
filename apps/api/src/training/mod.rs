// Training Progression: per-user phase/day state machine driven by
// oracle-graded daily tasks.
// All model calls go through the ContentOracle seam; nothing here talks to
// the LLM client directly except LlmOracle.

pub mod handlers;
pub mod oracle;
pub mod phase;
pub mod progression;
pub mod prompts;
pub mod store;
