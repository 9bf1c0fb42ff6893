// Candidate screening interview.
// Implements: field collection, question selection, answer scoring, screening decision.
// All reasoning calls go through the `ReasoningService` seam; llm_client is one binding of it.

pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod question_bank;
pub mod reasoning;
pub mod registry;
pub mod session;
pub mod validators;

#[cfg(test)]
pub mod testing;
