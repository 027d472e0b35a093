//! Retrieval-augmented answer composition.
//!
//! [`answer_question`] retrieves the best passages, concatenates them into a
//! bounded context, and asks the extractive-QA collaborator for a span.
//! It always produces a [`RetrievalResult`]: when no answer can be found,
//! for whatever reason, the answer is [`NO_ANSWER`].

use crate::index::CorpusIndex;
use crate::models::{Passage, RetrievalResult};
use crate::normalize::truncate_chars;
use crate::provider::ModelSet;
use crate::search::retrieve;

/// Returned instead of an empty answer.
pub const NO_ANSWER: &str = "(no exact answer found; try rephrasing)";

/// Separator placed between passages in the QA context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Answer composition parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerParams {
    /// Passages retrieved as context.
    pub top_k: usize,
    /// Hard character cap on the context passed to the QA collaborator.
    pub context_char_budget: usize,
}

impl Default for AnswerParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            context_char_budget: 4500,
        }
    }
}

/// Join passage texts with a blank line, in order, and cut the result to
/// `budget` characters.
pub fn build_context<'a, I>(passages: I, budget: usize) -> String
where
    I: IntoIterator<Item = &'a Passage>,
{
    let joined = passages
        .into_iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);
    truncate_chars(&joined, budget).to_string()
}

fn no_answer(supporting_passages: Vec<Passage>, similarities: Vec<f32>) -> RetrievalResult {
    RetrievalResult {
        answer: NO_ANSWER.to_string(),
        supporting_passages,
        similarities,
        confidence: None,
        answered: false,
    }
}

/// Answer `question` from the passages of `index`.
///
/// Never fails: a blank question, an empty index, an embedding failure, a
/// QA failure, and a blank QA answer all yield [`NO_ANSWER`]. Failures are
/// logged. When retrieval succeeded, the supporting passages are returned
/// even if no answer was extracted.
pub async fn answer_question(
    models: &ModelSet,
    index: &CorpusIndex,
    question: &str,
    params: &AnswerParams,
) -> RetrievalResult {
    let question = question.trim();
    if question.is_empty() {
        return no_answer(Vec::new(), Vec::new());
    }

    let hits = match retrieve(models.embedder.as_ref(), index, question, params.top_k).await {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!("retrieval failed: {:#}", e);
            return no_answer(Vec::new(), Vec::new());
        }
    };

    if hits.is_empty() {
        return no_answer(Vec::new(), Vec::new());
    }

    let context = build_context(hits.iter().map(|h| h.passage), params.context_char_budget);
    let supporting: Vec<Passage> = hits.iter().map(|h| h.passage.clone()).collect();
    let similarities: Vec<f32> = hits.iter().map(|h| h.score).collect();

    match models.qa.answer(question, &context).await {
        Ok(qa) => {
            let answer = qa.answer.trim();
            if answer.is_empty() {
                tracing::debug!("QA returned no span");
                no_answer(supporting, similarities)
            } else {
                RetrievalResult {
                    answer: answer.to_string(),
                    supporting_passages: supporting,
                    similarities,
                    confidence: qa.score,
                    answered: true,
                }
            }
        }
        Err(e) => {
            tracing::warn!("question answering failed: {:#}", e);
            no_answer(supporting, similarities)
        }
    }
}
