//! Seeded, reproducible question and option shuffling.
//!
//! Generators are owned by a [`Shuffler`] value and passed explicitly; the
//! same seeds always produce the same exam models.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::SolutionError;
use crate::model::{Question, QuestionId, SolutionModel};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// Owns the question-order and option-order generators.
pub struct Shuffler {
    questions: Option<ChaCha8Rng>,
    options: ChaCha8Rng,
}

impl Shuffler {
    /// `question_seed = None` keeps the input question order.
    pub fn new(question_seed: Option<u64>, option_seed: u64) -> Self {
        Self {
            questions: question_seed.map(ChaCha8Rng::seed_from_u64),
            options: ChaCha8Rng::seed_from_u64(option_seed),
        }
    }

    /// Shuffle (if seeded) and renumber questions 1..N.
    ///
    /// The pre-shuffle id is kept in `original_id` the first time a question
    /// is renumbered.
    pub fn shuffle_questions(&mut self, questions: &mut [Question]) {
        if let Some(rng) = self.questions.as_mut() {
            questions.shuffle(rng);
        }
        for (position, question) in questions.iter_mut().enumerate() {
            if question.original_id.is_none() {
                question.original_id = Some(question.id);
            }
            question.id = position as QuestionId + 1;
        }
    }

    /// Shuffle one question's options, keeping its correct answer attached.
    pub fn shuffle_options(&mut self, question: &mut Question) {
        if question.options.len() < 2 {
            return;
        }
        let mut order: Vec<usize> = (0..question.options.len()).collect();
        order.shuffle(&mut self.options);

        let previous = std::mem::take(&mut question.options);
        question.options = order.iter().map(|&i| previous[i].clone()).collect();
        question.correct_answer_index = question
            .correct_answer_index
            .and_then(|old| order.iter().position(|&i| i == old));
    }

    /// Shuffle a full question list and return it as a validated model.
    pub fn build_model(
        &mut self,
        model_id: impl Into<String>,
        base: &[Question],
    ) -> Result<SolutionModel, SolutionError> {
        let mut questions = base.to_vec();
        self.shuffle_questions(&mut questions);
        for question in &mut questions {
            self.shuffle_options(question);
        }
        SolutionModel::new(model_id, questions)
    }
}

/// Build `count` models named "1".."count", model `k` seeded with `seed + k - 1`.
pub fn build_models(
    base: &[Question],
    count: usize,
    question_seed: Option<u64>,
    option_seed: u64,
) -> Result<Vec<SolutionModel>, SolutionError> {
    (0..count as u64)
        .map(|k| {
            let mut shuffler = Shuffler::new(
                question_seed.map(|s| s.wrapping_add(k)),
                option_seed.wrapping_add(k),
            );
            shuffler.build_model((k + 1).to_string(), base)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn base_questions() -> Vec<Question> {
        (1..=8)
            .map(|id| Question {
                id: id * 10,
                original_id: None,
                text: format!("Q{id}"),
                options: ["w", "x", "y", "z"]
                    .iter()
                    .map(|t| AnswerOption {
                        text: format!("{t}{id}"),
                    })
                    .collect(),
                correct_answer_index: Some((id % 4) as usize),
            })
            .collect()
    }

    #[test]
    fn unseeded_questions_keep_order_but_are_renumbered() {
        let mut questions = base_questions();
        Shuffler::new(None, DEFAULT_SEED).shuffle_questions(&mut questions);
        let texts: Vec<_> = questions.iter().map(|q| q.text.clone()).collect();
        assert_eq!(texts, (1..=8).map(|i| format!("Q{i}")).collect::<Vec<_>>());
        assert_eq!(questions[0].id, 1);
        assert_eq!(questions[0].original_id, Some(10));
        assert_eq!(questions[7].id, 8);
    }

    #[test]
    fn original_id_is_only_recorded_once() {
        let mut questions = base_questions();
        let mut shuffler = Shuffler::new(Some(7), DEFAULT_SEED);
        shuffler.shuffle_questions(&mut questions);
        let mut before: Vec<_> = questions.iter().map(|q| q.original_id).collect();
        shuffler.shuffle_questions(&mut questions);
        let mut after: Vec<_> = questions.iter().map(|q| q.original_id).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn option_shuffle_keeps_correct_answer() {
        let mut shuffler = Shuffler::new(None, 3);
        for original in base_questions() {
            let mut q = original.clone();
            shuffler.shuffle_options(&mut q);
            let before = &original.options[original.correct_answer_index.unwrap()];
            let after = &q.options[q.correct_answer_index.unwrap()];
            assert_eq!(before, after);
        }
    }

    #[test]
    fn same_seeds_same_models() {
        let a = build_models(&base_questions(), 3, Some(1), 2).unwrap();
        let b = build_models(&base_questions(), 3, Some(1), 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(a[2].id(), "3");
        assert!(a.iter().all(|m| m.gradable_count() == 8));
    }
}
