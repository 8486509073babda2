//! crates/learner_core/src/quiz.rs
//!
//! Drives quiz generation and the take/grade state machine.
//!
//! Generation is a two-stage remote call: first free-form study material is
//! requested with enhancement disabled (grading compares literal option
//! text, so the source material must stay raw), then that material is fed
//! into the quiz-structuring endpoint. The returned payload is normalized
//! once, resolving every answer key into a canonical answer string.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::{AnswerKey, Quiz, QuizAttempt, QuizQuestion, ScoreSummary};
use crate::ports::{ContentService, PortError, PortResult, QuizPayload};

const STUDY_GUIDE_PROMPT: &str = "Create 10 detailed quiz questions about \"{topic}\". \
Include comprehensive content that covers key concepts, definitions, and practical \
applications. Format as a study guide with detailed explanations.";

/// Where the engine currently is in the quiz lifecycle.
///
/// `Completed` is re-entrant: a retake goes back through `Generating`.
/// Any generation failure returns the engine to `Setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Setup,
    Generating,
    Ready,
    Taking,
    Completed,
}

pub struct QuizEngine {
    content: Arc<dyn ContentService>,
    notebook_id: String,
    phase: QuizPhase,
    quiz: Option<Quiz>,
    attempt: Option<QuizAttempt>,
}

impl QuizEngine {
    pub fn new(content: Arc<dyn ContentService>, notebook_id: impl Into<String>) -> Self {
        Self {
            content,
            notebook_id: notebook_id.into(),
            phase: QuizPhase::Setup,
            quiz: None,
            attempt: None,
        }
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn attempt(&self) -> Option<&QuizAttempt> {
        self.attempt.as_ref()
    }

    /// Generates a fresh quiz about `topic`, replacing any previous quiz
    /// and attempt on success. On failure the engine returns to `Setup`
    /// and the error is surfaced to the caller.
    pub async fn generate(&mut self, topic: &str) -> PortResult<&Quiz> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PortError::InvalidInput(
                "topic must not be empty".to_string(),
            ));
        }

        self.phase = QuizPhase::Generating;
        match self.generate_inner(topic).await {
            Ok(quiz) => {
                info!(topic = %topic, questions = quiz.questions.len(), "quiz ready");
                self.attempt = None;
                self.phase = QuizPhase::Ready;
                Ok(self.quiz.insert(quiz))
            }
            Err(e) => {
                self.phase = QuizPhase::Setup;
                Err(e)
            }
        }
    }

    async fn generate_inner(&self, topic: &str) -> PortResult<Quiz> {
        let prompt = STUDY_GUIDE_PROMPT.replace("{topic}", topic);
        let material = self.content.chat_only(&self.notebook_id, &prompt).await?;
        let payload = self.content.generate_quiz(&material).await?;
        normalize_quiz(topic, payload)
    }

    /// Begins taking the ready quiz, with all answers unset and the cursor
    /// on the first question.
    pub fn start(&mut self) -> PortResult<()> {
        if self.phase != QuizPhase::Ready {
            return Err(not_ready());
        }
        let Some(quiz) = &self.quiz else {
            return Err(not_ready());
        };
        self.attempt = Some(QuizAttempt::new(quiz.questions.len()));
        self.phase = QuizPhase::Taking;
        Ok(())
    }

    /// Records `option_text` for the current question, overwriting any
    /// earlier answer. The text is trusted to be one of the question's own
    /// options; the UI built it from them.
    pub fn answer(&mut self, option_text: &str) -> PortResult<()> {
        if self.phase != QuizPhase::Taking {
            return Err(not_taking());
        }
        if option_text.is_empty() {
            return Err(PortError::InvalidInput(
                "an answer must not be empty".to_string(),
            ));
        }
        let attempt = self.attempt.as_mut().ok_or_else(not_taking)?;
        attempt.answers[attempt.current] = Some(option_text.to_string());
        Ok(())
    }

    /// Advances to the next question, or to `Completed` from the last one.
    pub fn next(&mut self) -> PortResult<QuizPhase> {
        if self.phase != QuizPhase::Taking {
            return Err(not_taking());
        }
        let total = self.quiz.as_ref().map_or(0, |q| q.questions.len());
        let attempt = self.attempt.as_mut().ok_or_else(not_taking)?;
        if attempt.current + 1 >= total {
            self.phase = QuizPhase::Completed;
        } else {
            attempt.current += 1;
        }
        Ok(self.phase)
    }

    /// Steps back one question. A no-op on the first question; never
    /// changes phase.
    pub fn previous(&mut self) -> PortResult<()> {
        if self.phase != QuizPhase::Taking {
            return Err(not_taking());
        }
        let attempt = self.attempt.as_mut().ok_or_else(not_taking)?;
        if attempt.current > 0 {
            attempt.current -= 1;
        }
        Ok(())
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        let quiz = self.quiz.as_ref()?;
        let attempt = self.attempt.as_ref()?;
        quiz.questions.get(attempt.current)
    }

    /// Grades the attempt. Comparison is exact string equality against each
    /// question's canonical answer: case- and whitespace-sensitive, and
    /// deliberately not "fixed"; the tests pin this behavior.
    /// Idempotent: repeated calls without new answers give equal results.
    pub fn score(&self) -> PortResult<ScoreSummary> {
        let quiz = self.quiz.as_ref().ok_or_else(not_taking)?;
        let attempt = self.attempt.as_ref().ok_or_else(not_taking)?;

        let correct = quiz
            .questions
            .iter()
            .zip(&attempt.answers)
            .filter(|(question, answer)| answer.as_deref() == Some(question.canonical_answer()))
            .count();
        let total = quiz.questions.len();
        let percentage = if total == 0 {
            0
        } else {
            (100.0 * correct as f64 / total as f64).round() as u32
        };

        Ok(ScoreSummary {
            correct,
            total,
            percentage,
        })
    }

    /// Returns unconditionally to `Setup`, discarding quiz and attempt.
    pub fn reset(&mut self) {
        self.phase = QuizPhase::Setup;
        self.quiz = None;
        self.attempt = None;
    }
}

fn not_ready() -> PortError {
    PortError::InvalidInput("no quiz is ready to take".to_string())
}

fn not_taking() -> PortError {
    PortError::InvalidInput("no quiz attempt is in progress".to_string())
}

/// Turns the service payload into an immutable `Quiz`, resolving each
/// answer key exactly once.
fn normalize_quiz(topic: &str, payload: QuizPayload) -> PortResult<Quiz> {
    if payload.questions.is_empty() {
        return Err(PortError::Service(
            "quiz payload contained no questions".to_string(),
        ));
    }

    let mut questions = Vec::with_capacity(payload.questions.len());
    for question in payload.questions {
        if question.options.is_empty() {
            return Err(PortError::Service(format!(
                "question \"{}\" has no options",
                question.question
            )));
        }
        let answer = AnswerKey::parse(&question.correct, question.options.len());
        questions.push(QuizQuestion {
            prompt: question.question,
            options: question.options,
            answer,
            explanation: question.explanation,
        });
    }

    Ok(Quiz {
        topic: topic.to_string(),
        questions,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::QuestionPayload;
    use crate::testing::ScriptedContent;

    fn payload_question(prompt: &str, options: &[&str], correct: &str) -> QuestionPayload {
        QuestionPayload {
            question: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct: correct.to_string(),
            explanation: None,
        }
    }

    fn engine_with_quiz(questions: Vec<QuestionPayload>) -> (Arc<ScriptedContent>, QuizEngine) {
        let content = Arc::new(ScriptedContent::default());
        content
            .chat_only
            .lock()
            .unwrap()
            .push_back(Ok("study material".to_string()));
        content
            .quizzes
            .lock()
            .unwrap()
            .push_back(Ok(QuizPayload { questions }));
        (content.clone(), QuizEngine::new(content, "nb-1"))
    }

    #[tokio::test]
    async fn generation_runs_both_stages_and_becomes_ready() {
        let (_, mut engine) = engine_with_quiz(vec![payload_question(
            "capital of France?",
            &["London", "Paris", "Rome", "Berlin"],
            "B",
        )]);

        let quiz = engine.generate("geography").await.unwrap();
        assert_eq!(quiz.topic, "geography");
        assert_eq!(quiz.questions[0].canonical_answer(), "Paris");
        assert_eq!(engine.phase(), QuizPhase::Ready);
    }

    #[tokio::test]
    async fn first_stage_failure_returns_to_setup() {
        let content = Arc::new(ScriptedContent::default());
        content
            .chat_only
            .lock()
            .unwrap()
            .push_back(Err(PortError::Service("overloaded".to_string())));
        let mut engine = QuizEngine::new(content, "nb-1");

        assert!(engine.generate("geography").await.is_err());
        assert_eq!(engine.phase(), QuizPhase::Setup);
        assert!(engine.quiz().is_none());
    }

    #[tokio::test]
    async fn structuring_failure_returns_to_setup() {
        let content = Arc::new(ScriptedContent::default());
        content
            .chat_only
            .lock()
            .unwrap()
            .push_back(Ok("study material".to_string()));
        content
            .quizzes
            .lock()
            .unwrap()
            .push_back(Err(PortError::Service("malformed".to_string())));
        let mut engine = QuizEngine::new(content, "nb-1");

        assert!(engine.generate("geography").await.is_err());
        assert_eq!(engine.phase(), QuizPhase::Setup);
    }

    #[tokio::test]
    async fn empty_question_set_is_rejected() {
        let (_, mut engine) = engine_with_quiz(vec![]);
        let result = engine.generate("geography").await;
        assert!(matches!(result, Err(PortError::Service(_))));
        assert_eq!(engine.phase(), QuizPhase::Setup);
    }

    #[tokio::test]
    async fn blank_topic_is_rejected_without_remote_calls() {
        let content = Arc::new(ScriptedContent::default());
        let mut engine = QuizEngine::new(content.clone(), "nb-1");

        let result = engine.generate("  ").await;
        assert!(matches!(result, Err(PortError::InvalidInput(_))));
        assert_eq!(engine.phase(), QuizPhase::Setup);
        assert!(content.chat_only.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn letter_keys_resolve_to_option_text() {
        let options = ["x", "y", "z", "w"];
        let key = AnswerKey::parse("B", options.len());
        assert_eq!(key, AnswerKey::Letter(1));

        let question = QuizQuestion {
            prompt: "pick".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: key,
            explanation: None,
        };
        assert_eq!(question.canonical_answer(), "y");
    }

    #[tokio::test]
    async fn out_of_range_key_makes_the_question_unwinnable() {
        let (_, mut engine) = engine_with_quiz(vec![payload_question(
            "pick",
            &["x", "y", "z", "w"],
            "E",
        )]);
        engine.generate("letters").await.unwrap();
        engine.start().unwrap();

        let question = engine.current_question().unwrap();
        assert_eq!(question.answer, AnswerKey::Literal("E".to_string()));
        assert_eq!(question.canonical_answer(), "E");

        // No option can ever match the canonical answer.
        for option in ["x", "y", "z", "w"] {
            engine.answer(option).unwrap();
            assert_eq!(engine.score().unwrap().correct, 0);
        }
    }

    #[tokio::test]
    async fn two_question_walkthrough_completes_and_scores() {
        let (_, mut engine) = engine_with_quiz(vec![
            payload_question("q1", &["x", "y", "z", "w"], "B"),
            payload_question("q2", &["x", "y", "z", "w"], "y"),
        ]);
        engine.generate("letters").await.unwrap();
        engine.start().unwrap();

        engine.answer("y").unwrap();
        assert_eq!(engine.next().unwrap(), QuizPhase::Taking);
        engine.answer("y").unwrap();
        assert_eq!(engine.next().unwrap(), QuizPhase::Completed);

        let score = engine.score().unwrap();
        assert_eq!(score.total, 2);
        assert_eq!(score.correct, 2);
        assert_eq!(score.percentage, 100);

        // Idempotent: grading again without new answers changes nothing.
        assert_eq!(engine.score().unwrap(), score);
    }

    #[tokio::test]
    async fn grading_is_exact_about_case_and_whitespace() {
        // Upstream leaves strictness unspecified; current behavior is exact
        // equality, and this test pins it rather than "fixing" it.
        let (_, mut engine) = engine_with_quiz(vec![payload_question(
            "capital of France?",
            &["London", "Paris", "Rome", "Berlin"],
            "Paris",
        )]);
        engine.generate("geography").await.unwrap();
        engine.start().unwrap();

        engine.answer("paris").unwrap();
        assert_eq!(engine.score().unwrap().correct, 0);
        engine.answer("Paris ").unwrap();
        assert_eq!(engine.score().unwrap().correct, 0);
        engine.answer("Paris").unwrap();
        assert_eq!(engine.score().unwrap().correct, 1);
    }

    #[tokio::test]
    async fn previous_is_a_no_op_on_the_first_question() {
        let (_, mut engine) = engine_with_quiz(vec![
            payload_question("q1", &["x", "y"], "A"),
            payload_question("q2", &["x", "y"], "A"),
        ]);
        engine.generate("letters").await.unwrap();
        engine.start().unwrap();

        engine.previous().unwrap();
        assert_eq!(engine.attempt().unwrap().current, 0);

        engine.next().unwrap();
        engine.previous().unwrap();
        assert_eq!(engine.attempt().unwrap().current, 0);
        assert_eq!(engine.phase(), QuizPhase::Taking);
    }

    #[tokio::test]
    async fn re_answering_overwrites() {
        let (_, mut engine) =
            engine_with_quiz(vec![payload_question("q1", &["x", "y"], "A")]);
        engine.generate("letters").await.unwrap();
        engine.start().unwrap();

        engine.answer("y").unwrap();
        engine.answer("x").unwrap();
        assert_eq!(
            engine.attempt().unwrap().answers[0].as_deref(),
            Some("x")
        );
        assert_eq!(engine.score().unwrap().correct, 1);
    }

    #[tokio::test]
    async fn unanswered_questions_count_as_incorrect() {
        let (_, mut engine) = engine_with_quiz(vec![
            payload_question("q1", &["x", "y"], "A"),
            payload_question("q2", &["x", "y"], "A"),
            payload_question("q3", &["x", "y"], "A"),
        ]);
        engine.generate("letters").await.unwrap();
        engine.start().unwrap();
        engine.answer("x").unwrap();

        let score = engine.score().unwrap();
        assert_eq!(score.correct, 1);
        assert_eq!(score.total, 3);
        assert_eq!(score.percentage, 33);
    }

    #[tokio::test]
    async fn reset_discards_quiz_and_attempt() {
        let (_, mut engine) =
            engine_with_quiz(vec![payload_question("q1", &["x", "y"], "A")]);
        engine.generate("letters").await.unwrap();
        engine.start().unwrap();
        engine.reset();

        assert_eq!(engine.phase(), QuizPhase::Setup);
        assert!(engine.quiz().is_none());
        assert!(engine.attempt().is_none());
    }
}
