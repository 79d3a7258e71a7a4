//! Ambiguity resolution: clarification questions, the serializable
//! continuation a suspended run is carried in, and merging answers back
//! into the signal set.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::Classification;
use crate::domain::{Capability, Domain, ForgeError, Request, Result, SignalSet};
use crate::lexicon::TECH_STACK_OPTIONS;

/// Last option of the tech-stack question; picking it adds no framework.
pub const NONE_OF_THESE: &str = "none of these";

/// Ambiguities needed before the tech-stack question is asked.
pub const TECH_STACK_AMBIGUITY_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Domain,
    Capability,
    TechStack,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Domain => "domain",
            QuestionKind::Capability => "capability",
            QuestionKind::TechStack => "tech_stack",
        }
    }
}

/// A single-choice question put to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationQuestion {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
}

impl ClarificationQuestion {
    fn new(kind: QuestionKind, prompt: &str, options: Vec<String>) -> Self {
        Self {
            id: kind.as_str().to_string(),
            kind,
            prompt: prompt.to_string(),
            options,
        }
    }

    fn domain() -> Self {
        Self::new(
            QuestionKind::Domain,
            "Which area should the agent focus on?",
            Domain::CLARIFIABLE
                .iter()
                .map(|d| d.label().to_string())
                .collect(),
        )
    }

    fn capability() -> Self {
        Self::new(
            QuestionKind::Capability,
            "What should the agent mainly do?",
            Capability::ALL
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
        )
    }

    fn tech_stack() -> Self {
        let mut options: Vec<String> = TECH_STACK_OPTIONS.iter().map(|t| t.to_string()).collect();
        options.push(NONE_OF_THESE.to_string());
        Self::new(
            QuestionKind::TechStack,
            "Which technology stack does the agent work with?",
            options,
        )
    }
}

/// A run suspended on clarification.
///
/// Carries everything needed to resume, so the caller may persist it and
/// come back later; nothing waits in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    pub run_id: Uuid,
    pub request: Request,
    pub speed_critical: bool,
    pub signals: SignalSet,
    /// Clarification rounds issued so far, this one included.
    pub rounds: u8,
    pub questions: Vec<ClarificationQuestion>,
}

impl Continuation {
    /// Check the caller-held round counter.
    ///
    /// A run only ever issues continuations with `rounds` in `1..=max`.
    /// The counter travels with the caller, so anything outside that range
    /// was not produced by a run and is refused rather than trusted.
    pub fn check_rounds(&self, max: u8) -> Result<()> {
        if self.rounds == 0 || self.rounds > max {
            return Err(ForgeError::InvalidRequest(format!(
                "continuation round {} is outside 1..={max}",
                self.rounds
            )));
        }
        Ok(())
    }
}

/// Questions for one clarification round, in a fixed order.
pub fn questions_for(
    classification: &Classification,
    signals: &SignalSet,
    min_confidence: f32,
) -> Vec<ClarificationQuestion> {
    let low_confidence = classification.domain.confidence < min_confidence;
    let mut questions = Vec::new();
    if low_confidence {
        questions.push(ClarificationQuestion::domain());
    }
    if low_confidence || classification.capabilities.is_empty() {
        questions.push(ClarificationQuestion::capability());
    }
    if signals.ambiguities.len() >= TECH_STACK_AMBIGUITY_THRESHOLD
        && signals.framework_tokens.is_empty()
    {
        questions.push(ClarificationQuestion::tech_stack());
    }
    questions
}

/// Number of the next round, or `AmbiguityUnresolved` once `max` rounds
/// have already been spent.
pub fn next_round(rounds: u8, max: u8) -> Result<u8> {
    if rounds >= max {
        return Err(ForgeError::AmbiguityUnresolved { rounds });
    }
    Ok(rounds + 1)
}

/// Merge answers into `signals`. Answers dominate inferred tokens.
///
/// Exactly one in-range option index per question is required.
pub fn apply_answers(
    signals: &mut SignalSet,
    questions: &[ClarificationQuestion],
    answers: &[usize],
) -> Result<()> {
    if answers.len() != questions.len() {
        return Err(ForgeError::InvalidRequest(format!(
            "expected {} answer(s), got {}",
            questions.len(),
            answers.len()
        )));
    }
    for (question, &answer) in questions.iter().zip(answers) {
        if answer >= question.options.len() {
            return Err(ForgeError::InvalidRequest(format!(
                "answer {answer} is out of range for question '{}' ({} options)",
                question.id,
                question.options.len()
            )));
        }
    }

    for (question, &answer) in questions.iter().zip(answers) {
        let choice = question.options[answer].as_str();
        match question.kind {
            QuestionKind::Domain => {
                let domain = Domain::CLARIFIABLE
                    .into_iter()
                    .find(|d| d.label() == choice)
                    .ok_or_else(|| {
                        ForgeError::InvalidRequest(format!("unknown domain option: {choice}"))
                    })?;
                signals.clarified_domain = Some(domain);
                signals.ambiguities.clear();
            }
            QuestionKind::Capability => {
                let capability: Capability = choice.parse()?;
                signals.clarified_capabilities = Some([capability].into_iter().collect());
            }
            QuestionKind::TechStack => {
                if choice != NONE_OF_THESE {
                    signals.add_framework(choice);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::interpret::interpret;

    fn signals_for(text: &str) -> SignalSet {
        interpret(&Request::new(text, None).unwrap())
    }

    #[test]
    fn vague_request_gets_domain_and_capability_questions() {
        let signals = signals_for("Create an agent for my project");
        let c = classify(&signals);
        let questions = questions_for(&c, &signals, 0.2);
        let kinds: Vec<QuestionKind> = questions.iter().map(|q| q.kind).collect();
        assert_eq!(kinds, vec![QuestionKind::Domain, QuestionKind::Capability]);
        assert_eq!(questions[0].options.len(), Domain::CLARIFIABLE.len());
    }

    #[test]
    fn many_ambiguities_without_frameworks_add_tech_question() {
        let signals = signals_for("Help me with stuff for my app");
        let c = classify(&signals);
        let questions = questions_for(&c, &signals, 0.2);
        let last = questions.last().unwrap();
        assert_eq!(last.kind, QuestionKind::TechStack);
        assert_eq!(last.options.last().map(String::as_str), Some(NONE_OF_THESE));
    }

    #[test]
    fn confident_request_without_capability_asks_only_capability() {
        let signals = signals_for("Kubernetes deployment pipeline");
        let c = classify(&signals);
        assert!(c.capabilities.is_empty());
        let questions = questions_for(&c, &signals, 0.2);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].kind, QuestionKind::Capability);
    }

    #[test]
    fn answers_override_inference() {
        let mut signals = signals_for("Create an agent for my project");
        let questions = vec![
            ClarificationQuestion::domain(),
            ClarificationQuestion::capability(),
            ClarificationQuestion::tech_stack(),
        ];
        // documentation, analyze, django
        apply_answers(&mut signals, &questions, &[9, 1, 1]).unwrap();
        assert_eq!(signals.clarified_domain, Some(Domain::Documentation));
        assert!(signals.ambiguities.is_empty());
        let c = classify(&signals);
        assert_eq!(c.domain.primary_domain, Domain::Documentation);
        assert_eq!(c.capabilities.names(), vec!["analyze".to_string()]);
        assert_eq!(signals.framework_tokens, vec!["django"]);
    }

    #[test]
    fn none_of_these_adds_no_framework() {
        let mut signals = SignalSet::default();
        let questions = vec![ClarificationQuestion::tech_stack()];
        let none = questions[0].options.len() - 1;
        apply_answers(&mut signals, &questions, &[none]).unwrap();
        assert!(signals.framework_tokens.is_empty());
    }

    #[test]
    fn wrong_answer_count_or_range_is_invalid() {
        let mut signals = SignalSet::default();
        let questions = vec![ClarificationQuestion::domain()];
        assert!(matches!(
            apply_answers(&mut signals, &questions, &[]),
            Err(ForgeError::InvalidRequest(_))
        ));
        assert!(matches!(
            apply_answers(&mut signals, &questions, &[10]),
            Err(ForgeError::InvalidRequest(_))
        ));
        assert_eq!(signals, SignalSet::default());
    }

    #[test]
    fn rounds_are_bounded() {
        assert_eq!(next_round(0, 2).unwrap(), 1);
        assert_eq!(next_round(1, 2).unwrap(), 2);
        assert!(matches!(
            next_round(2, 2),
            Err(ForgeError::AmbiguityUnresolved { rounds: 2 })
        ));
    }

    #[test]
    fn round_counter_must_be_one_a_run_could_issue() {
        let mut continuation = Continuation {
            run_id: Uuid::new_v4(),
            request: Request::new("Create an agent for my project", None).unwrap(),
            speed_critical: false,
            signals: SignalSet::default(),
            rounds: 1,
            questions: Vec::new(),
        };
        assert!(continuation.check_rounds(2).is_ok());
        continuation.rounds = 2;
        assert!(continuation.check_rounds(2).is_ok());
        for rounds in [0, 3] {
            continuation.rounds = rounds;
            assert!(matches!(
                continuation.check_rounds(2),
                Err(ForgeError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn continuation_survives_json() {
        let continuation = Continuation {
            run_id: Uuid::new_v4(),
            request: Request::new("Create an agent for my project", None).unwrap(),
            speed_critical: true,
            signals: signals_for("Create an agent for my project"),
            rounds: 1,
            questions: vec![ClarificationQuestion::domain()],
        };
        let json = serde_json::to_string(&continuation).unwrap();
        let back: Continuation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, continuation);
    }
}
