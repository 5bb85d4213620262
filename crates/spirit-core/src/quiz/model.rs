//! Quiz domain models.

use serde::{Deserialize, Serialize};

pub const STYLES: &[&str] = &["Boy", "Girl"];
pub const COLORS: &[&str] = &["Red", "Blue", "Green", "Purple", "Pink", "Gold"];
pub const PERSONALITIES: &[&str] = &["Brave", "Kind", "Silly", "Mysterious", "Creative", "Gentle"];
pub const PLACES: &[&str] = &["Forest", "Ocean", "Mountain", "Sky", "Space", "Enchanted Garden"];
pub const ELEMENTS: &[&str] = &["Fire", "Water", "Earth", "Air", "Light", "Dream"];

/// One of the five fixed quiz questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    Style,
    Color,
    Personality,
    Place,
    Element,
}

impl Question {
    /// All questions in the order they are asked.
    pub const ALL: [Question; 5] = [
        Self::Style,
        Self::Color,
        Self::Personality,
        Self::Place,
        Self::Element,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Style => "Who are you?",
            Self::Color => "What's your favorite color?",
            Self::Personality => "What's your personality like?",
            Self::Place => "Where's your favorite place?",
            Self::Element => "Choose your element!",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Style => "👋",
            Self::Color => "🎨",
            Self::Personality => "💫",
            Self::Place => "🌍",
            Self::Element => "⚡",
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::Style => STYLES,
            Self::Color => COLORS,
            Self::Personality => PERSONALITIES,
            Self::Place => PLACES,
            Self::Element => ELEMENTS,
        }
    }

    /// Zero-based position in the quiz.
    pub fn index(&self) -> usize {
        match self {
            Self::Style => 0,
            Self::Color => 1,
            Self::Personality => 2,
            Self::Place => 3,
            Self::Element => 4,
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.options().contains(&value)
    }
}

/// Position in the quiz flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStep {
    Locked,
    Style,
    Color,
    Personality,
    Place,
    Element,
    Generating,
    Display,
}

/// Something that happened to the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    Unlock,
    Answer,
    Back,
    CardReady,
    FailureReset,
    Reset,
}

impl QuizEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlock => "unlock",
            Self::Answer => "answer",
            Self::Back => "back",
            Self::CardReady => "card_ready",
            Self::FailureReset => "failure_reset",
            Self::Reset => "reset",
        }
    }
}

impl QuizStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Style => "style",
            Self::Color => "color",
            Self::Personality => "personality",
            Self::Place => "place",
            Self::Element => "element",
            Self::Generating => "generating",
            Self::Display => "display",
        }
    }

    /// The question asked in this step, if it is a question step.
    pub fn question(&self) -> Option<Question> {
        match self {
            Self::Style => Some(Question::Style),
            Self::Color => Some(Question::Color),
            Self::Personality => Some(Question::Personality),
            Self::Place => Some(Question::Place),
            Self::Element => Some(Question::Element),
            _ => None,
        }
    }

    /// Transition table. `None` means the event is not allowed here.
    pub fn on(&self, event: QuizEvent) -> Option<QuizStep> {
        use QuizEvent as E;
        match (self, event) {
            (Self::Locked, E::Unlock) => Some(Self::Style),

            (Self::Style, E::Answer) => Some(Self::Color),
            (Self::Color, E::Answer) => Some(Self::Personality),
            (Self::Personality, E::Answer) => Some(Self::Place),
            (Self::Place, E::Answer) => Some(Self::Element),
            (Self::Element, E::Answer) => Some(Self::Generating),

            (Self::Color, E::Back) => Some(Self::Style),
            (Self::Personality, E::Back) => Some(Self::Color),
            (Self::Place, E::Back) => Some(Self::Personality),
            (Self::Element, E::Back) => Some(Self::Place),

            (Self::Generating, E::CardReady) => Some(Self::Display),
            (Self::Generating, E::FailureReset) => Some(Self::Style),
            (Self::Display, E::Reset) => Some(Self::Style),

            _ => None,
        }
    }
}

impl std::fmt::Display for QuizStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five quiz selections driving generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub style: String,
    pub color: String,
    pub personality: String,
    pub place: String,
    pub element: String,
}

/// Answers collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartialAnswers {
    pub style: Option<String>,
    pub color: Option<String>,
    pub personality: Option<String>,
    pub place: Option<String>,
    pub element: Option<String>,
}

impl PartialAnswers {
    pub fn get(&self, question: Question) -> Option<&str> {
        match question {
            Question::Style => self.style.as_deref(),
            Question::Color => self.color.as_deref(),
            Question::Personality => self.personality.as_deref(),
            Question::Place => self.place.as_deref(),
            Question::Element => self.element.as_deref(),
        }
    }

    pub fn set(&mut self, question: Question, value: impl Into<String>) {
        let slot = match question {
            Question::Style => &mut self.style,
            Question::Color => &mut self.color,
            Question::Personality => &mut self.personality,
            Question::Place => &mut self.place,
            Question::Element => &mut self.element,
        };
        *slot = Some(value.into());
    }

    /// Number of questions answered.
    pub fn answered(&self) -> usize {
        Question::ALL.iter().filter(|q| self.get(**q).is_some()).count()
    }

    /// The complete answer set, once every question has a value.
    pub fn complete(&self) -> Option<AnswerSet> {
        Some(AnswerSet {
            style: self.style.clone()?,
            color: self.color.clone()?,
            personality: self.personality.clone()?,
            place: self.place.clone()?,
            element: self.element.clone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_order_matches_steps() {
        let mut step = QuizStep::Style;
        for question in Question::ALL {
            assert_eq!(step.question(), Some(question));
            step = step.on(QuizEvent::Answer).unwrap();
        }
        assert_eq!(step, QuizStep::Generating);
    }

    #[test]
    fn test_back_not_allowed_from_first_question() {
        assert_eq!(QuizStep::Style.on(QuizEvent::Back), None);
        assert_eq!(QuizStep::Generating.on(QuizEvent::Back), None);
        assert_eq!(QuizStep::Element.on(QuizEvent::Back), Some(QuizStep::Place));
    }

    #[test]
    fn test_reset_only_from_display() {
        assert_eq!(QuizStep::Display.on(QuizEvent::Reset), Some(QuizStep::Style));
        assert_eq!(QuizStep::Generating.on(QuizEvent::Reset), None);
        assert_eq!(QuizStep::Locked.on(QuizEvent::Reset), None);
    }

    #[test]
    fn test_complete_requires_all_answers() {
        let mut answers = PartialAnswers::default();
        answers.set(Question::Style, "Girl");
        answers.set(Question::Color, "Pink");
        answers.set(Question::Personality, "Kind");
        answers.set(Question::Place, "Ocean");
        assert!(answers.complete().is_none());
        assert_eq!(answers.answered(), 4);

        answers.set(Question::Element, "Water");
        let set = answers.complete().unwrap();
        assert_eq!(set.place, "Ocean");
        assert_eq!(set.element, "Water");
    }

    #[test]
    fn test_option_membership() {
        assert!(Question::Place.accepts("Enchanted Garden"));
        assert!(!Question::Place.accepts("enchanted garden"));
        assert!(!Question::Element.accepts("Shadow"));
    }
}
