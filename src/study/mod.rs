//! Study session engine: filtering, ordering, quizzing, timing and scoring.

pub mod modes;
pub mod ordering;
pub mod session;
pub mod summary;
pub mod timer;

pub use modes::{Answer, AnswerMismatch, Quiz};
pub use session::{Feedback, Phase, Session, SubmitError, Tally};
pub use summary::{score, Summary};
pub use timer::{Countdown, TickOutcome};
