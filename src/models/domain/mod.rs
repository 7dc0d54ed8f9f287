pub mod question;
pub mod submission;
pub mod user;
pub use question::{Question, QuestionId};
pub use submission::{Answer, Submission};
pub use user::{Principal, UserProfile, UserRecord, UserRole};
