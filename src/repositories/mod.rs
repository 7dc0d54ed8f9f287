pub mod memory;
pub mod question_repository;
pub mod submission_repository;
pub mod user_repository;

pub use memory::{InMemoryQuestionRepository, InMemorySubmissionRepository, InMemoryUserRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use submission_repository::{MongoSubmissionRepository, SubmissionRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
