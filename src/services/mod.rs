pub mod access_service;
pub mod grading_service;
pub mod question_service;
pub mod submission_service;
pub mod user_service;

pub use access_service::AccessService;
pub use grading_service::GradingService;
pub use question_service::QuestionService;
pub use submission_service::SubmissionService;
pub use user_service::UserService;
