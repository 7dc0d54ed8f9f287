pub mod request;

pub use request::{QuestionInput, SaveProfileRequest};
