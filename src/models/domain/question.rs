use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type QuestionId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId, // assigned by the service on create
    pub question_text: String,
    pub options: Vec<String>,
    pub answer_index: u32, // zero-based into `options`
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[graphql(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[graphql(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(question_text: &str, options: &[&str], answer_index: u32, points: u32) -> Self {
        Question {
            id: 0,
            question_text: question_text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer_index,
            points,
            topic: None,
            created_at: None,
            modified_at: None,
        }
    }

    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = Some(topic.to_string());
        self
    }

    /// Whether `selected_index` names the correct option. Out-of-range
    /// selections are simply wrong.
    pub fn is_correct(&self, selected_index: u32) -> bool {
        selected_index == self.answer_index && (selected_index as usize) < self.options.len()
    }

    pub fn has_option(&self, index: u32) -> bool {
        (index as usize) < self.options.len()
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.answer_index as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_serializes_camel_case() {
        let question = Question::new("2+2?", &["3", "4", "5"], 1, 5);
        let json = serde_json::to_value(&question).unwrap();

        assert_eq!(json["questionText"], "2+2?");
        assert_eq!(json["answerIndex"], 1);
        assert!(json.get("topic").is_none());
    }

    #[test]
    fn test_is_correct_ignores_out_of_range_selection() {
        let mut question = Question::new("2+2?", &["3", "4"], 1, 5);
        assert!(question.is_correct(1));
        assert!(!question.is_correct(0));

        // a corrupted record must still never grade an impossible pick as right
        question.answer_index = 7;
        assert!(!question.is_correct(7));
    }

    #[test]
    fn test_correct_option() {
        let question = Question::new("Capital of France?", &["Rome", "Paris"], 1, 2)
            .with_topic("Geography");
        assert_eq!(question.correct_option(), Some("Paris"));
        assert_eq!(question.topic.as_deref(), Some("Geography"));
    }
}
