use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::AppError;
use crate::ports::ConfirmationPrompt;

/// Prompt fake answering from a pre-scripted sequence.
///
/// Running out of answers is an error: a test that triggers more prompts
/// than it scripted should fail loudly.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    pub questions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            questions: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl ConfirmationPrompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> Result<bool, AppError> {
        self.questions.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Validation(format!("Unexpected prompt: {}", message)))
    }
}
