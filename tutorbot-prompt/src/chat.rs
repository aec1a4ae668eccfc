use std::collections::HashMap;

use crate::PromptTemplate;
use async_trait::async_trait;
use tutorbot_core::{Message, Role, Runnable, TutorError, Value};

#[derive(Debug, Clone)]
pub enum MessagePromptTemplate {
    System(PromptTemplate),
    Human(PromptTemplate),
}

impl MessagePromptTemplate {
    pub fn system(template: &str) -> Self {
        Self::System(PromptTemplate::new(template))
    }

    pub fn human(template: &str) -> Self {
        Self::Human(PromptTemplate::new(template))
    }

    pub fn format(&self, vars: &HashMap<String, Value>) -> Result<Message, TutorError> {
        match self {
            MessagePromptTemplate::System(t) => Ok(Message::new(Role::System, t.render(vars)?)),
            MessagePromptTemplate::Human(t) => Ok(Message::new(Role::User, t.render(vars)?)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    messages: Vec<MessagePromptTemplate>,
}

impl ChatPromptTemplate {
    pub fn new(messages: Vec<MessagePromptTemplate>) -> Self {
        Self { messages }
    }

    pub fn format_messages(
        &self,
        vars: &HashMap<String, Value>,
    ) -> Result<Vec<Message>, TutorError> {
        self.messages.iter().map(|tmpl| tmpl.format(vars)).collect()
    }

    /// Convenience over [`format_messages`](Self::format_messages) for literal key/value pairs.
    pub fn format_with<'a, I>(&self, vars: I) -> Result<Vec<Message>, TutorError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let vars = vars
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        self.format_messages(&vars)
    }
}

#[async_trait]
impl Runnable<HashMap<String, Value>, Vec<Message>> for ChatPromptTemplate {
    async fn invoke(&self, input: HashMap<String, Value>) -> Result<Vec<Message>, TutorError> {
        self.format_messages(&input)
    }
}
