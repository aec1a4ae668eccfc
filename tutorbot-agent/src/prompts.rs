//! Prompt templates for the model calls made by the workflow.

use tutorbot_prompt::{ChatPromptTemplate, MessagePromptTemplate};

pub const MISSING_DESCRIPTION: &str = "No explanation or error provided.";

const ROUTER_SYSTEM: &str = "You are a router for an ML tutor chatbot. \
Decide whether the user's request needs a tool before it can be answered.";

const ROUTER_HUMAN: &str = "User input: {{input}}

Available tools:
{{tools}}
- final_answer: answer directly, no tool needed

Return ONLY one of these labels and nothing else: {{labels}}";

const CODE_SPLIT_SYSTEM: &str =
    "You separate Python code from the surrounding request in a user message.";

const CODE_SPLIT_HUMAN: &str = "Split the input below into the Python code to execute and a short \
description of what the user wants to know about it.
Reply on a single line formatted exactly as: <code> / <description>
Do not add anything else.

Input: {{input}}";

const CODE_EXPLAIN_SYSTEM: &str = "You are a patient Python tutor explaining code to a student.";

const CODE_EXPLAIN_HUMAN: &str = "Request: {{input}}

Code:
{{code}}

Description: {{description}}

Execution result: {{execution}}

Explain what the code does and what it printed. If it failed or timed out, explain the error and \
how to fix it.";

const FINAL_ANSWER_SYSTEM: &str = "You are an expert tutor in Python, machine learning and data \
science. Answer questions on these topics clearly, using the tool results when they are relevant. \
Politely decline questions on unrelated topics. If you are not sure of the answer, say that you \
don't know instead of guessing.";

const FINAL_ANSWER_HUMAN: &str = "Input: {{input}}, tool results: {{tool_results}}";

pub fn router_prompt() -> ChatPromptTemplate {
    ChatPromptTemplate::new(vec![
        MessagePromptTemplate::system(ROUTER_SYSTEM),
        MessagePromptTemplate::human(ROUTER_HUMAN),
    ])
}

pub fn code_split_prompt() -> ChatPromptTemplate {
    ChatPromptTemplate::new(vec![
        MessagePromptTemplate::system(CODE_SPLIT_SYSTEM),
        MessagePromptTemplate::human(CODE_SPLIT_HUMAN),
    ])
}

pub fn code_explain_prompt() -> ChatPromptTemplate {
    ChatPromptTemplate::new(vec![
        MessagePromptTemplate::system(CODE_EXPLAIN_SYSTEM),
        MessagePromptTemplate::human(CODE_EXPLAIN_HUMAN),
    ])
}

pub fn final_answer_prompt() -> ChatPromptTemplate {
    ChatPromptTemplate::new(vec![
        MessagePromptTemplate::system(FINAL_ANSWER_SYSTEM),
        MessagePromptTemplate::human(FINAL_ANSWER_HUMAN),
    ])
}
