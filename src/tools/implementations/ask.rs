//! ask_user_question - multiple-choice questions answered by the human

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{BobError, Result};
use crate::tools::gate::{InteractiveGate, Question};
use crate::tools::registry::{parse_params, Tool, ToolContext};

const MAX_QUESTIONS: usize = 4;
const MAX_HEADER_CHARS: usize = 12;

pub struct AskUserQuestionTool {
    gate: InteractiveGate,
}

impl AskUserQuestionTool {
    pub fn new(gate: InteractiveGate) -> Self {
        Self { gate }
    }
}

#[derive(Deserialize)]
struct Params {
    questions: Vec<Question>,
}

fn validate(questions: &[Question]) -> Result<()> {
    if questions.is_empty() || questions.len() > MAX_QUESTIONS {
        return Err(BobError::InvalidArguments(format!(
            "must provide 1-{} questions, got {}",
            MAX_QUESTIONS,
            questions.len()
        )));
    }

    for (i, q) in questions.iter().enumerate() {
        let n = i + 1;
        if q.question.trim().is_empty() || q.header.trim().is_empty() {
            return Err(BobError::InvalidArguments(format!(
                "question {} is missing 'question' or 'header'",
                n
            )));
        }
        if q.header.chars().count() > MAX_HEADER_CHARS {
            return Err(BobError::InvalidArguments(format!(
                "question {} header '{}' exceeds {} characters",
                n, q.header, MAX_HEADER_CHARS
            )));
        }
        if !(2..=4).contains(&q.options.len()) {
            return Err(BobError::InvalidArguments(format!(
                "question {} must have 2-4 options, got {}",
                n,
                q.options.len()
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl Tool for AskUserQuestionTool {
    fn name(&self) -> &str {
        "ask_user_question"
    }

    fn description(&self) -> &str {
        "Ask the user 1-4 questions while working, to gather preferences, clarify ambiguous \
         instructions or choose between approaches. Each question has 2-4 options; the user \
         can always answer with free text instead."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": 4,
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": {
                                "type": "string",
                                "description": "The complete question, ending with a question mark"
                            },
                            "header": {
                                "type": "string",
                                "description": "Very short label (max 12 chars), e.g. 'Auth method'"
                            },
                            "options": {
                                "type": "array",
                                "minItems": 2,
                                "maxItems": 4,
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "label": {"type": "string"},
                                        "description": {"type": "string"}
                                    },
                                    "required": ["label", "description"]
                                }
                            },
                            "multiSelect": {
                                "type": "boolean",
                                "description": "Allow selecting several options"
                            }
                        },
                        "required": ["question", "header", "options", "multiSelect"]
                    }
                }
            },
            "required": ["questions"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let params: Params = parse_params(args)?;
        validate(&params.questions)?;

        let headers: Vec<String> = params.questions.iter().map(|q| q.header.clone()).collect();
        let answers = self.gate.ask_all(params.questions, &ctx.cancel).await?;

        let mut out = String::from("User's answers:");
        for (header, answer) in headers.iter().zip(&answers) {
            out.push_str(&format!("\n{}: {}", header, answer));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn question(header: &str, options: usize) -> Value {
        let options: Vec<Value> = (0..options)
            .map(|i| json!({"label": format!("opt{}", i), "description": "d"}))
            .collect();
        json!({"question": "Which one?", "header": header, "options": options, "multiSelect": false})
    }

    #[tokio::test]
    async fn test_answers_are_formatted_by_header() {
        let (gate, mut ui) = InteractiveGate::channel();
        let tool = AskUserQuestionTool::new(gate);
        let ctx = ToolContext::new(".", CancellationToken::new());

        let answering = tokio::spawn(async move {
            let pending = ui.recv().await.unwrap();
            assert_eq!(pending.question().options.len(), 2);
            pending.resolve("JWT");
        });

        let out = tool
            .execute(json!({"questions": [question("Auth", 2)]}), &ctx)
            .await
            .unwrap();
        answering.await.unwrap();

        assert_eq!(out, "User's answers:\nAuth: JWT");
    }

    #[tokio::test]
    async fn test_validation() {
        let (gate, _ui) = InteractiveGate::channel();
        let tool = AskUserQuestionTool::new(gate);
        let ctx = ToolContext::new(".", CancellationToken::new());

        for args in [
            json!({"questions": []}),
            json!({"questions": [question("A header that is long", 2)]}),
            json!({"questions": [question("Auth", 1)]}),
            json!({"questions": [question("Auth", 5)]}),
        ] {
            let err = tool.execute(args, &ctx).await.unwrap_err();
            assert!(matches!(err, BobError::InvalidArguments(_)));
        }
    }
}
