//! Answer validation against a template's question schema.
//!
//! The schema follows the SurveyJS layout the form front-end renders:
//! `{ "pages": [ { "elements": [ .. ] } ] }` where an element is either a
//! question (`name`, `type`, `isRequired`, `choices`, `validators`) or a
//! `panel` carrying nested `elements`. Only the subset needed to decide
//! whether a submission is complete is interpreted here.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::warn;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

/// Capability deciding whether answers satisfy a question schema.
pub trait AnswerValidator: Send + Sync {
    fn answers_valid(&self, questions: &Value, answers: &Value) -> bool;
}

/// Reason a single question failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionIssue {
    pub question: String,
    pub problem: IssueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    MissingAnswer,
    NotAChoice,
    PatternMismatch,
    OutOfRange,
    BadLength,
    AnswerCount,
    InvalidSchema,
}

/// Default validator interpreting the SurveyJS-style schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionSchemaValidator;

impl AnswerValidator for QuestionSchemaValidator {
    fn answers_valid(&self, questions: &Value, answers: &Value) -> bool {
        self.issues(questions, answers).is_empty()
    }
}

impl QuestionSchemaValidator {
    /// Every problem found, in schema order.
    pub fn issues(&self, questions: &Value, answers: &Value) -> Vec<QuestionIssue> {
        let empty = Map::new();
        let answers = answers.as_object().unwrap_or(&empty);

        let mut issues = Vec::new();
        for question in schema_questions(questions) {
            check_question(question, answers, &mut issues);
        }
        issues
    }
}

fn schema_questions(questions: &Value) -> Vec<&Map<String, Value>> {
    let mut collected = Vec::new();
    let pages = questions
        .get("pages")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for page in pages {
        if is_hidden(page) {
            continue;
        }
        collect_elements(page.get("elements"), &mut collected);
    }
    // Flat schemas without pages are accepted too.
    collect_elements(questions.get("elements"), &mut collected);
    collected
}

fn collect_elements<'a>(elements: Option<&'a Value>, out: &mut Vec<&'a Map<String, Value>>) {
    let Some(elements) = elements.and_then(Value::as_array) else {
        return;
    };
    for element in elements {
        let Some(object) = element.as_object() else {
            continue;
        };
        if is_hidden(element) {
            continue;
        }
        if object.get("type").and_then(Value::as_str) == Some("panel") {
            collect_elements(object.get("elements"), out);
        } else if object.get("name").and_then(Value::as_str).is_some() {
            out.push(object);
        }
    }
}

fn is_hidden(element: &Value) -> bool {
    element.get("visible").and_then(Value::as_bool) == Some(false)
}

fn is_empty_answer(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn check_question(
    question: &Map<String, Value>,
    answers: &Map<String, Value>,
    issues: &mut Vec<QuestionIssue>,
) {
    let name = question
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let answer = answers.get(&name);
    let mut report = |problem| {
        issues.push(QuestionIssue {
            question: name.clone(),
            problem,
        })
    };

    if is_empty_answer(answer) {
        if question.get("isRequired").and_then(Value::as_bool) == Some(true) {
            report(IssueKind::MissingAnswer);
        }
        // Validators only run against supplied answers.
        return;
    }
    let Some(answer) = answer else {
        return;
    };

    if let Some(problem) = check_choices(question, answer) {
        report(problem);
    }

    let validators = question
        .get("validators")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for validator in validators {
        if let Some(problem) = check_validator(validator, answer) {
            report(problem);
        }
    }
}

fn choice_value(choice: &Value) -> &Value {
    choice.get("value").unwrap_or(choice)
}

fn check_choices(question: &Map<String, Value>, answer: &Value) -> Option<IssueKind> {
    let kind = question.get("type").and_then(Value::as_str)?;
    if !matches!(kind, "radiogroup" | "dropdown" | "checkbox" | "tagbox") {
        return None;
    }
    let allows_other = ["showOtherItem", "hasOther"]
        .iter()
        .any(|flag| question.get(*flag).and_then(Value::as_bool) == Some(true));
    if allows_other {
        return None;
    }
    let choices = question.get("choices").and_then(Value::as_array)?;
    let is_choice = |value: &Value| choices.iter().any(|choice| choice_value(choice) == value);

    let valid = match answer {
        Value::Array(selected) => selected.iter().all(is_choice),
        single => is_choice(single),
    };
    (!valid).then_some(IssueKind::NotAChoice)
}

fn number_bound(validator: &Value, key: &str) -> Option<f64> {
    validator.get(key).and_then(Value::as_f64)
}

fn check_validator(validator: &Value, answer: &Value) -> Option<IssueKind> {
    let kind = validator.get("type").and_then(Value::as_str)?;
    match kind {
        "regex" => {
            let pattern = validator.get("regex").and_then(Value::as_str)?;
            let text = answer_text(answer)?;
            match Regex::new(pattern) {
                Ok(regex) => (!regex.is_match(&text)).then_some(IssueKind::PatternMismatch),
                Err(error) => {
                    warn!(%pattern, %error, "question schema carries an invalid regex");
                    Some(IssueKind::InvalidSchema)
                }
            }
        }
        "email" => {
            let text = answer_text(answer)?;
            (!EMAIL_RE.is_match(text.trim())).then_some(IssueKind::PatternMismatch)
        }
        "numeric" => {
            let number = match answer {
                Value::Number(number) => number.as_f64(),
                Value::String(text) => text.trim().parse::<f64>().ok(),
                _ => None,
            };
            let Some(number) = number else {
                return Some(IssueKind::OutOfRange);
            };
            let below = number_bound(validator, "minValue").is_some_and(|min| number < min);
            let above = number_bound(validator, "maxValue").is_some_and(|max| number > max);
            (below || above).then_some(IssueKind::OutOfRange)
        }
        "text" => {
            let length = answer_text(answer)?.chars().count() as f64;
            let short = number_bound(validator, "minLength").is_some_and(|min| length < min);
            let long = number_bound(validator, "maxLength")
                .is_some_and(|max| max > 0.0 && length > max);
            (short || long).then_some(IssueKind::BadLength)
        }
        "answercount" => {
            let count = answer.as_array().map(Vec::len).unwrap_or(1) as f64;
            let few = number_bound(validator, "minCount").is_some_and(|min| count < min);
            let many = number_bound(validator, "maxCount").is_some_and(|max| count > max);
            (few || many).then_some(IssueKind::AnswerCount)
        }
        _ => None,
    }
}

fn answer_text(answer: &Value) -> Option<String> {
    match answer {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
