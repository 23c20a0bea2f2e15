use serde_json::Value;

/// Controls which bits of state the runner prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, active and hidden questions, help text.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and summaries as the engine walks the survey.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, payload: &WizardPayload) {
        if self.header_printed {
            return;
        }
        println!("Survey: {}", payload.survey_title);
        if self.verbosity.is_verbose()
            && let Some(help) = &payload.help
        {
            println!("Help: {}", help);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &WizardPayload) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Status: {} ({}/{})",
            payload.status.as_str(),
            payload.progress.answered,
            payload.progress.total
        );
        println!("Active questions:");
        for question in payload.questions.iter().filter(|question| question.visible) {
            let mut entry = format!(" - {} ({})", question.id, question.title);
            if question.required {
                entry.push_str(" [required]");
            }
            println!("{}", entry);
        }
        if !payload.hidden_question_ids.is_empty() {
            println!("Hidden questions: {}", payload.hidden_question_ids.join(", "));
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.title)
        } else {
            format!("{} {}", prompt.index, prompt.title)
        };
        if prompt.required {
            line.push_str(" *");
        }
        println!("{}", line);
        if self.verbosity.is_verbose()
            && let Some(current) = &prompt.current_value
        {
            println!("Current answer: {}", current);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_termination(&self, question_id: &str) {
        println!("Survey ended at {}.", question_id);
    }

    pub fn show_completion(&self, answer_set: &Value) {
        println!("Done ✅");
        if self.show_answers_json {
            match serde_json::to_string_pretty(answer_set) {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

/// Render payload extracted from the component output.
pub struct WizardPayload {
    pub survey_title: String,
    pub help: Option<String>,
    pub logic_version: u64,
    pub status: RenderStatus,
    pub next_question_id: Option<String>,
    pub termination_question_id: Option<String>,
    pub progress: RenderProgress,
    pub questions: Vec<WizardQuestion>,
    pub hidden_question_ids: Vec<String>,
}

impl WizardPayload {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let survey_title = json
            .get("survey_title")
            .and_then(Value::as_str)
            .ok_or_else(|| "payload missing survey_title".to_string())?
            .to_string();
        let help = json
            .get("help")
            .and_then(Value::as_str)
            .map(|value| value.to_string());
        let logic_version = json
            .get("logic_version")
            .and_then(Value::as_u64)
            .ok_or_else(|| "payload missing logic_version".to_string())?;
        let status = RenderStatus::from_label(
            json.get("status")
                .and_then(Value::as_str)
                .unwrap_or("need_input"),
        );
        let progress = json
            .get("progress")
            .and_then(Value::as_object)
            .ok_or_else(|| "payload missing progress".to_string())?;
        let answered = progress
            .get("answered")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let total = progress.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;
        let questions = json
            .get("questions")
            .and_then(Value::as_array)
            .ok_or_else(|| "payload missing questions".to_string())?
            .iter()
            .map(WizardQuestion::from_json)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            survey_title,
            help,
            logic_version,
            status,
            next_question_id: string_field(json, "next_question_id"),
            termination_question_id: string_field(json, "termination_question_id"),
            progress: RenderProgress { answered, total },
            questions,
            hidden_question_ids: json
                .get("hidden_question_ids")
                .and_then(Value::as_array)
                .map(|ids| {
                    ids.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn question(&self, id: &str) -> Option<&WizardQuestion> {
        self.questions.iter().find(|question| question.id == id)
    }

    /// Active question ids in order, as the client sees them.
    pub fn active_order(&self) -> Vec<&str> {
        self.questions
            .iter()
            .filter(|question| question.visible)
            .map(|question| question.id.as_str())
            .collect()
    }
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    json.get(key).and_then(Value::as_str).map(String::from)
}

/// Progress counters from the render payload.
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    NeedInput,
    Complete,
    Terminated,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
            RenderStatus::Terminated => "terminated",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "complete" => RenderStatus::Complete,
            "terminated" => RenderStatus::Terminated,
            _ => RenderStatus::NeedInput,
        }
    }
}

/// Minimal view of a question used for rendering prompts.
pub struct WizardQuestion {
    pub id: String,
    pub title: String,
    pub required: bool,
    pub visible: bool,
    pub current_value: Option<Value>,
}

impl WizardQuestion {
    fn from_json(value: &Value) -> Result<Self, String> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "question missing id".to_string())?
            .to_string();
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("question '{}' missing title", id))?
            .to_string();
        let required = value
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let visible = value
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        Ok(Self {
            id,
            title,
            required,
            visible,
            current_value: value.get("current_value").cloned(),
        })
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub required: bool,
    pub current_value: Option<Value>,
}

impl PromptContext {
    pub fn new(question: &WizardQuestion, progress: &RenderProgress) -> Self {
        Self {
            index: (progress.answered + 1).max(1),
            total: progress.total,
            title: question.title.clone(),
            required: question.required,
            current_value: question.current_value.clone(),
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}
