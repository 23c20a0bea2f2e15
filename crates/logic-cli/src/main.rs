mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_logic::{
    evaluate as component_evaluate, lint as component_lint, next as component_next,
    render_json_ui, render_text as component_render_text, submit, validate_submission,
};
use logic_spec::SurveyLogicSpec;
use serde_json::{Map, Value, json};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wizard::{AnswerParseError, PromptContext, Verbosity, WizardPayload, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Environment variable holding the tracing filter directives.
const LOG_ENV: &str = "SURVEY_LOGIC_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Survey logic CLI",
    long_about = "Evaluates conditional survey logic, validates submissions, and runs surveys in a text shell"
)]
struct Cli {
    /// Raise the default log level to debug (SURVEY_LOGIC_LOG still wins).
    #[arg(long, global = true, alias = "debug")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a survey against a set of answers.
    Evaluate {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        /// Optional JSON file containing answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate a submission; exits non-zero when answers are missing.
    Validate {
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Report malformed or suspicious rules.
    Lint {
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
    },
    /// Print the JSON Schema of the survey definition format.
    Schema,
    /// Walk a survey interactively, one active question at a time.
    Run {
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        /// Optional JSON file containing initial answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Also emit the accepted answer set as JSON.
        #[arg(long)]
        answers_json: bool,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Evaluate {
            survey,
            answers,
            format,
        } => run_evaluate(&survey, answers.as_deref(), format),
        Command::Validate { survey, answers } => run_validate(&survey, &answers),
        Command::Lint { survey } => run_lint(&survey),
        Command::Schema => run_schema(),
        Command::Run {
            survey,
            answers,
            answers_json,
        } => run_survey(&survey, answers.as_deref(), cli.verbose, answers_json),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

/// Survey definition plus the component config that embeds it.
struct LoadedSurvey {
    id: String,
    config_json: String,
}

fn load_survey(path: &Path) -> CliResult<LoadedSurvey> {
    let contents = fs::read_to_string(path)?;
    let spec = SurveyLogicSpec::from_json(&contents)?;
    tracing::debug!(
        survey_id = %spec.id,
        questions = spec.questions.len(),
        rules = spec.rules.len(),
        "loaded survey"
    );
    Ok(LoadedSurvey {
        id: spec.id,
        config_json: json!({ "survey_json": contents }).to_string(),
    })
}

fn load_answers(path: Option<&Path>) -> CliResult<Map<String, Value>> {
    let Some(path) = path else {
        return Ok(Map::new());
    };
    let contents = fs::read_to_string(path)?;
    match serde_json::from_str(&contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(format!("answers file '{}' must contain a JSON object", path.display()).into()),
    }
}

fn run_evaluate(survey_path: &Path, answers_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
    let survey = load_survey(survey_path)?;
    let answers = Value::Object(load_answers(answers_path)?).to_string();
    match format {
        OutputFormat::Text => {
            let text = parse_text_result(component_render_text(
                &survey.id,
                &survey.config_json,
                &answers,
            ))?;
            println!("{}", text);
        }
        OutputFormat::Json => {
            let evaluation = parse_component_result(&component_evaluate(
                &survey.id,
                &survey.config_json,
                &answers,
            ))?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
    }
    Ok(())
}

fn run_validate(survey_path: &Path, answers_path: &Path) -> CliResult<()> {
    let survey = load_survey(survey_path)?;
    let answers = Value::Object(load_answers(Some(answers_path))?).to_string();
    let review = parse_component_result(&validate_submission(
        &survey.id,
        &survey.config_json,
        &answers,
    ))?;

    let valid = review["valid"].as_bool().unwrap_or(false);
    println!(
        "Validation result: {}",
        if valid { "valid" } else { "invalid" }
    );
    describe_review(&review);

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_review(review: &Value) {
    let trace = string_list(&review["answers"]["trace"]);
    println!("Active order: {}", trace.join(", "));
    if let Some(question_id) = review["answers"]["termination_question_id"].as_str() {
        println!("Survey ended at {}.", question_id);
    }
    print_validation_errors(review);
    if let Some(dropped) = review["dropped"].as_array()
        && !dropped.is_empty()
    {
        let entries = dropped
            .iter()
            .map(|entry| {
                format!(
                    "{} ({})",
                    entry["question_id"].as_str().unwrap_or("<unknown>"),
                    entry["reason"].as_str().unwrap_or("dropped")
                )
            })
            .collect::<Vec<_>>();
        println!("Dropped answers: {}", entries.join(", "));
    }
}

fn print_validation_errors(response: &Value) {
    let missing = response["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error["question_id"].as_str())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if !missing.is_empty() {
        eprintln!("Missing required answers for: {}", missing.join(", "));
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn run_lint(survey_path: &Path) -> CliResult<()> {
    let survey = load_survey(survey_path)?;
    let report = parse_component_result(&component_lint(&survey.id, &survey.config_json))?;
    let issues = report["issues"].as_array().cloned().unwrap_or_default();

    if issues.is_empty() {
        println!("No issues found.");
    }
    for issue in &issues {
        println!(
            "[{}] {} {}: {}",
            issue["severity"].as_str().unwrap_or("warning"),
            issue["rule_id"].as_str().unwrap_or("<unknown>"),
            issue["kind"].as_str().unwrap_or("issue"),
            issue["message"].as_str().unwrap_or_default()
        );
    }

    if report["valid"].as_bool().unwrap_or(false) {
        Ok(())
    } else {
        Err("survey has blocking rule errors".into())
    }
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(SurveyLogicSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_survey(
    survey_path: &Path,
    answers_path: Option<&Path>,
    verbose: bool,
    answers_json: bool,
) -> CliResult<()> {
    let survey = load_survey(survey_path)?;
    let mut answers = load_answers(answers_path)?;
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);

    loop {
        let answers_str = Value::Object(answers.clone()).to_string();
        let ui = parse_component_result(&render_json_ui(
            &survey.id,
            &survey.config_json,
            &answers_str,
        ))?;
        let payload =
            WizardPayload::from_json(&ui).map_err(|err| format!("survey UI error: {}", err))?;
        presenter.show_header(&payload);
        presenter.show_status(&payload);

        let Some(question_id) = payload.next_question_id.clone() else {
            return finish_survey(&survey, &answers_str, &payload, &presenter);
        };
        let question = payload
            .question(&question_id)
            .ok_or_else(|| format!("payload missing question '{}'", question_id))?;
        let prompt = PromptContext::new(question, &payload.progress);

        match prompt_question(&prompt, &presenter)? {
            PromptReply::Answer(value) => {
                answers.insert(question_id, value);
            }
            PromptReply::Back => {
                let navigation = parse_component_result(&component_next(
                    &survey.id,
                    &survey.config_json,
                    &answers_str,
                    &question_id,
                ))?;
                match navigation["previous_question_id"].as_str() {
                    Some(previous) => {
                        answers.remove(previous);
                    }
                    None => println!("Already at the first question."),
                }
            }
        }
    }
}

fn finish_survey(
    survey: &LoadedSurvey,
    answers_str: &str,
    payload: &WizardPayload,
    presenter: &WizardPresenter,
) -> CliResult<()> {
    if let Some(question_id) = &payload.termination_question_id {
        presenter.show_termination(question_id);
    }
    let client = json!({
        "logic_version": payload.logic_version,
        "active_order": payload.active_order(),
    });
    let response = parse_component_result(&submit(
        &survey.id,
        &survey.config_json,
        answers_str,
        &client.to_string(),
    ))?;
    if response["status"] != "accepted" {
        print_validation_errors(&response);
        return Err("submission rejected".into());
    }
    presenter.show_completion(&response["answer_set"]);
    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

/// Text renderers only answer with JSON when they fail.
fn parse_text_result(response: String) -> CliResult<String> {
    if let Ok(value) = serde_json::from_str::<Value>(&response)
        && let Some(error) = value.get("error").and_then(Value::as_str)
    {
        return Err(error.into());
    }
    Ok(response)
}

enum PromptReply {
    Answer(Value),
    Back,
}

fn prompt_question(prompt: &PromptContext, presenter: &WizardPresenter) -> CliResult<PromptReply> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input closed before the survey finished".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("survey aborted by user".into());
        }
        if trimmed.eq_ignore_ascii_case("back") {
            return Ok(PromptReply::Back);
        }

        match parse_answer(prompt.required, trimmed) {
            Ok(value) => return Ok(PromptReply::Answer(value)),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// A JSON array is read as a list of choices; anything else is free text.
fn parse_answer(required: bool, raw: &str) -> Result<Value, AnswerParseError> {
    if raw.is_empty() {
        return if required {
            Err(AnswerParseError::new(
                "this question requires an answer",
                Some("any non-empty text".into()),
            ))
        } else {
            Ok(Value::String(String::new()))
        };
    }
    if raw.starts_with('[') {
        let choices: Vec<String> = serde_json::from_str(raw).map_err(|err| {
            AnswerParseError::new(
                "choices must be a JSON array of strings",
                Some(err.to_string()),
            )
        })?;
        return Ok(Value::Array(choices.into_iter().map(Value::String).collect()));
    }
    Ok(Value::String(raw.to_string()))
}
