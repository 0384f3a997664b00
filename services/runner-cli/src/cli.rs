use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use forms_runner::config::AppConfig;
use forms_runner::error::AppError;
use forms_runner::runner::{ExpressionEvaluator, SandboxedEvaluator};
use forms_runner::telemetry;
use serde_json::Value;
use tracing::info;

use crate::script::run_script;

#[derive(Parser, Debug)]
#[command(
    name = "Forms Runner",
    about = "Drive applications through form definitions from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an application for a form and replay a script of page submissions
    Run(RunArgs),
    /// Evaluate a single expression against a JSON data object
    Eval(EvalArgs),
}

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Form definition (JSON)
    #[arg(long)]
    pub(crate) form: PathBuf,
    /// Script of steps to replay (JSON array)
    #[arg(long)]
    pub(crate) script: PathBuf,
    /// Applicant the application is started for
    #[arg(long, default_value = "applicant-1")]
    pub(crate) applicant: String,
}

#[derive(Args, Debug)]
pub(crate) struct EvalArgs {
    /// Expression to evaluate, e.g. "data.age >= 18"
    #[arg(long)]
    pub(crate) expression: String,
    /// JSON object bound to `data`
    #[arg(long, default_value = "{}")]
    pub(crate) data: String,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(?config.environment, "forms runner ready");

    match cli.command {
        Command::Run(args) => run_script(args, &config),
        Command::Eval(args) => {
            let data: Value = serde_json::from_str(&args.data)?;
            let evaluator = SandboxedEvaluator::from_config(&config.engine);
            let value = evaluator.evaluate_raw(&args.expression, &data)?;
            println!("{value}");
            Ok(())
        }
    }
}
