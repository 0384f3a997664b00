mod cli;
mod infra;
mod script;

use forms_runner::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
