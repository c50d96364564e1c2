use action_locator::FailureClassifier;
use anyhow::Result;
use clap::Args;

use super::output::{emit, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ClassifyArgs {
    /// Failure message; several words are joined with spaces
    #[arg(required = true)]
    pub message: Vec<String>,
}

pub fn cmd_classify(args: ClassifyArgs, output: OutputFormat) -> Result<()> {
    let message = args.message.join(" ");
    let report = FailureClassifier::new().report(&message);
    emit(output, &report, |report| report.category.to_string())
}
