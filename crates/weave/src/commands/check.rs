//! `weave check` command implementation.

use clap::Args;

use super::LoadArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Also report directives that failed inside included content.
    #[arg(long)]
    nested: bool,
}

impl CheckArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let loader = self.load.loader(output)?;
        let locators = self.load.locators();

        let mut problems = 0;
        for result in loader.load_many(&locators) {
            match result {
                Ok(resolved) => {
                    let mut clean = true;
                    for diagnostic in &resolved.diagnostics {
                        if diagnostic.nested {
                            if self.nested {
                                output.warning(&format!("{diagnostic} (nested)"));
                            }
                            continue;
                        }
                        output.error(&diagnostic.to_string());
                        clean = false;
                    }
                    if clean {
                        output.success(&format!("{}: ok", resolved.locator));
                    } else {
                        problems += 1;
                    }
                }
                Err(err) => {
                    output.error(&err.to_string());
                    problems += 1;
                }
            }
        }

        if problems > 0 {
            return Err(CliError::Validation(format!(
                "{problems} of {} documents have unresolved includes",
                locators.len()
            )));
        }
        output.success(&format!("All {} documents resolved", locators.len()));
        Ok(())
    }
}
