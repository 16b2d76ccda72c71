//! `weave resolve` command implementation.

use clap::Args;
use weave_include::LoadOutput;

use super::LoadArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Print each document's dependencies instead of its markup.
    #[arg(long)]
    deps: bool,
}

impl ResolveArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let loader = self.load.loader(output)?;
        let locators = self.load.locators();

        let mut failed = 0;
        for result in loader.load_many(&locators) {
            match result {
                Ok(resolved) => {
                    report(output, &resolved);
                    if self.deps {
                        for dependency in &resolved.dependencies {
                            output.data(dependency.as_str())?;
                        }
                    } else {
                        output.data(&resolved.xml)?;
                    }
                }
                Err(err) => {
                    output.error(&err.to_string());
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} documents could not be loaded",
                locators.len()
            )));
        }
        Ok(())
    }
}

fn report(output: &Output, resolved: &LoadOutput) {
    let origin = if resolved.cached { " (cached)" } else { "" };
    output.info(&format!("Resolved {}{origin}", resolved.locator));
    for diagnostic in resolved.diagnostics.iter().filter(|d| !d.nested) {
        output.warning(&format!("  {diagnostic}"));
    }
}
