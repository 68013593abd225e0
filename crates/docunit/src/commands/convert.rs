//! `docunit convert` and `docunit reconvert` command implementations.

use clap::Args;

use super::{DocumentArgs, ProjectArgs, open_service};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    #[command(flatten)]
    document: DocumentArgs,

    #[command(flatten)]
    project: ProjectArgs,
}

impl ConvertArgs {
    /// Print the stored sequence, converting the source on first use.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.project.load_config()?;
        let service = open_service(&config).await?;
        let key = self.document.key();

        let rows = service.converted_elements(&key).await?;
        output.rows(&rows);
        Ok(())
    }
}

/// Arguments for the reconvert command.
#[derive(Args)]
pub(crate) struct ReconvertArgs {
    #[command(flatten)]
    document: DocumentArgs,

    #[command(flatten)]
    project: ProjectArgs,
}

impl ReconvertArgs {
    /// Convert the source again, discarding stored edits.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.project.load_config()?;
        let service = open_service(&config).await?;
        let key = self.document.key();

        let rows = service.reconvert_elements(&key).await?;
        output.rows(&rows);
        output.success(&format!("Reconverted {key}"));
        Ok(())
    }
}
