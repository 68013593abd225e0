//! `docunit inspect` command implementation.

use clap::Args;
use docunit_converter::{ConverterError, DirectorySource, DocumentSource};
use docunit_elements::convert;

use super::{ProjectArgs, parser_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the inspect command.
#[derive(Args)]
pub(crate) struct InspectArgs {
    /// Source file, relative to the source directory.
    file: String,

    #[command(flatten)]
    project: ProjectArgs,
}

impl InspectArgs {
    /// Print the intermediate form of a source file as JSON. Nothing is stored.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.project.load_config()?;
        let source = DirectorySource::new(&config.source_resolved.dir);

        let raw = source.load(&self.file).map_err(ConverterError::from)?;
        let document = convert(&raw, &parser_options(&config)).map_err(ConverterError::from)?;
        output.result(&serde_json::to_string_pretty(&document)?);
        Ok(())
    }
}
