//! `docunit border-numbers` subcommand group.

use clap::{Args, Subcommand};
use docunit_store::{ConvertedElement, DocumentKey};
use uuid::Uuid;

use super::{DocumentArgs, ProjectArgs, Service, open_service};
use crate::error::CliError;
use crate::output::Output;

/// Border-number editing commands.
#[derive(Subcommand)]
pub(crate) enum BorderNumbersCommand {
    /// Promote the paragraphs starting at an element into border numbers.
    Add(StartArgs),
    /// Demote border numbers, from an element on or all of them.
    Remove(OptionalStartArgs),
    /// Demote one border number and renumber the ones after it.
    RemoveOne(StartArgs),
    /// Merge a border number into the one before it.
    Join(StartArgs),
}

/// A document and the element an edit starts at.
#[derive(Args)]
pub(crate) struct StartArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// Id of the element the edit starts at.
    #[arg(long)]
    start: Uuid,

    #[command(flatten)]
    project: ProjectArgs,
}

/// A document and, optionally, the element an edit starts at.
#[derive(Args)]
pub(crate) struct OptionalStartArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// Id of the first element to edit (default: the whole document).
    #[arg(long)]
    start: Option<Uuid>,

    #[command(flatten)]
    project: ProjectArgs,
}

impl BorderNumbersCommand {
    /// Execute the border-numbers subcommand.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let (document, project) = match &self {
            Self::Add(args) | Self::RemoveOne(args) | Self::Join(args) => {
                (&args.document, &args.project)
            }
            Self::Remove(args) => (&args.document, &args.project),
        };
        let config = project.load_config()?;
        let service = open_service(&config).await?;
        let key = document.key();

        // Edits apply to the stored sequence; convert first if nothing is stored yet.
        service.converted_elements(&key).await?;
        let rows = self.apply(&service, &key).await?;

        output.rows(&rows);
        output.success(&format!("Updated {key}"));
        Ok(())
    }

    async fn apply(
        &self,
        service: &Service,
        key: &DocumentKey,
    ) -> Result<Vec<ConvertedElement>, CliError> {
        let rows = match self {
            Self::Add(args) => service.add_border_numbers(key, args.start).await?,
            Self::Remove(args) => service.remove_border_numbers(key, args.start).await?,
            Self::RemoveOne(args) => service.remove_border_number(key, args.start).await?,
            Self::Join(args) => service.join_border_numbers(key, args.start).await?,
        };
        Ok(rows)
    }
}
