use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "showcase")]
#[command(bin_name = "showcase")]
#[command(version)]
#[command(about = "File-backed catalog store for showcase projects")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'C',
        long,
        env = "SHOWCASE_ROOT",
        default_value = ".",
        help = "Store root that contains catalog/ and the read index."
    )]
    pub root: PathBuf,

    #[arg(
        long,
        env = "SHOWCASE_LOG",
        default_value = "warn",
        help = "Log filter directive written to stderr (e.g. info, showcase=debug)."
    )]
    pub log: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create, inspect, update and remove projects.")]
    Project(ProjectArgs),
    #[command(about = "Read or replace the feature taxonomy.")]
    Features(DocumentArgs),
    #[command(about = "Read or replace the client registry.")]
    Clients(DocumentArgs),
    #[command(about = "Read or replace the featured project ids.")]
    Featured(DocumentArgs),
    #[command(about = "Read or replace the color palette.")]
    Palette(DocumentArgs),
    #[command(about = "Drop feature references the taxonomy no longer defines.")]
    Cleanup,
    #[command(about = "Rebuild the read index from stored projects.")]
    Reindex,
    #[command(about = "Export the whole catalog as one JSON document.")]
    Export(ExportArgs),
    #[command(about = "Replace the whole catalog from an export document.")]
    Import(ImportArgs),
    #[command(about = "Remove every project and reset all config documents.")]
    DeleteAll(DeleteAllArgs),
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ProjectSubcommands {
    #[command(about = "List projects, oldest first.")]
    Ls(ListArgs),
    #[command(about = "Show one project by id.")]
    Show(IdArgs),
    #[command(about = "Create a project from a JSON file (or - for stdin).")]
    New(NewArgs),
    #[command(about = "Apply a partial JSON update to a project.")]
    Update(UpdateArgs),
    #[command(about = "Remove a project and its assets.")]
    Rm(IdArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, help = "Only list projects marked active.")]
    pub active: bool,

    #[arg(long, help = "Print the listing as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Project id.")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct NewArgs {
    #[arg(help = "Path to a JSON project document, or - for stdin.")]
    pub file: String,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(help = "Project id.")]
    pub id: String,

    #[arg(help = "Path to a JSON patch document, or - for stdin.")]
    pub patch: String,
}

#[derive(Debug, Args)]
pub struct DocumentArgs {
    #[command(subcommand)]
    pub command: DocumentSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum DocumentSubcommands {
    #[command(about = "Print the stored document, creating the default if missing.")]
    Get,
    #[command(about = "Replace the stored document.")]
    Put(PutArgs),
}

#[derive(Debug, Args)]
pub struct PutArgs {
    #[arg(help = "Path to the JSON document, or - for stdin.")]
    pub file: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(short = 'o', long, help = "Write the export to this file instead of stdout.")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(help = "Path to an export document, or - for stdin.")]
    pub file: String,
}

#[derive(Debug, Args)]
pub struct DeleteAllArgs {
    #[arg(long, help = "Confirm that every project and config document should be reset.")]
    pub yes: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
