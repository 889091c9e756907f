use std::error::Error;
use std::fmt;
use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::cli::{Commands, DocumentSubcommands, ProjectSubcommands};
use crate::store::{Store, StoreError};

const STDIN_MARKER: &str = "-";

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Store(StoreError),
    InvalidArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(err) => write!(f, "I/O error: {}", err),
            CliError::Json(err) => write!(f, "invalid JSON input: {}", err),
            CliError::Store(err) => write!(f, "{}", err),
            CliError::InvalidArgument(message) => write!(f, "{}", message),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            CliError::Json(err) => Some(err),
            CliError::Store(err) => Some(err),
            CliError::InvalidArgument(_) => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        CliError::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        CliError::Json(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        CliError::Store(value)
    }
}

pub fn run_command(store: &Store, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Project(args) => run_project_command(store, args.command)?,
        Commands::Features(args) => match args.command {
            DocumentSubcommands::Get => print_json(&store.features()?)?,
            DocumentSubcommands::Put(put) => {
                print_json(&store.put_features(read_document(&put.file)?)?)?
            }
        },
        Commands::Clients(args) => match args.command {
            DocumentSubcommands::Get => print_json(&store.clients()?)?,
            DocumentSubcommands::Put(put) => {
                print_json(&store.put_clients(read_document(&put.file)?)?)?
            }
        },
        Commands::Featured(args) => match args.command {
            DocumentSubcommands::Get => print_json(&store.featured()?)?,
            DocumentSubcommands::Put(put) => {
                print_json(&store.put_featured(read_document(&put.file)?)?)?
            }
        },
        Commands::Palette(args) => match args.command {
            DocumentSubcommands::Get => print_json(&store.palette()?)?,
            DocumentSubcommands::Put(put) => {
                print_json(&store.put_palette(read_document(&put.file)?)?)?
            }
        },
        Commands::Cleanup => print_json(&store.cleanup_invalid_features()?)?,
        Commands::Reindex => {
            let written = store.reindex()?;
            print_json(&json!({
                "index": store.index_path().display().to_string(),
                "projects": written,
            }))?;
        }
        Commands::Export(args) => {
            let document = store.export_all()?;
            match args.out {
                Some(path) => {
                    let mut payload = serde_json::to_vec_pretty(&document)?;
                    payload.push(b'\n');
                    std::fs::write(&path, payload)?;
                    print_json(&json!({
                        "out": path.display().to_string(),
                        "projects": document.projects.len(),
                        "clientLogos": document.client_logos.len(),
                    }))?;
                }
                None => print_json(&document)?,
            }
        }
        Commands::Import(args) => {
            let summary = store.import_all(read_document(&args.file)?)?;
            print_json(&summary)?;
        }
        Commands::DeleteAll(args) => {
            if !args.yes {
                return Err(CliError::InvalidArgument(
                    "delete-all removes every project; pass --yes to confirm".to_string(),
                ));
            }
            store.delete_all()?;
            print_json(&json!({ "deleted": true }))?;
        }
    }
    Ok(())
}

fn run_project_command(store: &Store, command: ProjectSubcommands) -> Result<(), CliError> {
    match command {
        ProjectSubcommands::Ls(args) => {
            let projects = if args.active {
                store.list_active_projects()
            } else {
                store.list_projects()
            };
            if args.json {
                print_json(&projects)?;
            } else if projects.is_empty() {
                println!("no projects");
            } else {
                for project in projects {
                    let marker = if project.active { "" } else { " (inactive)" };
                    println!(
                        "{}\t{}\t{}{}",
                        project.id, project.project_type, project.name, marker
                    );
                }
            }
        }
        ProjectSubcommands::Show(args) => {
            let project = store
                .get_project(&args.id)?
                .ok_or(StoreError::NotFound(args.id))?;
            print_json(&project)?;
        }
        ProjectSubcommands::New(args) => {
            let created = store.create_project(read_document(&args.file)?)?;
            print_json(&created)?;
        }
        ProjectSubcommands::Update(args) => {
            let updated = store.update_project(&args.id, read_document(&args.patch)?)?;
            print_json(&updated)?;
        }
        ProjectSubcommands::Rm(args) => {
            let deleted = store.delete_project(&args.id)?;
            print_json(&json!({ "id": args.id, "deleted": deleted }))?;
        }
    }
    Ok(())
}

/// Reads a JSON document from `source`, where `-` means stdin.
fn read_document<T: DeserializeOwned>(source: &str) -> Result<T, CliError> {
    let raw = if source == STDIN_MARKER {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(source)?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
