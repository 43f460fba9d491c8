//! tig CLI - content-addressed object store command line interface

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tig::ops::{cat_file, fsck, hash_file, log, ls_tree};
use tig::{Digest, ObjectKind, Repo, Tree, REPO_DIR};

#[derive(Parser)]
#[command(name = "tig")]
#[command(about = "content-addressed object store with git-compatible objects")]
#[command(version)]
struct Cli {
    /// run as if started in this directory
    #[arg(short = 'C', long, default_value = ".", global = true)]
    repo: PathBuf,

    /// log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new, empty repository
    Init {
        /// work tree to create the repository in, relative to -C
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// compute an object digest, optionally storing the object
    HashObject {
        /// file to read
        path: PathBuf,

        /// object type (blob, tree, commit, tag)
        #[arg(short = 't', long = "type", default_value = "blob")]
        object_type: ObjectKind,

        /// write the object into the repository
        #[arg(short, long)]
        write: bool,
    },

    /// show contents of an object
    CatFile {
        /// expected object type (blob, tree, commit, tag)
        object_type: ObjectKind,

        /// object digest
        object: Digest,

        /// pretty-print trees instead of dumping raw bytes
        #[arg(short, long)]
        pretty: bool,
    },

    /// list the contents of a tree (or a commit's tree)
    LsTree {
        /// tree or commit digest
        object: Digest,

        /// recurse into subtrees
        #[arg(short, long)]
        recursive: bool,
    },

    /// show commit history starting at a commit
    Log {
        /// commit digest
        commit: Digest,

        /// maximum number of commits to show
        #[arg(short = 'n', long)]
        max_count: Option<usize>,
    },

    /// verify object integrity and connectivity
    Fsck,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// log to stderr, filtered by TIG_LOG when set
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("TIG_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// repository directory for `init`, resolved against -C
fn init_path(start: &Path, path: &Path) -> PathBuf {
    start.join(path).join(REPO_DIR)
}

fn stdout_write(bytes: &[u8]) -> tig::Result<()> {
    io::stdout()
        .write_all(bytes)
        .map_err(|e| tig::Error::Io {
            path: "stdout".into(),
            source: e,
        })
}

fn run(cli: Cli) -> tig::Result<ExitCode> {
    match cli.command {
        Commands::Init { path } => {
            let repo_path = init_path(&cli.repo, &path);
            Repo::init(&repo_path)?;
            println!("initialized empty tig repository in {}", repo_path.display());
        }

        Commands::HashObject {
            path,
            object_type,
            write,
        } => {
            let repo = if write {
                Some(Repo::discover(&cli.repo)?)
            } else {
                None
            };
            let digest = hash_file(repo.as_ref(), object_type, &path)?;
            println!("{}", digest);
        }

        Commands::CatFile {
            object_type,
            object,
            pretty,
        } => {
            let repo = Repo::discover(&cli.repo)?;
            let payload = cat_file(&repo, &object, Some(object_type))?;

            if pretty && object_type == ObjectKind::Tree {
                let tree = Tree::deserialize(&payload)?;
                for entry in tree.entries() {
                    println!(
                        "{} {} {}\t{}",
                        entry.padded_mode(),
                        entry.kind(),
                        entry.digest,
                        entry.name_str()
                    );
                }
            } else {
                stdout_write(&payload)?;
            }
        }

        Commands::LsTree { object, recursive } => {
            let repo = Repo::discover(&cli.repo)?;
            for entry in ls_tree(&repo, &object, recursive)? {
                println!("{}", entry);
            }
        }

        Commands::Log { commit, max_count } => {
            let repo = Repo::discover(&cli.repo)?;
            let entries = log(&repo, &commit, max_count)?;

            for entry in entries {
                println!("{}", entry);
            }
        }

        Commands::Fsck => {
            let repo = Repo::discover(&cli.repo)?;
            let report = fsck(&repo)?;

            println!("objects checked: {}", report.objects_checked);

            if !report.corrupt_objects.is_empty() {
                println!("\ncorrupt objects:");
                for obj in &report.corrupt_objects {
                    println!("  {}: {}", obj.digest, obj.message);
                }
            }

            if !report.missing_objects.is_empty() {
                println!("\nmissing objects:");
                for obj in &report.missing_objects {
                    println!(
                        "  {} {} (referenced by {})",
                        obj.object_type, obj.digest, obj.referenced_by
                    );
                }
            }

            if report.is_ok() {
                println!("\nrepository is healthy");
            } else {
                println!("\nrepository has issues");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["tig", "hash-object", "-C", "work", "-w", "file.txt"]).unwrap();
        assert_eq!(cli.repo, PathBuf::from("work"));
        assert!(matches!(cli.command, Commands::HashObject { write: true, .. }));
    }

    #[test]
    fn test_repo_flag_before_subcommand() {
        let cli = Cli::try_parse_from(["tig", "-C", "work", "fsck"]).unwrap();
        assert_eq!(cli.repo, PathBuf::from("work"));
    }

    #[test]
    fn test_init_path_follows_repo_flag() {
        assert_eq!(
            init_path(Path::new("work"), Path::new(".")),
            Path::new("work/.tig")
        );
        assert_eq!(
            init_path(Path::new("work"), Path::new("sub")),
            Path::new("work/sub/.tig")
        );
        assert_eq!(
            init_path(Path::new("work"), Path::new("/abs")),
            Path::new("/abs/.tig")
        );
    }
}
