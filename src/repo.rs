use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{Config, REPOSITORY_FORMAT_VERSION};
use crate::error::{Error, IoResultExt, Result};

/// directory holding the repository inside a work tree
pub const REPO_DIR: &str = ".tig";

const DEFAULT_DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

const DEFAULT_HEAD: &str = "ref: refs/heads/master\n";

/// a tig repository
pub struct Repo {
    path: PathBuf,
    config: Config,
}

impl Repo {
    /// initialize a new repository at the given path
    ///
    /// the path may be missing or an empty directory.
    pub fn init(path: &Path) -> Result<Self> {
        if path.exists() && !path.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }
        if path.join("config.toml").exists() {
            return Err(Error::RepoExists(path.to_path_buf()));
        }
        if path.is_dir() && std::fs::read_dir(path).with_path(path)?.next().is_some() {
            return Err(Error::DirectoryNotEmpty(path.to_path_buf()));
        }

        let repo = Self {
            path: path.to_path_buf(),
            config: Config::default(),
        };

        // create directory structure
        for dir in [
            repo.objects_path(),
            repo.refs_path(),
            repo.tags_path(),
            repo.tmp_path(),
        ] {
            std::fs::create_dir_all(&dir).with_path(&dir)?;
        }

        let description = repo.path.join("description");
        std::fs::write(&description, DEFAULT_DESCRIPTION).with_path(&description)?;
        let head = repo.head_path();
        std::fs::write(&head, DEFAULT_HEAD).with_path(&head)?;

        repo.config.save(&repo.config_path())?;

        info!(path = %path.display(), "initialized repository");

        Ok(repo)
    }

    /// open an existing repository
    pub fn open(path: &Path) -> Result<Self> {
        let config_path = path.join("config.toml");
        if !config_path.exists() {
            return Err(Error::NoRepo(path.to_path_buf()));
        }

        let config = Config::load(&config_path)?;
        let version = config.core.repository_format_version;
        if version != REPOSITORY_FORMAT_VERSION {
            return Err(Error::UnsupportedFormatVersion(version));
        }

        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    /// find the repository governing `start`
    ///
    /// checks `start` itself and its `.tig` subdirectory, then each parent.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = start.canonicalize().with_path(start)?;

        for dir in start.ancestors() {
            for candidate in [dir.join(REPO_DIR), dir.to_path_buf()] {
                if candidate.join("config.toml").is_file() && candidate.join("objects").is_dir() {
                    debug!(path = %candidate.display(), "discovered repository");
                    return Self::open(&candidate);
                }
            }
        }

        Err(Error::NoRepo(start))
    }

    /// repository root path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// path to config.toml
    pub fn config_path(&self) -> PathBuf {
        self.path.join("config.toml")
    }

    /// path to objects directory
    pub fn objects_path(&self) -> PathBuf {
        self.path.join("objects")
    }

    /// path to refs directory
    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs/heads")
    }

    /// path to tags directory
    pub fn tags_path(&self) -> PathBuf {
        self.path.join("refs/tags")
    }

    /// path to HEAD
    pub fn head_path(&self) -> PathBuf {
        self.path.join("HEAD")
    }

    /// path to tmp directory (for atomic writes)
    pub fn tmp_path(&self) -> PathBuf {
        self.path.join("tmp")
    }
}
