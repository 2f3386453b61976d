//! Root CLI argument definitions (§6.1).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mirror Hugging Face Hub repositories to a local directory, or run the
/// server-mode HTTP/WebSocket surface.
#[derive(Parser)]
#[command(name = "hfmirror")]
#[command(about = "Mirror Hugging Face Hub repositories to local disk")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared repository-selection flags for `download` and `plan`.
#[derive(clap::Args, Debug, Clone)]
pub struct RepoArgs {
    /// Repository id, e.g. `owner/name`.
    pub repo: String,

    /// Revision (branch, tag, or commit) to mirror.
    #[arg(long, default_value = "main")]
    pub revision: String,

    /// Treat `repo` as a dataset rather than a model.
    #[arg(long)]
    pub dataset: bool,

    /// Only include LFS files whose basename contains one of these substrings.
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Drop files whose basename contains one of these substrings.
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,

    /// Organize filtered files under a subdirectory named after their filter match.
    #[arg(long)]
    pub append_filter_subdir: bool,

    /// Access token for gated/private repositories.
    #[arg(long, env = "HF_TOKEN")]
    pub token: Option<String>,

    /// Hub endpoint override, for mirrors.
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan and download a repository, printing progress to stdout.
    Download {
        #[command(flatten)]
        repo_args: RepoArgs,

        /// Directory under which the repository is mirrored.
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Dry run: walk the tree and print the resulting plan, without downloading.
    Plan {
        #[command(flatten)]
        repo_args: RepoArgs,

        /// Print the plan as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP/WebSocket server (§6's server-mode surface).
    Serve {
        /// Directory under which mirrored repositories are stored.
        #[arg(long, default_value = ".")]
        output: PathBuf,

        /// Port to listen on.
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Restrict CORS to these origins instead of allowing any (development default).
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn download_parses_repeated_filters() {
        let cli = Cli::parse_from([
            "hfmirror",
            "download",
            "owner/name",
            "--filter",
            "q4_0",
            "--filter",
            "q5_0",
            "--exclude",
            ".md",
        ]);
        let Commands::Download { repo_args, .. } = cli.command else {
            panic!("expected Download");
        };
        assert_eq!(repo_args.filters, vec!["q4_0", "q5_0"]);
        assert_eq!(repo_args.excludes, vec![".md"]);
    }
}
