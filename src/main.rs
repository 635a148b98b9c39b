mod codec;
mod commands;
mod config;
mod delta;
mod error;
mod object;
mod pack;
mod pkt_line;
mod protocol;
mod refs;
mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty Git repository
    Init {
        /// Directory to initialize (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Provide content or type and size information for repository objects
    CatFile {
        /// Show object type
        #[arg(short = 't', conflicts_with = "size_only")]
        type_only: bool,

        /// Show object size
        #[arg(short = 's', conflicts_with = "type_only")]
        size_only: bool,

        /// Pretty-print object's content
        #[arg(short = 'p', conflicts_with_all = ["size_only", "type_only"])]
        pretty_print: bool,

        /// Object hash
        #[arg(id = "object")]
        hash: String,
    },

    /// Compute object ID and optionally create an object from a file
    HashObject {
        /// Actually write the object into the object database
        #[arg(short)]
        write: bool,

        /// Read content from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        #[arg(id = "file", required_unless_present = "stdin")]
        file: Option<String>,
    },

    /// List the contents of a tree object
    LsTree {
        /// Print only entry names
        #[arg(long)]
        name_only: bool,

        tree_ish: String,
    },

    /// Write the working directory to the object store as a tree object
    WriteTree,

    /// Create a commit object from a tree and message
    CommitTree {
        tree: String,

        /// Parent commit sha (may be repeated)
        #[arg(short = 'p')]
        parents: Vec<String>,

        #[arg(short = 'm')]
        message: String,
    },

    /// Clone a repository via the Smart-HTTP v2 packfile protocol
    Clone {
        url: String,
        dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cwd = std::env::current_dir()?;
    let args = Cli::parse();

    match args.command {
        Commands::Init { dir } => commands::init::run(&dir.unwrap_or(cwd)),

        Commands::CatFile { pretty_print: _, type_only, size_only, hash } => {
            commands::cat_file::run(&cwd, &hash, type_only, size_only)
        }

        Commands::HashObject { write, stdin, file } => {
            let sha = commands::hash_object::run(&cwd, file.as_deref().map(std::path::Path::new), stdin, write)?;
            println!("{sha}");
            Ok(())
        }

        Commands::LsTree { name_only, tree_ish } => commands::ls_tree::run(&cwd, &tree_ish, name_only),

        Commands::WriteTree => {
            let sha = commands::write_tree::run(&cwd)?;
            println!("{sha}");
            Ok(())
        }

        Commands::CommitTree { tree, parents, message } => {
            let sha = commands::commit_tree::run(&cwd, &tree, &parents, &message)?;
            println!("{sha}");
            Ok(())
        }

        Commands::Clone { url, dir } => commands::clone::run(&url, dir),
    }
}
