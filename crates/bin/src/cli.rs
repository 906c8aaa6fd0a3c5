use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "watchreg")]
#[command(about = "Registry of objects under civic monitoring")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Config file (defaults to the user config dir when present)
	#[arg(long, short = 'c', global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Socket path for IPC (overrides config)
	#[arg(long, short = 's', global = true, value_name = "PATH")]
	pub socket: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run the registry daemon
	Serve,
	/// Check whether an object is already under monitoring
	Lookup {
		/// Object name or a fragment of it
		#[arg(required = true, num_args = 1..)]
		text: Vec<String>,
	},
	/// Replace the registry with an .xlsx, .xls, .csv or .tsv table
	Replace {
		/// Table to upload
		file: PathBuf,
	},
	/// Show whether a table is loaded and how many records it holds
	Status,
	/// Show the identity the daemon sees for this user
	Whoami,
}

impl Command {
	/// Multi-word lookups are joined the way a chat message would arrive.
	pub fn lookup_text(text: &[String]) -> String {
		text.join(" ")
	}
}
