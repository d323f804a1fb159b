use clap::{Parser, Subcommand};
use kiosk::blob::BlobEncoding;
use kiosk::config::BackendChoice;
use kiosk::homepage::Board;
use kiosk::model::ModuleKey;
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" for dev builds
pub fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "kiosk", bin_name = "kiosk", version = get_version())]
#[command(about = "Content store for the kiosk portal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Storage backend (auto, native, web); overrides the config
    #[arg(long, global = true)]
    pub backend: Option<BackendChoice>,

    /// Data directory of the native backend; overrides the config
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data layout and any missing document with its default
    Init,

    /// Show storage, live mode and publish state of every module
    #[command(alias = "st")]
    Status,

    /// Read or write raw documents
    #[command(subcommand)]
    Doc(DocCommands),

    /// Store and fetch files
    #[command(subcommand)]
    Blob(BlobCommands),

    /// Work with a content module
    #[command(alias = "m", subcommand)]
    Module(ModuleCommands),

    /// News and corporate values shown on the homepage
    #[command(alias = "home", subcommand)]
    Homepage(HomepageCommands),

    /// Write a backup of all documents and files
    Export {
        /// Destination directory (defaults to the configured export dir, then the desktop)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Replace all data with a backup
    Import {
        /// Backup file (.tar.gz or .json); nothing happens when omitted
        file: Option<PathBuf>,
    },

    /// Show or hide import/export (hiding enters live mode)
    #[command(subcommand)]
    Transfer(TransferCommands),

    /// Developer tools
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., backend)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Print a document as JSON
    Get { name: String },

    /// Overwrite a document
    Set {
        name: String,

        /// JSON value; read from --file when omitted
        json: Option<String>,

        /// Read the JSON value from a file
        #[arg(short, long, conflicts_with = "json")]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BlobCommands {
    /// Store a file
    Save {
        name: String,

        /// Payload given inline
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        data: Option<String>,

        /// Read the payload from a file, byte for byte
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Encoding of --data (utf8, base64); data: URIs are accepted as base64
        #[arg(short, long, default_value = "utf8")]
        encoding: BlobEncoding,
    },

    /// Print a stored file
    Read {
        name: String,

        #[arg(short, long, default_value = "utf8")]
        encoding: BlobEncoding,

        /// Print as a data: URI
        #[arg(long)]
        data_uri: bool,
    },

    /// Check whether a file exists
    Exists { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    /// List the records of a module
    #[command(alias = "ls")]
    List {
        /// Module (training, faq, flows, procedures, org:<group>, or a ledger key)
        module: ModuleKey,
    },

    /// Add a record, or several from a JSON array
    Add {
        module: ModuleKey,

        /// Record as JSON; read from --file when omitted
        json: Option<String>,

        /// Read the JSON from a file
        #[arg(short, long, conflicts_with = "json")]
        file: Option<PathBuf>,

        /// Attach a document to a training or procedure record
        #[arg(short, long)]
        attach: Option<PathBuf>,
    },

    /// Delete a record by id (org groups use the group id)
    #[command(alias = "rm")]
    Delete { module: ModuleKey, id: String },

    /// Publish a module; it cannot be edited afterwards
    Publish { module: ModuleKey },

    /// Delete all content of a module and unpublish it
    Reset { module: ModuleKey },
}

#[derive(Subcommand, Debug)]
pub enum HomepageCommands {
    /// List the items of a board (news, values)
    #[command(alias = "ls")]
    List { board: Board },

    /// Add an unpublished item
    Add {
        board: Board,
        title: String,

        /// Display date (defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Extra fields as a JSON object
        #[arg(long)]
        extra: Option<String>,

        /// Image for a news item
        #[arg(short, long)]
        attach: Option<PathBuf>,
    },

    /// Delete an item
    #[command(alias = "rm")]
    Delete { board: Board, id: String },

    /// Publish every pending item on both boards
    Publish,
}

#[derive(Subcommand, Debug)]
pub enum TransferCommands {
    /// Show import/export again
    Show,
    /// Hide import/export and enter live mode
    Hide,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Unpublish everything and leave live mode; content is kept
    Clear {
        /// Developer secret
        #[arg(long)]
        secret: String,
    },
}
