use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "shopmeta")]
#[command(about = "Customer notes, password restriction and product quicklinks for your store admin")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name for API configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Admin API base URL (overrides profile and SHOPMETA_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage notes on a customer
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
    /// Manage quicklinks on a product
    Quicklinks {
        #[command(subcommand)]
        command: QuicklinksCommands,
    },
    /// Show or change whether a customer may change their password
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Store the admin API token for a profile
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// Customer to operate on, by id or by admin path.
#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct CustomerTarget {
    /// Customer ID
    #[arg(long, value_name = "ID")]
    pub customer: Option<String>,
    /// Admin path containing the customer, e.g. /a/customers/cus_123
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
}

/// Product to operate on, by id or by admin path.
#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct ProductTarget {
    /// Product ID
    #[arg(long, value_name = "ID")]
    pub product: Option<String>,
    /// Admin path containing the product, e.g. /a/products/prod_123
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,
}

#[derive(Subcommand)]
pub enum NotesCommands {
    /// List a customer's notes
    List {
        #[command(flatten)]
        target: CustomerTarget,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a note (content from arguments or stdin)
    #[command(alias = "new")]
    Add {
        #[command(flatten)]
        target: CustomerTarget,
        /// Author recorded on the note (defaults to the profile author)
        #[arg(long, value_name = "NAME")]
        author: Option<String>,
        /// Note content
        content: Vec<String>,
    },
    /// Replace a note's content
    Edit {
        #[command(flatten)]
        target: CustomerTarget,
        /// Note ID
        id: String,
        /// New content
        content: Vec<String>,
    },
    /// Delete a note
    Delete {
        #[command(flatten)]
        target: CustomerTarget,
        /// Note ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum QuicklinksCommands {
    /// List a product's quicklinks
    List {
        #[command(flatten)]
        target: ProductTarget,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a custom link
    Add {
        #[command(flatten)]
        target: ProductTarget,
        /// Link title
        #[arg(long)]
        title: String,
        /// Link target URL or path
        #[arg(long)]
        link: String,
    },
    /// Add a link to another product
    AddProduct {
        #[command(flatten)]
        target: ProductTarget,
        /// ID of the product to link to
        product_id: String,
    },
    /// Add a link to a collection
    AddCollection {
        #[command(flatten)]
        target: ProductTarget,
        /// ID of the collection to link to
        collection_id: String,
    },
    /// Change a quicklink's title or target
    Edit {
        #[command(flatten)]
        target: ProductTarget,
        /// Quicklink ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New link
        #[arg(long)]
        link: Option<String>,
    },
    /// Delete a quicklink
    Delete {
        #[command(flatten)]
        target: ProductTarget,
        /// Quicklink ID
        id: String,
    },
    /// Search products or collections to link to
    Search {
        /// What to search
        #[arg(value_enum)]
        kind: PickerKind,
        /// Search terms (lists everything when omitted)
        query: Vec<String>,
        /// Number of results to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Number of results to skip
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum PasswordCommands {
    /// Show whether the customer may change their password
    Status {
        #[command(flatten)]
        target: CustomerTarget,
    },
    /// Allow the customer to change their password
    Allow {
        #[command(flatten)]
        target: CustomerTarget,
    },
    /// Prevent the customer from changing their password
    Deny {
        #[command(flatten)]
        target: CustomerTarget,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PickerKind {
    Products,
    Collections,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Admin API base URL
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Default author recorded on new notes
        #[arg(long, value_name = "NAME")]
        author: Option<String>,
        /// Admin API request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store an admin API token in the keychain (reads stdin when omitted)
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Admin API token
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
    },
    /// Show whether a token is stored for the profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Remove the stored token
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
