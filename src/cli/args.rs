//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

/// Tenancy data model: tenants, hierarchical tenant groups and supervisors
#[derive(Parser, Debug)]
#[command(name = "tenancy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Dataset file (overrides config)
    #[arg(long, global = true, env = "TENANCY_DATA_FILE", value_hint = ValueHint::FilePath)]
    pub data_file: Option<PathBuf>,

    /// Directory holding a local .tenancy.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the tenant group hierarchy
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        command: TenantCommands,
    },

    /// Manage supervisors and their tenants
    Supervisor {
        #[command(subcommand)]
        command: SupervisorCommands,
    },

    /// Write records as CSV to stdout
    Export {
        #[arg(value_enum)]
        kind: ExportKind,
    },

    /// Show recorded changes, newest last
    Audit {
        /// Only show the last N entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Groups,
    Tenants,
    Supervisors,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create a tenant group
    Add {
        name: String,
        /// URL-friendly key (default: derived from name)
        #[arg(short, long)]
        slug: Option<String>,
        /// Slug of the parent group (default: new root)
        #[arg(short, long)]
        parent: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Change name, slug or description
    Edit {
        slug: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        new_slug: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Attach a group (with its subtree) to another parent
    Move {
        slug: String,
        /// Slug of the new parent
        #[arg(short, long, conflicts_with = "root", required_unless_present = "root")]
        parent: Option<String>,
        /// Make the group a root
        #[arg(long)]
        root: bool,
    },

    /// Delete a group
    Delete {
        slug: String,
        /// Delete all descendants too (default from config: cascade_delete)
        #[arg(long)]
        cascade: bool,
    },

    /// List groups in tree order
    List {
        /// Show cumulative tenant counts
        #[arg(short, long)]
        counts: bool,
    },

    /// Print the group forest
    Tree,

    /// Show a group with its ancestry, children and tenants
    Show { slug: String },

    /// Recompute tree bookkeeping from parent links
    Rebuild,

    /// Verify tree bookkeeping
    Check,
}

#[derive(Subcommand, Debug)]
pub enum TenantCommands {
    /// Create a tenant
    Add {
        name: String,
        #[arg(short, long)]
        slug: Option<String>,
        /// Slug of the tenant group
        #[arg(short, long)]
        group: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        comments: String,
        /// Tag, repeatable
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Create a tenant with group and description of an existing one
    Clone {
        /// Slug of the tenant to copy from
        source: String,
        name: String,
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Change tenant fields
    Edit {
        slug: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        new_slug: Option<String>,
        /// Slug of the new group
        #[arg(short, long, conflicts_with = "no_group")]
        group: Option<String>,
        /// Remove the tenant from its group
        #[arg(long)]
        no_group: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        comments: Option<String>,
        /// Replace all tags, repeatable
        #[arg(short, long = "tag")]
        tags: Option<Vec<String>>,
    },

    /// Delete a tenant
    Delete { slug: String },

    /// List tenants
    List {
        /// Only tenants of this group
        #[arg(short, long)]
        group: Option<String>,
        /// Include tenants of descendant groups (requires --group)
        #[arg(short, long, requires = "group")]
        recursive: bool,
    },

    /// Show a tenant
    Show { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum SupervisorCommands {
    /// Create a supervisor
    Add {
        full_name: String,
        /// Short identifier, at most 8 characters
        #[arg(long)]
        sid: String,
        #[arg(short, long)]
        slug: Option<String>,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        phone: String,
        #[arg(long)]
        comments: String,
        #[arg(long)]
        inactive: bool,
        /// Slug of a tenant to supervise, repeatable
        #[arg(short, long = "tenant")]
        tenants: Vec<String>,
    },

    /// Change supervisor fields
    Edit {
        slug: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        sid: Option<String>,
        #[arg(long)]
        new_slug: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        comments: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },

    /// Add tenants to a supervisor
    Assign {
        slug: String,
        #[arg(required = true)]
        tenants: Vec<String>,
    },

    /// Remove tenants from a supervisor
    Unassign {
        slug: String,
        #[arg(required = true)]
        tenants: Vec<String>,
    },

    /// Delete a supervisor
    Delete { slug: String },

    /// List supervisors
    List {
        /// Only supervisors of this tenant
        #[arg(short, long)]
        tenant: Option<String>,
    },

    /// Show a supervisor
    Show { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
