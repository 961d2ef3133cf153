//! Command-line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Terminal client for the AutoPilot project generator
///
/// Turns four specification spreadsheets (features, APIs, database, tech
/// stack) into a generated project, then lets you browse and optimize the
/// result.
#[derive(Parser, Debug, Clone)]
#[command(name = "autopilot")]
#[command(version)]
pub struct Args {
    /// Base URL of the generation API
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Path to a YAML settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Status polling period in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check that the API is reachable
    Health,

    /// Create a project without uploading anything
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        tech_stack: String,
    },

    /// Upload specification spreadsheets to an existing project
    ///
    /// Uploading a kind again replaces the earlier file.
    Upload {
        project_id: String,
        #[arg(long, value_name = "XLSX")]
        features: Option<PathBuf>,
        #[arg(long, value_name = "XLSX")]
        apis: Option<PathBuf>,
        #[arg(long, value_name = "XLSX")]
        database: Option<PathBuf>,
        #[arg(long, value_name = "XLSX")]
        tech_stack: Option<PathBuf>,
    },

    /// Start generation for an uploaded project
    Generate { project_id: String },

    /// Create a project, upload all four spreadsheets and start generation
    New {
        #[arg(long)]
        name: String,
        #[arg(long)]
        tech_stack: String,
        #[arg(long, value_name = "XLSX")]
        features: PathBuf,
        #[arg(long, value_name = "XLSX")]
        apis: PathBuf,
        #[arg(long, value_name = "XLSX")]
        database: PathBuf,
        #[arg(long = "tech-stack-file", value_name = "XLSX")]
        tech_stack_file: PathBuf,
        /// Return once generation has been requested
        #[arg(long)]
        no_watch: bool,
    },

    /// Show a project's status
    Status {
        project_id: String,
        /// Keep polling and print each change until generation finishes
        #[arg(long)]
        watch: bool,
    },

    /// Print the generated file tree
    Tree { project_id: String },

    /// Print one generated file
    Cat { project_id: String, path: String },

    /// Optimize generated files
    Optimize {
        project_id: String,
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List recently created projects
    Recent,

    /// Open the interactive status and files screens
    Open { project_id: String },
}
