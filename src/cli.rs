// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "berth")]
#[command(about = "Deploy Marathon and Kubernetes workloads to Azure Container Service")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result and errors
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new berth.yml configuration file
    Init {
        /// Workload name (default: my-app)
        #[arg(short, long)]
        workload: Option<String>,

        /// Orchestrator: marathon or kubernetes
        #[arg(short, long)]
        orchestrator: Option<String>,

        /// Overwrite an existing berth.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy the workload and expose its ports
    Deploy {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,
    },

    /// Show the firewall and load balancer rules a deploy would add
    Plan {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,
    },
}
