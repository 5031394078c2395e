//! # Rolegraph CLI
//!
//! Inspect a role definition file and resolve principals against it.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `ROLES_FILE` - role definition file (default: roles.yml), overridden by `--roles`
//! - `RUST_LOG` - log filter (default: info)

use anyhow::Context;
use clap::{Parser, Subcommand};
use rolegraph::{BackendGroups, Membership, Roles, RolesConfig};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rolegraph", version, about = "Role hierarchy inspection and resolution")]
struct Cli {
    /// Role definition file
    #[arg(long, global = true, value_name = "PATH")]
    roles: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the definitions and print model statistics
    Check,

    /// Print the inferred role forest as YAML
    DumpNested,

    /// Print the flattened role table as YAML
    DumpFlattened,

    /// Resolve a principal's groups into roles
    Resolve {
        /// Group held by the principal, as BACKEND:GROUP (repeatable)
        #[arg(long = "group", value_name = "BACKEND:GROUP", value_parser = parse_group)]
        groups: Vec<(String, String)>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a role's display name and group requirements
    Groups {
        /// Role id
        role: String,
    },
}

/// Resolution output
#[derive(Debug, Serialize)]
struct Resolution {
    #[serde(flatten)]
    membership: Membership,
    is_admin: bool,
}

fn parse_group(value: &str) -> Result<(String, String), String> {
    match value.split_once(':') {
        Some((backend, group)) if !backend.is_empty() && !group.is_empty() => {
            Ok((backend.to_string(), group.to_string()))
        }
        _ => Err(format!("expected BACKEND:GROUP, got '{}'", value)),
    }
}

fn print_groups(groups: &BackendGroups) {
    for (backend, names) in groups {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        println!("  {}: {}", backend, names.join(", "));
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RolesConfig::from_env().with_roles_file(cli.roles);

    // Logs go to stderr so dumps stay pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("rolegraph v{}", rolegraph::VERSION);

    let roles = Roles::load(&config.roles_file).with_context(|| {
        format!(
            "failed to load role definitions from {}",
            config.roles_file.display()
        )
    })?;

    match cli.command {
        Command::Check => {
            let stats = roles.stats();
            println!("{}: OK", roles.source());
            println!("  roles:       {}", stats.roles);
            println!("  backends:    {}", stats.backends);
            println!("  roots:       {}", stats.roots);
            println!("  edges:       {}", stats.edges);
            println!("  admin roles: {}", stats.admin_roles);
        }
        Command::DumpNested => print!("{}", roles.dump_nested()?),
        Command::DumpFlattened => print!("{}", roles.dump_flattened()?),
        Command::Resolve { groups, json } => {
            let mut principal = BackendGroups::new();
            for (backend, group) in groups {
                principal.entry(backend).or_default().insert(group);
            }

            let membership = roles.resolve(&principal);
            let is_admin = roles.is_admin(&membership.roles);

            if json {
                let resolution = Resolution {
                    membership,
                    is_admin,
                };
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                let list = |ids: &BTreeSet<String>| {
                    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
                };
                println!("roles:     {}", list(&membership.roles));
                println!("ancestors: {}", list(&membership.ancestors));
                println!("admin:     {}", is_admin);
                if !membership.unused_groups.is_empty() {
                    println!("unused groups:");
                    print_groups(&membership.unused_groups);
                }
            }
        }
        Command::Groups { role } => {
            let flattened = roles.role(&role)?;
            println!("{} ({})", role, flattened.display_name);
            print_groups(&flattened.backends_groups);
        }
    }

    Ok(())
}
