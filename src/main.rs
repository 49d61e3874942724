use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use pom_patcher::config::{
    apply_updates, load_from_path, plan_updates, ApplicationError, Metadata, Target, UpdateConfig,
    UpdateDefinition, UpdateOutcome, UpdateResult,
};
use pom_patcher::log::TracingLog;
use pom_patcher::model::{DiscoveryOptions, FsSource, MissingModulePolicy, ModelTree};
use pom_patcher::version::is_version_overlap;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pom-patcher")]
#[command(about = "Location-preserving pom.xml updates across module hierarchies", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TreeArgs {
    /// Root pom.xml or the directory holding it
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Abort when a declared module cannot be read
    #[arg(long)]
    strict: bool,
}

impl TreeArgs {
    fn options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            missing_modules: if self.strict {
                MissingModulePolicy::Fail
            } else {
                MissingModulePolicy::Warn
            },
        }
    }
}

#[derive(Args)]
struct WriteArgs {
    /// Show what would change without writing files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show a line diff of every changed descriptor
    #[arg(short, long)]
    diff: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the module hierarchy in traversal order
    Tree {
        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Resolve a property through the parent chain
    Property {
        name: String,

        /// Start resolution at the module with this artifactId
        #[arg(short, long)]
        module: Option<String>,

        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Rewrite a property where it is defined
    SetProperty {
        name: String,
        value: String,

        #[arg(short, long)]
        module: Option<String>,

        /// Only rewrite when the current value overlaps this range
        #[arg(long)]
        only_if: Option<String>,

        #[command(flatten)]
        tree: TreeArgs,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Rewrite a module's project version (or its parent version)
    SetVersion {
        value: String,

        #[arg(short, long)]
        module: Option<String>,

        /// Rewrite `<parent><version>` instead of `<version>`
        #[arg(long)]
        parent: bool,

        #[command(flatten)]
        tree: TreeArgs,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Check whether two versions or ranges share a version
    Overlap { left: String, right: String },

    /// Apply a TOML update plan
    Apply {
        config: PathBuf,

        /// Root pom.xml or the directory holding it [default: the plan's
        /// `meta.root`, else "."]
        #[arg(short, long)]
        root: Option<PathBuf>,

        #[command(flatten)]
        write: WriteArgs,
    },
}

fn setup_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Tree { tree } => cmd_tree(&tree),

        Commands::Property { name, module, tree } => cmd_property(&name, module.as_deref(), &tree),

        Commands::SetProperty {
            name,
            value,
            module,
            only_if,
            tree,
            write,
        } => {
            let update = UpdateDefinition {
                id: format!("set-property:{name}"),
                target: Target::Property { name },
                value,
                only_if,
                module,
            };
            run_single(update, &tree, &write)
        }

        Commands::SetVersion {
            value,
            module,
            parent,
            tree,
            write,
        } => {
            let target = if parent {
                Target::ParentVersion
            } else {
                Target::ProjectVersion
            };
            let update = UpdateDefinition {
                id: format!("set-version:{value}"),
                target,
                value,
                only_if: None,
                module,
            };
            run_single(update, &tree, &write)
        }

        Commands::Overlap { left, right } => cmd_overlap(&left, &right),

        Commands::Apply {
            config,
            root,
            write,
        } => cmd_apply(&config, root, &write),
    }
}

fn load_tree(root: &Path, options: &DiscoveryOptions) -> Result<ModelTree> {
    ModelTree::load(root, options, &FsSource, &TracingLog)
        .with_context(|| format!("failed to load module tree from {}", root.display()))
}

fn cmd_tree(args: &TreeArgs) -> Result<()> {
    let tree = load_tree(&args.root, &args.options())?;

    for (id, node) in tree.iter() {
        let indent = "  ".repeat(tree.depth(id));
        println!(
            "{}{} {}",
            indent,
            node.model().coordinates().bold(),
            format!("[{}]", node.model().packaging()).dimmed()
        );
        println!("{}  {}", indent, node.path().display().to_string().dimmed());
    }

    println!();
    println!("{} descriptors", tree.len());
    Ok(())
}

fn cmd_property(name: &str, module: Option<&str>, args: &TreeArgs) -> Result<()> {
    let tree = load_tree(&args.root, &args.options())?;
    let start = match module {
        Some(artifact_id) => tree
            .find_by_artifact_id(artifact_id)
            .with_context(|| format!("no module with artifactId '{artifact_id}'"))?,
        None => tree.root(),
    };

    match tree.find_property(name, start) {
        Some(owner) => {
            let node = tree.node(owner);
            let value = tree.property_value(name, owner).unwrap_or_default();
            println!("{} = {}", name.bold(), value.green());
            println!(
                "  defined in {} ({})",
                node.model().coordinates(),
                node.path().display()
            );
            Ok(())
        }
        None => {
            eprintln!("{} property '{}' is not defined", "✗".red(), name);
            if let Some(hint) = tree.suggest_property(name, start) {
                eprintln!("  did you mean '{}'?", hint.yellow());
            }
            std::process::exit(1);
        }
    }
}

fn cmd_overlap(left: &str, right: &str) -> Result<()> {
    if is_version_overlap(left, right)? {
        println!("{} '{}' and '{}' overlap", "✓".green(), left, right);
        Ok(())
    } else {
        println!("{} '{}' and '{}' do not overlap", "✗".red(), left, right);
        std::process::exit(1);
    }
}

fn run_single(update: UpdateDefinition, args: &TreeArgs, write: &WriteArgs) -> Result<()> {
    let config = UpdateConfig {
        meta: Metadata {
            missing_modules: args.options().missing_modules,
            ..Metadata::default()
        },
        updates: vec![update],
    };
    config.validate()?;
    run_config(&config, &args.root, write)
}

fn cmd_apply(config_path: &Path, root: Option<PathBuf>, write: &WriteArgs) -> Result<()> {
    println!("Loading updates from {}...", config_path.display());
    let config = load_from_path(config_path)?;
    if !config.meta.name.is_empty() {
        println!("Plan: {}", config.meta.name.bold());
    }
    let root = root
        .or_else(|| config.meta.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    run_config(&config, &root, write)
}

fn run_config(config: &UpdateConfig, root: &Path, write: &WriteArgs) -> Result<()> {
    let options = DiscoveryOptions {
        missing_modules: config.meta.missing_modules,
    };
    let mut tree = load_tree(root, &options)?;
    let before = tree.clone();

    let results = if write.dry_run {
        println!("{}", "  [DRY RUN - showing what would be applied]".cyan());
        plan_updates(config, &mut tree, &TracingLog)
    } else {
        apply_updates(config, &mut tree, &TracingLog)
    };

    let failed = report(&results, write.dry_run);

    if write.diff {
        for ((_, old), (_, new)) in before.iter().zip(tree.iter()) {
            if old.document().text() != new.document().text() {
                display_diff(new.path(), old.document().text(), new.document().text());
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Print one line per result followed by a summary; returns the failure count.
fn report(results: &[UpdateOutcome], dry_run: bool) -> usize {
    let mut total_applied = 0;
    let mut total_already_set = 0;
    let mut total_skipped = 0;
    let mut total_failed = 0;

    for (update_id, result) in results {
        match result {
            Ok(UpdateResult::Applied { file }) => {
                let verb = if dry_run { "Would apply to" } else { "Applied to" };
                println!("{} {}: {} {}", "✓".green(), update_id, verb, file.display());
                total_applied += 1;
            }
            Ok(UpdateResult::AlreadySet { file }) => {
                println!(
                    "{} {}: Already set in {}",
                    "⊙".yellow(),
                    update_id,
                    file.display()
                );
                total_already_set += 1;
            }
            Ok(UpdateResult::Skipped { reason }) => {
                println!("{} {}: Skipped ({})", "⊘".cyan(), update_id, reason);
                total_skipped += 1;
            }
            Ok(UpdateResult::Failed { file, reason }) => {
                eprintln!("{} {}: Failed - {}", "✗".red(), update_id, reason);
                eprintln!("  File: {}", file.display());
                total_failed += 1;
            }
            Err(e) => {
                eprintln!("{} {}: Error - {}", "✗".red(), update_id, e);
                total_failed += 1;

                if let ApplicationError::Xml { file, .. } = e {
                    eprintln!("  {}", "Edit rejected: result would not be well-formed".red());
                    eprintln!("  File: {}", file.display());
                }
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!("  {} already set", format!("{}", total_already_set).yellow());
    println!("  {} skipped", format!("{}", total_skipped).cyan());
    println!("  {} failed", format!("{}", total_failed).red());

    total_failed
}

/// Show a line diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (updated)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
