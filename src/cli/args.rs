//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and all subcommand enums.

use breach_config::{AllocationPolicy, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default budget for `breach dump`
pub const DEFAULT_DUMP_BUDGET: usize = 50_000;

/// breach - assemble source trees into a token-budgeted context document
#[derive(Parser)]
#[command(name = "breach")]
#[command(about = "Assemble source trees into a single token-budgeted context document")]
#[command(long_about = r#"
breach walks source trees, ranks files by how much they tell a language model
about the code (type declarations, entry points, tests, manifests, READMEs),
and packs the highest-ranked files that fit a token budget into one document.

EXAMPLES:
  # Write a starter .breach.toml in the current directory
  breach init

  # Track repositories
  breach add sveltejs/svelte -p packages/svelte/src
  breach add https://github.com/withastro/astro.git -r main -e "**/legacy/**"

  # Build context.md from every configured repository
  breach build

  # One-off document for a single repository, streamed to stdout
  breach dump vitejs/vite -b 20000 -o -

  # A local directory as XML
  breach dump ./my-project --local -f xml

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .breach.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for cloned repositories (default: ~/.breach-cache)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .breach.toml in the current directory
    Init,

    /// Add a repository to the configuration
    ///
    /// EXAMPLES:
    ///   breach add sveltejs/svelte
    ///   breach add github.com/vitejs/vite -p packages/vite/src -r main
    ///   breach add owner/repo -i "**/*.ts,**/*.md" -e "**/legacy/**"
    Add {
        /// Repository: owner/repo, github.com/owner/repo or a GitHub URL
        repo: String,

        /// Restrict to these directories (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        paths: Vec<String>,

        /// Branch, tag or commit to check out
        #[arg(short = 'r', long = "ref")]
        reference: Option<String>,

        /// Include glob patterns (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Vec<String>,

        /// Exclude glob patterns (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// List configured repositories
    #[command(visible_alias = "ls")]
    List,

    /// Build a context document from every configured repository
    ///
    /// Repositories share the budget in configuration order.
    ///
    /// EXAMPLES:
    ///   breach build
    ///   breach build -b 200000 -f xml -o context.xml
    ///   breach build --policy remaining-count --json
    Build {
        /// Output file, or '-' for stdout (default: context.md / context.xml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Token budget shared by all repositories
        #[arg(short, long)]
        budget: Option<usize>,

        /// Output format: markdown (md) or xml
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Leave test files out
        #[arg(long)]
        no_tests: bool,

        /// Budget division: fixed-denominator or remaining-count
        #[arg(long)]
        policy: Option<AllocationPolicy>,

        /// Also walk files and directories whose name starts with '.'
        #[arg(long)]
        hidden: bool,

        /// Print the build report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Build a context document from a single repository, without configuration
    ///
    /// EXAMPLES:
    ///   breach dump sveltejs/svelte -p packages/svelte/src
    ///   breach dump ../my-project --local -b 10000 -o -
    Dump {
        /// Repository spec, or a directory with --local
        repo: String,

        /// Output file, or '-' for stdout (default: <repo>-context.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Token budget
        #[arg(short, long, default_value_t = DEFAULT_DUMP_BUDGET)]
        budget: usize,

        /// Output format: markdown (md) or xml
        #[arg(short, long, default_value = "markdown")]
        format: OutputFormat,

        /// Restrict to these directories (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        paths: Vec<String>,

        /// Include glob patterns (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Vec<String>,

        /// Exclude glob patterns (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Leave test files out
        #[arg(long)]
        no_tests: bool,

        /// Also walk files and directories whose name starts with '.'
        #[arg(long)]
        hidden: bool,

        /// Treat <repo> as a local directory
        #[arg(short, long)]
        local: bool,

        /// Branch, tag or commit to check out
        #[arg(short = 'r', long = "ref")]
        reference: Option<String>,
    },
}

/// Build the CLI command structure for testing and introspection
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_add_splits_comma_lists() {
        let cli = parse(&[
            "breach", "add", "owner/repo", "-p", "src,lib", "-i", "**/*.ts", "-e", "a/**,b/**",
            "-r", "v1",
        ]);
        match cli.command {
            Commands::Add {
                repo,
                paths,
                reference,
                include,
                exclude,
            } => {
                assert_eq!(repo, "owner/repo");
                assert_eq!(paths, vec!["src", "lib"]);
                assert_eq!(reference.as_deref(), Some("v1"));
                assert_eq!(include, vec!["**/*.ts"]);
                assert_eq!(exclude, vec!["a/**", "b/**"]);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_build_flags() {
        let cli = parse(&[
            "breach", "build", "-b", "2000", "-f", "xml", "--policy", "remaining-count",
            "--no-tests", "-o", "-", "--json", "--hidden",
        ]);
        match cli.command {
            Commands::Build {
                output,
                budget,
                format,
                no_tests,
                policy,
                hidden,
                json,
            } => {
                assert!(hidden);
                assert_eq!(output, Some(PathBuf::from("-")));
                assert_eq!(budget, Some(2000));
                assert_eq!(format, Some(OutputFormat::Xml));
                assert!(no_tests);
                assert_eq!(policy, Some(AllocationPolicy::RemainingCount));
                assert!(json);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_dump_defaults() {
        let cli = parse(&["breach", "dump", "./proj", "--local"]);
        match cli.command {
            Commands::Dump {
                budget,
                format,
                local,
                no_tests,
                hidden,
                ..
            } => {
                assert!(!hidden);
                assert_eq!(budget, DEFAULT_DUMP_BUDGET);
                assert_eq!(format, OutputFormat::Markdown);
                assert!(local);
                assert!(!no_tests);
            }
            _ => panic!("expected dump"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["breach", "list", "--verbose", "--cache-dir", "/tmp/c"]);
        assert!(cli.verbose);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
        assert!(matches!(cli.command, Commands::List));

        let cli = parse(&["breach", "ls"]);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["breach", "build", "-f", "html"]).is_err());
        assert!(Cli::try_parse_from(["breach", "build", "--policy", "random"]).is_err());
    }
}
