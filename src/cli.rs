use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::deleter::DEFAULT_CONCURRENCY;
use crate::selector::Unversioned;

/// regsweep: Docker Registry V2 tag cleaner
#[derive(Parser, Debug)]
#[command(name = "regsweep", version, about)]
pub struct Cli {
    /// Registry URL (e.g., http://localhost:5000)
    #[arg(
        short,
        long,
        global = true,
        env = "REGSWEEP_URL",
        default_value = "http://localhost:5000"
    )]
    pub url: String,

    /// Disable TLS certificate verification
    #[arg(long, global = true, env = "REGSWEEP_INSECURE", default_value_t = false)]
    pub insecure: bool,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Verbose output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show all images from the registry catalog
    Images {
        /// Number of images to retrieve
        #[arg(short, default_value_t = 5000)]
        n: usize,
    },
    /// Show all tags for an image
    Tags {
        /// Image name, e.g. team/nodejs
        #[arg(short, long)]
        image: String,
    },
    /// Delete the selected tags of an image
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Image name, e.g. team/nodejs
    #[arg(short, long)]
    pub image: String,

    /// Tag to delete; a trailing `*` selects every tag with that prefix, sorted by semver.
    /// Omit to delete every tag of the image
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Number of newest versioned tags to keep, combined with a `*` pattern
    #[arg(short, long, default_value_t = 0)]
    pub keep: usize,

    /// Only print the tags that would be deleted
    #[arg(long, alias = "dryrun", default_value_t = false)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,

    /// Number of concurrent deletion workers
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub concurrency: u16,

    /// What to do with prefix matches whose suffix is not a version
    #[arg(long, value_enum, default_value_t = UnversionedArg::Include)]
    pub unversioned: UnversionedArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnversionedArg {
    /// Always delete them, regardless of --keep
    Include,
    /// Leave them alone
    Skip,
}

impl From<UnversionedArg> for Unversioned {
    fn from(arg: UnversionedArg) -> Self {
        match arg {
            UnversionedArg::Include => Unversioned::Include,
            UnversionedArg::Skip => Unversioned::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_images_defaults() {
        let cli = Cli::try_parse_from(["regsweep", "images"]).unwrap();
        assert_eq!(cli.url, "http://localhost:5000");
        assert!(!cli.insecure);
        assert_eq!(cli.timeout, 30);
        assert!(matches!(cli.command, Command::Images { n: 5000 }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "regsweep",
            "tags",
            "--image",
            "team/app",
            "--url",
            "https://example.com",
            "--insecure",
        ])
        .unwrap();
        assert_eq!(cli.url, "https://example.com");
        assert!(cli.insecure);
        match cli.command {
            Command::Tags { image } => assert_eq!(image, "team/app"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_delete_full_flags() {
        let cli = Cli::try_parse_from([
            "regsweep", "delete", "-i", "app", "-t", "master-*", "-k", "2", "--dryrun", "-c",
            "4", "--unversioned", "skip",
        ])
        .unwrap();
        let Command::Delete(args) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(args.image, "app");
        assert_eq!(args.tag.as_deref(), Some("master-*"));
        assert_eq!(args.keep, 2);
        assert!(args.dry_run);
        assert!(!args.yes);
        assert_eq!(args.concurrency, 4);
        assert_eq!(args.unversioned, UnversionedArg::Skip);
        assert_eq!(Unversioned::from(args.unversioned), Unversioned::Skip);
    }

    #[test]
    fn test_delete_defaults() {
        let cli = Cli::try_parse_from(["regsweep", "delete", "--image", "app"]).unwrap();
        let Command::Delete(args) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(args.tag, None);
        assert_eq!(args.keep, 0);
        assert_eq!(args.concurrency, 10);
        assert_eq!(Unversioned::from(args.unversioned), Unversioned::Include);
    }

    #[test]
    fn test_delete_requires_image() {
        assert!(Cli::try_parse_from(["regsweep", "delete", "--tag", "x"]).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Cli::try_parse_from(["regsweep", "delete", "-i", "app", "-c", "0"]);
        assert!(result.is_err());
    }
}
