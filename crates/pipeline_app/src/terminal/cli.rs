use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pipeline_core::{PostId, RegenerateOptions, Tab, VariantCount};

use super::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "pipeline",
    version,
    about = "Watch and steer the content production pipeline"
)]
pub struct Cli {
    /// Configuration file (RON)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    pub write_default_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the queue and keep it in sync, redrawing on every change
    Watch {
        /// Exit after the first render
        #[arg(long)]
        once: bool,
    },
    /// Fetch the queue once and print one view
    Queue {
        #[arg(long, value_enum, default_value_t = TabArg::Text)]
        tab: TabArg,
    },
    /// Approve a text draft
    Approve { id: PostId },
    /// Approve a finished video for publishing
    ApproveVideo { id: PostId },
    /// Reject a post
    Reject { id: PostId },
    /// Start video generation for a video post
    GenerateVideo { id: PostId },
    /// Regenerate a post's content
    Regenerate {
        id: PostId,
        /// Number of variants to generate
        #[arg(long, default_value = "3", value_parser = parse_variants)]
        variants: VariantCount,
        /// Extra instructions for the generator
        #[arg(long)]
        instructions: Option<String>,
        /// Try a different hook style
        #[arg(long)]
        hook: bool,
        /// Try a different tone
        #[arg(long)]
        tone: bool,
    },
    /// Check backend health
    Health,
}

impl Command {
    pub fn regenerate_options(&self) -> Option<RegenerateOptions> {
        let Command::Regenerate {
            variants,
            instructions,
            hook,
            tone,
            ..
        } = self
        else {
            return None;
        };
        let options = RegenerateOptions {
            variant_count: *variants,
            custom_instructions: None,
            change_hook_style: *hook,
            change_tone: *tone,
        };
        Some(match instructions {
            Some(text) => options.with_instructions(text),
            None => options,
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabArg {
    Text,
    Video,
    Approved,
    Scheduled,
    All,
}

impl From<TabArg> for Tab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Text => Tab::Text,
            TabArg::Video => Tab::Video,
            TabArg::Approved => Tab::Approved,
            TabArg::Scheduled => Tab::Scheduled,
            TabArg::All => Tab::All,
        }
    }
}

fn parse_variants(raw: &str) -> Result<VariantCount, String> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .and_then(VariantCount::from_count)
        .ok_or_else(|| format!("expected 1, 3 or 5 variants, got {raw:?}"))
}
