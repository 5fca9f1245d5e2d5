use crate::cmd::Context;
use crate::output::print_json;
use anyhow::Context as _;
use clap::Subcommand;
use podrace_core::config::{ClientConfig, WarnLevel};
use podrace_core::io::Overwrite;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective config (file plus overrides)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Context, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx),
        ConfigSubcommand::Validate => validate(ctx),
        ConfigSubcommand::Init { force } => init(ctx, force),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    if ctx.json {
        return print_json(&config);
    }
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let warnings = config.validate();

    if ctx.json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let path = &ctx.config_path;
    let policy = if force {
        Overwrite::Replace
    } else {
        Overwrite::Keep
    };
    let written = ClientConfig::default()
        .write(path, policy)
        .with_context(|| format!("failed to write {}", path.display()))?;
    if !written {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if ctx.json {
        print_json(&serde_json::json!({ "path": path }))?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
