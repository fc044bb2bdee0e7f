use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tablekit_core::{AttributeMapping, GeneratedKey, KeyRule};

/// Tablekit - Single-table key generation and access
#[derive(Parser, Debug)]
#[command(name = "tablekit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Preview the key strings a pair of rules generates for some attributes
    Keys(KeysCommand),
}

#[derive(Debug, clap::Args)]
struct KeysCommand {
    /// Partition key rule, comma separated; `!` marks a literal (e.g. `!USER,id`)
    #[arg(long)]
    partition: KeyRule,

    /// Sort key rule, comma separated (e.g. `!SESSION,status,started`)
    #[arg(long)]
    sort: KeyRule,

    /// Attributes as a JSON object
    #[arg(long)]
    attrs: String,

    /// Physical partition key attribute
    #[arg(long, default_value = "PK", env = "TABLEKIT_PARTITION_KEY")]
    partition_attr: String,

    /// Physical sort key attribute
    #[arg(long, default_value = "SK", env = "TABLEKIT_SORT_KEY")]
    sort_attr: String,

    /// Allow null fields to truncate the key, as a query prefix would
    #[arg(long)]
    prefix: bool,
}

impl KeysCommand {
    fn run(&self) -> Result<()> {
        let attrs = parse_attrs(&self.attrs)?;
        let key = self.preview(&attrs)?;
        tracing::debug!(%key, prefix = self.prefix, "Generated key");
        println!("{}", serde_json::to_string_pretty(&key.to_mapping())?);
        Ok(())
    }

    fn preview(&self, attrs: &AttributeMapping) -> Result<GeneratedKey> {
        let mut key = GeneratedKey::new();
        for (attribute, rule) in [
            (&self.partition_attr, &self.partition),
            (&self.sort_attr, &self.sort),
        ] {
            let value = if self.prefix {
                rule.render(attrs)
            } else {
                rule.render_complete(attrs)
            }
            .with_context(|| format!("Failed to generate {attribute} from rule {rule}"))?;
            key.insert(attribute.as_str(), value);
        }
        Ok(key)
    }
}

fn parse_attrs(json: &str) -> Result<AttributeMapping> {
    match serde_json::from_str::<serde_json::Value>(json).context("Attributes are not valid JSON")? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(anyhow!("Attributes must be a JSON object, got {other}")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tablekit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Keys(command) => command.run(),
    }
}
