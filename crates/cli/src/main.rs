use clap::{Args, Parser, Subcommand};
use fedora_core::config::data_dir_from_env_value;
use fedora_core::constants::{
    DATASTREAM_STORE_ENV, DATA_DIR_ENV, DEFAULT_DATASTREAMS, OBJECT_STORE_ENV, SHARD_LAYOUT_ENV,
};
use fedora_core::paths::{DatastreamStoreDir, ObjectStoreDir};
use fedora_core::{
    CoreConfig, DatastreamLocation, DatastreamLookup, FoxmlReader, LocatorService,
    ObjectLocation, PathResolver, Resolution, ShardLayout,
};
use std::io::{self, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fedora-locate")]
#[command(about = "Locate Fedora object store files from a PID")]
struct Cli {
    #[command(flatten)]
    repository: RepositoryArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct RepositoryArgs {
    /// Repository base directory (absolute), e.g. /usr/local/fedora/data
    #[arg(long, env = DATA_DIR_ENV, global = true)]
    data_dir: Option<String>,

    /// Shard layout: `split` (xx/yy/rest) or a `#` pattern such as `##`
    #[arg(long, env = SHARD_LAYOUT_ENV, default_value = "split", global = true)]
    layout: ShardLayout,

    /// Object store directory name
    #[arg(long, env = OBJECT_STORE_ENV, default_value = ObjectStoreDir::NAME, global = true)]
    object_store: String,

    /// Datastream store directory name
    #[arg(
        long,
        env = DATASTREAM_STORE_ENV,
        default_value = DatastreamStoreDir::NAME,
        global = true
    )]
    datastream_store: String,
}

impl RepositoryArgs {
    fn config(&self) -> anyhow::Result<CoreConfig> {
        let data_dir = data_dir_from_env_value(self.data_dir.clone())?;
        let config = CoreConfig::new(data_dir, self.layout.clone())?
            .with_store_dirs(&self.object_store, &self.datastream_store)?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the store-relative path of an identifier
    Resolve {
        /// PID or datastream filename, e.g. test:1 or test:1+OBJ+OBJ.0
        identifier: String,
        /// Print every intermediate value
        #[arg(long)]
        explain: bool,
    },
    /// Show the FOXML record path and selected datastream paths of an object
    Object {
        /// Object PID
        pid: String,
        /// Datastream to report (repeatable)
        #[arg(short = 'd', long = "datastream", default_values = DEFAULT_DATASTREAMS)]
        datastreams: Vec<String>,
    },
    /// List every managed datastream of an object
    Datastreams {
        /// Object PID
        pid: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    match cli.command {
        Some(Commands::Resolve {
            identifier,
            explain,
        }) => {
            let resolver = PathResolver::new(cli.repository.layout.clone());
            if explain {
                write_resolution(&mut out, &resolver.explain(&identifier))?;
            } else {
                writeln!(out, "{}", resolver.resolve(&identifier))?;
            }
        }
        Some(Commands::Object { pid, datastreams }) => {
            let service = locator(&cli.repository)?;
            writeln!(out, "Foxml Path: {}", service.object_path(&pid).display())?;
            let object = service.locate_object(&pid)?;
            write_selected(&mut out, &object, &datastreams)?;
        }
        Some(Commands::Datastreams { pid }) => {
            let service = locator(&cli.repository)?;
            let object = service.locate_object(&pid)?;
            write_listing(&mut out, &object)?;
        }
        None => {
            writeln!(out, "Use 'fedora-locate --help' for commands")?;
        }
    }

    Ok(())
}

/// `RUST_LOG` plus our own targets, so skipped datastreams are reported by default.
fn log_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("fedora_locate=info".parse()?)
        .add_directive("fedora_foxml=warn".parse()?))
}

fn locator(args: &RepositoryArgs) -> anyhow::Result<LocatorService<FoxmlReader>> {
    let config = args.config()?;
    tracing::debug!(
        data_dir = %config.data_dir().display(),
        layout = %config.shard_layout(),
        "resolved repository configuration"
    );
    Ok(LocatorService::new(&config, FoxmlReader::new()))
}

fn write_resolution(out: &mut impl Write, resolution: &Resolution) -> io::Result<()> {
    writeln!(out, "Identifier:    {}", resolution.identifier)?;
    writeln!(out, "Canonical URI: {}", resolution.canonical_uri)?;
    writeln!(out, "Digest:        {}", resolution.digest)?;
    writeln!(out, "Shard path:    {}", resolution.shard_path)?;
    writeln!(out, "Encoded URI:   {}", resolution.encoded_uri)?;
    writeln!(out, "Path:          {}", resolution.relative_path)
}

fn write_selected(
    out: &mut impl Write,
    object: &ObjectLocation,
    datastreams: &[String],
) -> io::Result<()> {
    for datastream_id in datastreams {
        match object.datastream(datastream_id) {
            DatastreamLookup::Found(location) => writeln!(
                out,
                "Path to {}: {}",
                datastream_id,
                location.path.display()
            )?,
            DatastreamLookup::NoSuchDatastream => {
                writeln!(out, "No {} datastream found.", datastream_id)?
            }
        }
    }
    Ok(())
}

fn write_listing(out: &mut impl Write, object: &ObjectLocation) -> io::Result<()> {
    writeln!(out, "Foxml Path: {}", object.metadata_path.display())?;
    if object.datastreams.is_empty() {
        writeln!(out, "No managed datastreams found.")?;
        return Ok(());
    }
    for location in &object.datastreams {
        write_datastream(out, location)?;
    }
    Ok(())
}

fn write_datastream(out: &mut impl Write, location: &DatastreamLocation) -> io::Result<()> {
    let record = &location.record;
    writeln!(
        out,
        "{} [{}] {} {}",
        record.datastream_id,
        record.control_group.code(),
        record.mime_type.as_deref().unwrap_or("-"),
        location.path.display()
    )
}
