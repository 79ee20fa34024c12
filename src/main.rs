use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{error, info};

use cardforge::manifest::{self, Manifest};
use cardforge::store::{resolve_public_id, DirectoryStore};
use cardforge::{AssetStore, CardFace, CardKind, CardRequest, Compositor, CompositorConfig, ImageSource};

/// Where finished cards go.
#[derive(Debug, Clone)]
enum StoreSpec {
    Directory(PathBuf),
    Cloudinary,
}

impl FromStr for StoreSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "cloudinary" {
            return Ok(StoreSpec::Cloudinary);
        }
        match s.strip_prefix("dir:") {
            Some(path) if !path.is_empty() => Ok(StoreSpec::Directory(PathBuf::from(path))),
            _ => Err(format!("expected dir:<path> or cloudinary, got {:?}", s)),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Asset store: dir:<path> or cloudinary (reads CLOUDINARY_URL)
    #[arg(long, global = true, default_value = "dir:cards")]
    store: StoreSpec,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one card and upload it
    Render {
        /// Photo path or http(s) URL
        #[arg(long)]
        image: String,
        #[arg(long)]
        title: String,
        #[arg(long = "type")]
        card_type: String,
        #[arg(long)]
        cost: i64,
        #[arg(long)]
        attack: Option<i64>,
        #[arg(long)]
        defense: Option<i64>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "#000000")]
        frame_color: String,
        #[arg(long)]
        creator: Option<String>,
        /// Delete the image file once the card is rendered
        #[arg(long)]
        temporary: bool,
    },
    /// Render every card in a JSON manifest
    Batch {
        manifest: PathBuf,
        /// Renders in flight (defaults to the CPU count)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Maintain uploaded cards
    Assets {
        #[command(subcommand)]
        action: AssetsAction,
    },
}

#[derive(Subcommand, Debug)]
enum AssetsAction {
    List {
        #[arg(long)]
        folder: Option<String>,
        #[arg(long, default_value_t = 100)]
        max: usize,
    },
    Delete {
        /// Public id or delivery URL of the asset
        target: String,
    },
    Rename {
        from: String,
        to: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CompositorConfig> {
    let mut config = match path {
        Some(path) => CompositorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CompositorConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

async fn run<S: AssetStore>(command: Command, config: CompositorConfig, store: S) -> anyhow::Result<()> {
    match command {
        Command::Render {
            image,
            title,
            card_type,
            cost,
            attack,
            defense,
            description,
            frame_color,
            creator,
            temporary,
        } => {
            let compositor = Compositor::from_config(config, store)?;
            let request = CardRequest {
                source: ImageSource::parse(&image, temporary)?,
                face: CardFace {
                    title,
                    kind: CardKind::from_parts(&card_type, attack, defense),
                    cost,
                    description,
                    frame_color,
                    creator,
                },
            };
            let handle = compositor
                .render_card(request)
                .await
                .with_context(|| format!("rendering card from {}", image))?;
            println!("{}", serde_json::to_string_pretty(&handle)?);
        }
        Command::Batch { manifest: path, concurrency } => {
            let manifest = Manifest::load(&path).with_context(|| format!("loading manifest {}", path.display()))?;
            let requests = manifest.requests()?;
            let concurrency = concurrency.unwrap_or_else(num_cpus::get);
            info!("rendering {} cards, {} at a time", requests.len(), concurrency);

            let compositor = Compositor::from_config(config, store)?;
            let results = manifest::render_all(&compositor, requests, concurrency).await;
            let mut failed = 0;
            for (row, result) in results.into_iter().enumerate() {
                match result {
                    Ok(handle) => println!("{}", serde_json::to_string(&handle)?),
                    Err(e) => {
                        error!("row {}: {}", row + 1, e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} cards failed", failed, manifest.rows.len());
            }
        }
        Command::Assets { action } => match action {
            AssetsAction::List { folder, max } => {
                let folder = folder.unwrap_or(config.asset_folder);
                for handle in store.list(&folder, max).await? {
                    println!("{}\t{}", handle.public_id, handle.url);
                }
            }
            AssetsAction::Delete { target } => {
                let public_id = match resolve_public_id(&target) {
                    Some(id) => id,
                    None => bail!("no public id in {}", target),
                };
                if !store.delete(&public_id).await? {
                    bail!("no asset named {}", public_id);
                }
            }
            AssetsAction::Rename { from, to } => {
                store
                    .rename(&from, &to)
                    .await
                    .with_context(|| format!("renaming {} to {}", from, to))?;
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.store {
        StoreSpec::Directory(root) => run(cli.command, config, DirectoryStore::new(root)?).await,
        #[cfg(feature = "cloudinary")]
        StoreSpec::Cloudinary => {
            use cardforge::store::{CloudinaryConfig, CloudinaryStore};
            let store = CloudinaryStore::new(CloudinaryConfig::from_env()?)?;
            run(cli.command, config, store).await
        }
        #[cfg(not(feature = "cloudinary"))]
        StoreSpec::Cloudinary => bail!("built without the cloudinary feature"),
    }
}
