//! threadline-fixtures: seed a database with demo principals, posts and comments.

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use threadline_db::logging::init_tracing;
use threadline_db::seed::{seed, SeedPlan};
use threadline_db::{defaults, log_pool_metrics, Store, StoreConfig};

#[derive(Parser)]
#[command(name = "threadline-fixtures")]
#[command(author, version, about = "Load demo data into a threadline database")]
struct Cli {
    /// Number of principals to create
    #[arg(long, default_value_t = defaults::FIXTURE_USERS)]
    users: usize,

    /// Number of root posts
    #[arg(long, default_value_t = defaults::FIXTURE_ROOTS)]
    roots: usize,

    /// Comment levels below the roots
    #[arg(long, default_value_t = defaults::FIXTURE_LEVELS)]
    levels: usize,

    /// Comments created on each level
    #[arg(long, default_value_t = defaults::FIXTURE_COMMENTS_PER_LEVEL)]
    comments_per_level: usize,

    /// Username prefix; users are named `<prefix>_<n>`
    #[arg(long, default_value = "user")]
    prefix: String,

    /// Seed for reproducible owner and parent choices
    #[arg(long)]
    seed: Option<u64>,

    /// Apply pending migrations before loading
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let plan = SeedPlan {
        users: cli.users,
        roots: cli.roots,
        levels: cli.levels,
        comments_per_level: cli.comments_per_level,
    };

    let config = StoreConfig::from_env()?;
    let store = Store::from_config(&config).await?;
    if cli.migrate {
        store.migrate().await?;
        info!(subsystem = "fixtures", op = "migrate", "Migrations applied");
    }

    let mut rng = match cli.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let outcome = seed(&store, &plan, &cli.prefix, &mut rng).await;
    log_pool_metrics(store.pool());

    match outcome {
        Ok(report) => {
            info!(
                subsystem = "fixtures",
                op = "load",
                principals = report.principals.len(),
                roots = report.roots.len(),
                nodes = report.node_count(),
                "Fixtures successfully loaded"
            );
            Ok(())
        }
        Err(e) => {
            error!(subsystem = "fixtures", op = "load", error = %e, "Failed to load fixtures");
            Err(e.into())
        }
    }
}
