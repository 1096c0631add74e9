//! Cinegraph - batch analytics over a movie graph snapshot
//!
//! Loads a JSON graph snapshot, runs one analytics command and prints the
//! result as JSON on stdout.

use anyhow::{Context, Result};
use cinegraph::analytics::{rank_desc, GraphAnalyticsEngine};
use cinegraph::store::{load_snapshot, Direction, NodeId, NodeKind, RelKind, SharedGraph};
use cinegraph::traversal::TraversalSpec;
use cinegraph::Config;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cinegraph")]
#[command(about = "Movie graph analytics: PageRank, betweenness, communities, paths, recommendations")]
struct Cli {
    /// Path to the YAML config file (default: ./cinegraph.yaml)
    #[arg(short, long, env = "CINEGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the JSON graph snapshot
    #[arg(short, long, env = "CINEGRAPH_SNAPSHOT")]
    snapshot: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Node and relationship counts, person-movie density
    Stats,

    /// PageRank over a projection (people joined by collaborations by default)
    Pagerank {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Node kind of the projection
        #[arg(long, default_value = "person")]
        kind: NodeKind,
        /// Relationship kind joining projected nodes
        #[arg(long, default_value = "COLLABORATED_WITH")]
        via: RelKind,
    },

    /// Betweenness centrality on the collaboration projection
    Betweenness {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Louvain communities on the collaboration projection
    Communities,

    /// Connected components of the collaboration projection
    Components,

    /// People with the most movie participations and collaborators
    Connected {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Shortest path between two nodes
    Path {
        from: NodeId,
        to: NodeId,
        /// out, in or both
        #[arg(long, default_value = "both")]
        direction: Direction,
        /// Restrict to these relationship kinds (repeatable)
        #[arg(long = "kind")]
        kinds: Vec<RelKind>,
        /// Numeric relationship attribute used as edge weight (missing = 1.0)
        #[arg(long)]
        weight: Option<String>,
    },

    /// Movie recommendations for a person
    Recommend {
        person: NodeId,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// People similar to a person by shared movies and genres
    Similar {
        person: NodeId,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Collaboration network of a person up to a number of hops
    Network {
        person: NodeId,
        #[arg(short, long, default_value = "2")]
        depth: usize,
    },

    /// Genre popularity and co-occurrence
    Genres,

    /// Movies ranked by cast size times connected movies
    Influential {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Movies per year and longest careers
    Timeline,

    /// Full analytics report on the collaboration projection
    Report,
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cinegraph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;

    let store = load_snapshot(&cli.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", cli.snapshot.display()))?;
    let mut recommendation = config.recommendation.clone();
    if let Commands::Recommend {
        limit: Some(limit), ..
    } = &cli.command
    {
        recommendation.limit = Some(*limit);
    }
    let engine = GraphAnalyticsEngine::new(SharedGraph::new(store), config.analytics)
        .with_recommendation(recommendation);

    run(&engine, cli.command, cli.pretty)
}

fn run(engine: &GraphAnalyticsEngine, command: Commands, pretty: bool) -> Result<()> {
    match command {
        Commands::Stats => print_json(&engine.statistics(), pretty),
        Commands::Pagerank { limit, kind, via } => {
            let result = engine.pagerank_on(kind, via);
            tracing::info!(
                iterations = result.iterations,
                converged = result.converged,
                "PageRank finished"
            );
            print_json(&result.top(limit), pretty)
        }
        Commands::Betweenness { limit } => print_json(&rank_desc(&engine.betweenness(), limit), pretty),
        Commands::Communities => print_json(&engine.communities(), pretty),
        Commands::Components => print_json(&engine.components().1, pretty),
        Commands::Connected { limit } => print_json(&engine.most_connected(limit), pretty),
        Commands::Path {
            from,
            to,
            direction,
            kinds,
            weight,
        } => {
            let mut spec = TraversalSpec::new(direction);
            for kind in kinds {
                spec = spec.with_kind(kind);
            }
            match weight {
                Some(attr) => {
                    let path = engine.weighted_shortest_path(&from, &to, &spec, |rel| {
                        rel.attributes
                            .get(&attr)
                            .and_then(|v| v.as_f64())
                            .unwrap_or(1.0)
                    })?;
                    print_json(&path, pretty)
                }
                None => print_json(&engine.shortest_path(&from, &to, &spec)?, pretty),
            }
        }
        Commands::Recommend { person, .. } => print_json(&engine.recommend(&person)?, pretty),
        Commands::Similar { person, limit } => {
            print_json(&engine.similar_people(&person, limit)?, pretty)
        }
        Commands::Network { person, depth } => {
            print_json(&engine.collaboration_network(&person, depth)?, pretty)
        }
        Commands::Genres => print_json(&engine.genre_analysis(), pretty),
        Commands::Influential { limit } => print_json(&engine.influential_movies(limit), pretty),
        Commands::Timeline => print_json(&engine.temporal_analysis(), pretty),
        Commands::Report => print_json(&engine.analyze(), pretty),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}
