use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{MovieId, UserId};
use server::{ActiveRecommender, Recommender, SimilarMovie};
use similarity::{CandidatePolicy, DistanceMetric, SearchConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// movie-knn - "movies rated like this one"
#[derive(Parser)]
#[command(name = "movie-knn")]
#[command(about = "Item-based movie similarity over a sparse rating matrix", long_about = None)]
struct Cli {
    /// Directory with ratings.csv/movies.csv or ratings.dat/movies.dat
    #[arg(short, long, default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Distance metric: cosine, euclidean or manhattan
    #[arg(long, default_value = "cosine")]
    metric: DistanceMetric,

    /// Fail instead of clamping when k exceeds the number of other movies
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the movies rated most like a given movie
    Similar {
        /// Movie ID to search around
        #[arg(long)]
        movie_id: MovieId,

        /// Number of neighbors to return
        #[arg(long, default_value = "10")]
        k: usize,

        /// Print the distance next to each movie
        #[arg(long)]
        show_distance: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Recommend movies similar to a user's top-rated movie
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        k: usize,
    },

    /// Show a user's rating history
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run concurrent similarity queries against one shared index
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of requests in flight at once
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Neighbors per request
        #[arg(long, default_value = "10")]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let policy = if cli.strict {
        CandidatePolicy::Strict
    } else {
        CandidatePolicy::Clamp
    };
    let config = SearchConfig::new()
        .with_metric(cli.metric)
        .with_candidate_policy(policy);

    // Load data and fit the index once for the whole run
    println!("Loading dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let active = ActiveRecommender::load(&cli.data_dir, config)
        .with_context(|| format!("Failed to load dataset from {}", cli.data_dir.display()))?;
    let recommender = active.current();
    let (movies, users) = recommender.index().matrix().shape();
    println!(
        "{} Indexed {} movies x {} users in {:?}",
        "✓".green(),
        movies,
        users,
        start.elapsed()
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Similar {
            movie_id,
            k,
            show_distance,
            json,
        } => handle_similar(&recommender, movie_id, k, cli.metric, show_distance, json)?,
        Commands::Recommend { user_id, k } => handle_recommend(&recommender, user_id, k)?,
        Commands::User { user_id } => handle_user(&recommender, user_id)?,
        Commands::Search { title } => handle_search(&recommender, &title),
        Commands::Benchmark {
            requests,
            concurrent,
            k,
        } => handle_benchmark(recommender, requests, concurrent, k).await?,
    }

    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(
    recommender: &Recommender,
    movie_id: MovieId,
    k: usize,
    metric: DistanceMetric,
    show_distance: bool,
    json: bool,
) -> Result<()> {
    let similar = recommender
        .find_similar(movie_id, k, metric, show_distance)
        .with_context(|| format!("Similarity search for movie {} failed", movie_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&similar)?);
        return Ok(());
    }

    let header = format!(
        "Movies rated like {} ({}):",
        recommender.title_of(movie_id),
        metric
    );
    println!("{}", header.bold().blue());
    print_similar(&similar);
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(recommender: &Recommender, user_id: UserId, k: usize) -> Result<()> {
    let rec = recommender
        .recommend_for_user_detailed(user_id, k)
        .with_context(|| format!("Recommendation for user {} failed", user_id))?;

    println!(
        "{}",
        format!(
            "Because user {} rated {} with {:.1}:",
            user_id, rec.seed_title, rec.seed.rating
        )
        .bold()
        .blue()
    );
    print_similar(&rec.movies);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(recommender: &Recommender, user_id: UserId) -> Result<()> {
    let ratings = recommender.user_ratings(user_id);
    if ratings.is_empty() {
        anyhow::bail!("User {} not found", user_id);
    }

    println!("{}", format!("User ID: {}", user_id).bold().blue());

    let total: f32 = ratings.iter().map(|r| r.rating).sum();
    println!("{}Number of ratings: {}", "• ".cyan(), ratings.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), total / ratings.len() as f32);

    let seed = recommender.seed_for_user(user_id)?;
    println!(
        "{}Recommendation seed: {} ({})",
        "• ".green(),
        recommender.title_of(seed.movie_id),
        seed.rating
    );

    // Highest first, input order among equals
    let mut top_rated: Vec<_> = ratings.iter().collect();
    top_rated.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    println!("Top rated movies:");
    for rating in top_rated.iter().take(10) {
        println!(
            "  - {} (Rating: {})",
            recommender.title_of(rating.movie_id),
            rating.rating
        );
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(recommender: &Recommender, title: &str) {
    let matches = recommender.titles().search(title);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  (no matches)");
        return;
    }
    for (movie_id, movie_title) in matches.iter().take(20) {
        let ratings = recommender
            .index()
            .ids()
            .movie_index(*movie_id)
            .and_then(|row| recommender.index().matrix().row(row))
            .map(|row| row.nnz())
            .unwrap_or(0);
        println!("{}: {} ({} ratings)", movie_id, movie_title, ratings);
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    recommender: Arc<Recommender>,
    requests: usize,
    concurrent: usize,
    k: usize,
) -> Result<()> {
    let movie_ids = recommender.index().ids().movies().ids().to_vec();
    if movie_ids.is_empty() || requests == 0 {
        anyhow::bail!("Nothing to benchmark");
    }

    let targets: Vec<MovieId> = (0..requests)
        .map(|_| movie_ids[rand::random::<u32>() as usize % movie_ids.len()])
        .collect();

    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall = Instant::now();

    // Search is CPU-bound, so each request runs on the blocking pool
    let mut handles = Vec::with_capacity(requests);
    for movie_id in targets {
        let recommender = Arc::clone(&recommender);
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                recommender.index().nearest(movie_id, k)?;
                Ok::<_, anyhow::Error>(start.elapsed())
            })
            .await?
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = wall.elapsed();
    debug!(requests, concurrent, "Benchmark finished");

    timings.sort();
    let total: Duration = timings.iter().sum();
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent, k={})", requests, concurrent, k);
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", total / timings.len() as u32);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f64 / wall_time.as_secs_f64()
    );

    Ok(())
}

/// Helper function to format and print neighbor lists
fn print_similar(movies: &[SimilarMovie]) {
    for (rank, movie) in movies.iter().enumerate() {
        match movie.distance {
            Some(distance) => println!(
                "{}. {} [{}] - distance {:.4}",
                (rank + 1).to_string().green(),
                movie.title,
                movie.movie_id,
                distance
            ),
            None => println!(
                "{}. {} [{}]",
                (rank + 1).to_string().green(),
                movie.title,
                movie.movie_id
            ),
        }
    }
}
