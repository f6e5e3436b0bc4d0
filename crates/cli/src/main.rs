use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{Book, Dataset, MAX_SCORE, MIN_SCORE, Score, UserId};
use engine::{EngineConfig, Recommendation, RecommendationEngine};
use rand::seq::IndexedRandom;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// BookRecs - Book Recommendation Engine
#[derive(Parser)]
#[command(name = "book-recs")]
#[command(
    about = "Book recommendations using user-based collaborative filtering",
    long_about = None
)]
struct Cli {
    /// Directory containing books.csv and ratings.csv
    #[arg(short, long, default_value = "data/goodbooks")]
    data_dir: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Tuning flags shared by every command
#[derive(Args)]
struct EngineArgs {
    /// Neighbors kept after ranking by shared books
    #[arg(long, global = true, default_value = "100")]
    max_neighbors: usize,

    /// Co-rated books needed to compute a similarity
    #[arg(long, global = true, default_value = "2")]
    min_co_rated: usize,

    /// Most similar neighbors used for predictions
    #[arg(long, global = true, default_value = "50")]
    top_similar: usize,

    /// Lowest predicted score that is recommended
    #[arg(long, global = true, default_value = "3.0")]
    min_score: f32,

    /// Leave out books the user already rated
    #[arg(long, global = true)]
    exclude_rated: bool,
}

impl EngineArgs {
    fn to_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_max_neighbors(self.max_neighbors)
            .with_min_co_rated(self.min_co_rated)
            .with_top_similar(self.top_similar)
            .with_min_score(self.min_score)
            .with_exclude_rated(self.exclude_rated)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get book recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to show
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Show how each prediction was made
        #[arg(long)]
        explain: bool,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit a rating, then show recommendations for the user
    Rate {
        #[arg(long)]
        user_id: UserId,

        /// Exact (cleaned) book title
        #[arg(long)]
        title: String,

        /// Rating between 1 and 5
        #[arg(long)]
        score: Score,
    },

    /// Show a user's rating history
    User {
        #[arg(long)]
        user_id: UserId,
    },

    /// Search for books by title
    Search {
        /// Title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Maximum requests in flight
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading book dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let dataset =
        Dataset::load_from_files(&cli.data_dir).context("Failed to load book dataset")?;
    let engine = RecommendationEngine::from_dataset(dataset, cli.engine.to_config());
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
            json,
        } => handle_recommend(&engine, user_id, limit, explain, json)?,
        Commands::Rate {
            user_id,
            title,
            score,
        } => handle_rate(&engine, user_id, &title, score)?,
        Commands::User { user_id } => handle_user(&engine, user_id),
        Commands::Search { title } => handle_search(&engine, &title),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(engine, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    engine: &RecommendationEngine,
    user_id: UserId,
    limit: usize,
    explain: bool,
    json: bool,
) -> Result<()> {
    if let Some(message) = unknown_user_message(engine, user_id) {
        println!("{}", message.yellow());
        return Ok(());
    }

    let mut recommendations = engine.recommend(user_id);
    recommendations.truncate(limit);

    if json {
        let out = serde_json::to_string_pretty(&recommendations)
            .context("Failed to serialize recommendations")?;
        println!("{}", out);
        return Ok(());
    }

    if recommendations.is_empty() {
        println!("{}", format!("No recommendations for user {}", user_id).yellow());
        return Ok(());
    }

    print_recommendations(user_id, &recommendations, explain);
    Ok(())
}

/// Handle the 'rate' command
///
/// The rating is checked and logged but not stored, so it does not change
/// the recommendations printed afterwards.
fn handle_rate(
    engine: &RecommendationEngine,
    user_id: UserId,
    title: &str,
    score: Score,
) -> Result<()> {
    let book = validate_rating(engine, title, score)?;

    info!(
        user_id,
        book_id = book.id,
        score,
        "Received rating for '{}'",
        book.title
    );
    match engine.ratings().score_of(user_id, book.id) {
        Some(previous) => info!("Replaces the earlier rating of {}", previous),
        None if !engine.is_known_user(user_id) => {
            warn!("Rating from user {} who has no history", user_id)
        }
        None => {}
    }

    handle_recommend(engine, user_id, 20, false, false)
}

/// "not found" message for a user without ratings, `None` for a known user
fn unknown_user_message(engine: &RecommendationEngine, user_id: UserId) -> Option<String> {
    (!engine.is_known_user(user_id)).then(|| format!("User {} not found", user_id))
}

/// Check a submitted rating: the title must be in the catalog and the
/// score a finite value within `MIN_SCORE..=MAX_SCORE`
fn validate_rating<'a>(
    engine: &'a RecommendationEngine,
    title: &str,
    score: Score,
) -> Result<&'a Book> {
    let Some(book) = engine.find_book_by_title(title) else {
        bail!("Book '{}' not found", title);
    };
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        bail!("Score must be between {} and {}, got {}", MIN_SCORE, MAX_SCORE, score);
    }
    Ok(book)
}

/// Handle the 'user' command
fn handle_user(engine: &RecommendationEngine, user_id: UserId) {
    if let Some(message) = unknown_user_message(engine, user_id) {
        println!("{}", message.yellow());
        return;
    }

    let history = engine.ratings().history_of(user_id);
    let rated = engine.rated_books(user_id);

    println!("{}", format!("User ID: {}", user_id).bold().blue());

    let num_ratings = history.len();
    let avg_rating = history.iter().map(|r| r.score).sum::<f32>() / num_ratings as f32;
    println!("{}Number of ratings: {}", "• ".cyan(), num_ratings);
    println!("{}Average rating: {:.2}", "• ".cyan(), avg_rating);
    if rated.len() < num_ratings {
        println!(
            "{}{} rated books are not in the catalog",
            "• ".cyan(),
            num_ratings - rated.len()
        );
    }

    println!("Rated books:");
    for book in &rated {
        println!(
            "  {:>6}  {} by {} - Rating: {}",
            book.book_id, book.title, book.authors, book.score
        );
    }
}

/// Handle the 'search' command
fn handle_search(engine: &RecommendationEngine, title: &str) {
    let matches = engine.search_titles(title);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  no matching books");
        return;
    }
    for book in matches.iter().take(20) {
        let raters = engine.ratings().raters_of(book.id).len();
        println!("{}: {} by {} ({} ratings)", book.id, book.title, book.authors, raters);
    }
    if matches.len() > 20 {
        println!("  ... and {} more", matches.len() - 20);
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: RecommendationEngine,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }

    let mut known: Vec<UserId> = engine.known_users().into_iter().collect();
    if known.is_empty() {
        bail!("The dataset has no users to benchmark with");
    }
    known.sort_unstable();

    let user_ids: Vec<UserId> = {
        let mut rng = rand::rng();
        (0..requests)
            .filter_map(|_| known.choose(&mut rng).copied())
            .collect()
    };

    let engine = Arc::new(engine);
    let limiter = Arc::new(Semaphore::new(concurrent.max(1)));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let engine = Arc::clone(&engine);
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await?;
            let started = Instant::now();
            tokio::task::spawn_blocking(move || engine.recommend(user_id))
                .await
                .context("Recommendation task panicked")?;
            Ok::<_, anyhow::Error>(started.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(handles.len());
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = start.elapsed();

    timings.sort();
    let total_latency: Duration = timings.iter().sum();
    let avg_latency = total_latency / timings.len() as u32;
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", timings.len(), concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Nearest-rank percentile of sorted timings
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Helper function to format and print recommendations
fn print_recommendations(user_id: UserId, recommendations: &[Recommendation], explain: bool) {
    println!("{}", format!("Book Recommendations for user {}:", user_id).bold().blue());
    for (idx, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} by {} - Score: {:.2}",
            (idx + 1).to_string().green(),
            rec.title,
            rec.authors,
            rec.score
        );
        if explain {
            println!(
                "   {} similar readers rated it (similarity sum {:.3})",
                rec.contributors, rec.similarity_sum
            );
        }
    }
}
