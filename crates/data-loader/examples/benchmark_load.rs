use data_loader::{Dataset, Result};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let data_dir = Path::new("data/goodbooks");

    println!("Loading Goodreads dataset...\n");

    let start = Instant::now();
    let dataset = Dataset::load_from_files(data_dir)?;
    let elapsed = start.elapsed();

    let (users, rated_books, ratings) = dataset.ratings.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Books in catalog: {}", dataset.catalog.len());
    println!("Users: {}", users);
    println!("Rated books: {}", rated_books);
    println!("Ratings: {}", ratings);
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / elapsed.as_secs_f64());

    Ok(())
}
