use data_loader::Dataset;
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let data_dir = Path::new("data/ml-latest-small");

    println!("Loading dataset from {}...\n", data_dir.display());

    let start = Instant::now();
    let dataset = Dataset::load_from_dir(data_dir)?;
    let elapsed = start.elapsed();

    let (ratings, movies) = dataset.counts();
    let users = dataset.ratings_by_user().len();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Movies in catalog: {}", movies);
    println!("Ratings: {}", ratings);
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / elapsed.as_secs_f64());
    Ok(())
}
