use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{FeatureCatalog, ItemIndex, RatingMatrix, UserIndex};
use recommender::{NaiveBayesRecommender, RecommenderConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// NB-Recs - content-based Naive Bayes rating predictor
#[derive(Parser)]
#[command(name = "nb-recs")]
#[command(about = "Predict ratings from item features with per-user Naive Bayes models", long_about = None)]
struct Cli {
    /// JSON config file with content_path, rating_path and rating_threshold
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Item feature file (overrides the config file)
    #[arg(long)]
    content: Option<PathBuf>,

    /// User rating file (overrides the config file)
    #[arg(long)]
    ratings: Option<PathBuf>,

    /// Ratings at or above this count as liked (overrides the config file)
    #[arg(long)]
    threshold: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict a user's rating for an item
    Predict {
        /// User label from the rating file
        #[arg(long)]
        user: String,

        /// Item label from the feature file
        #[arg(long)]
        item: String,

        /// Show the posterior behind the prediction
        #[arg(long)]
        explain: bool,
    },

    /// Dump a user's trained profile
    Profile {
        /// User label from the rating file
        #[arg(long)]
        user: String,

        /// Print the profile as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank the items a user hasn't rated yet
    Recommend {
        /// User label from the rating file
        #[arg(long)]
        user: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Report MAE / RMSE on a held-out rating file
    Evaluate {
        /// Held-out ratings in the same format as the training file
        #[arg(long)]
        test: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let start = Instant::now();
    let catalog = Arc::new(
        FeatureCatalog::load_from_file(&config.content_path)
            .context("Failed to load item features")?,
    );
    let ratings = RatingMatrix::load_from_file(&config.rating_path, &catalog)
        .context("Failed to load ratings")?;
    let model = NaiveBayesRecommender::train(catalog, &ratings, config.rating_threshold)
        .context("Failed to train user profiles")?;
    info!(elapsed = ?start.elapsed(), "Model ready");
    println!(
        "{} Trained {} users over {} items in {:?}",
        "✓".green(),
        model.num_users(),
        model.catalog().num_items(),
        start.elapsed()
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Predict {
            user,
            item,
            explain,
        } => handle_predict(&model, &ratings, &user, &item, explain)?,
        Commands::Profile { user, json } => handle_profile(&model, &ratings, &user, json)?,
        Commands::Recommend { user, limit } => handle_recommend(&model, &ratings, &user, limit)?,
        Commands::Evaluate { test } => handle_evaluate(&model, &ratings, test)?,
    }

    Ok(())
}

/// Config file (or defaults) with command-line overrides applied
fn resolve_config(cli: &Cli) -> Result<RecommenderConfig> {
    let mut config = match &cli.config {
        Some(path) => RecommenderConfig::from_file(path)?,
        None => RecommenderConfig::default(),
    };
    if let Some(content) = &cli.content {
        config.content_path = content.clone();
    }
    if let Some(ratings) = &cli.ratings {
        config.rating_path = ratings.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.rating_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_user(ratings: &RatingMatrix, label: &str) -> Result<UserIndex> {
    ratings
        .users()
        .index_of(label)
        .ok_or_else(|| anyhow!("User {} not found", label))
}

fn resolve_item(model: &NaiveBayesRecommender, label: &str) -> Result<ItemIndex> {
    model
        .catalog()
        .items()
        .index_of(label)
        .ok_or_else(|| anyhow!("Item {} not found", label))
}

fn item_label(model: &NaiveBayesRecommender, item: ItemIndex) -> &str {
    model.catalog().items().label_of(item).unwrap_or("?")
}

/// Handle the 'predict' command
fn handle_predict(
    model: &NaiveBayesRecommender,
    ratings: &RatingMatrix,
    user_label: &str,
    item_label: &str,
    explain: bool,
) -> Result<()> {
    let user = resolve_user(ratings, user_label)?;
    let item = resolve_item(model, item_label)?;
    let posterior = model.explain(user, item)?;

    println!(
        "{} predicted rating for {}: {}",
        user_label.bold(),
        item_label.bold(),
        format!("{:.3}", posterior.rating()).green()
    );

    if explain {
        let mut features = model.catalog().feature_labels(item);
        features.sort_unstable();
        println!("{}Features: [{}]", "• ".cyan(), features.join(", "));
        println!("{}P(L | item): {:.4}", "• ".cyan(), posterior.p_like);
        println!("{}P(~L | item): {:.4}", "• ".cyan(), posterior.p_not_like);
        println!("{}Log-odds: {:.4}", "• ".cyan(), posterior.logit);
    }
    Ok(())
}

/// Handle the 'profile' command
fn handle_profile(
    model: &NaiveBayesRecommender,
    ratings: &RatingMatrix,
    user_label: &str,
    json: bool,
) -> Result<()> {
    let user = resolve_user(ratings, user_label)?;
    let profile = model.profile(user)?;

    if json {
        println!("{}", profile.to_json()?);
        return Ok(());
    }

    println!("{}", format!("Profile for {}:", user_label).bold().blue());
    println!("{}", profile);

    // Label the strongest "liked" signals for readability
    let features = model.catalog().features();
    let mut by_ratio: Vec<_> = profile
        .feature_probabilities
        .iter()
        .map(|(&f, p)| (features.label_of(f).unwrap_or("?"), p.like / p.not_like))
        .collect();
    by_ratio.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    println!("{}", "Most liked features:".bold());
    for (label, ratio) in by_ratio.iter().take(5) {
        println!("  - {} (likelihood ratio {:.2})", label, ratio);
    }
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(
    model: &NaiveBayesRecommender,
    ratings: &RatingMatrix,
    user_label: &str,
    limit: usize,
) -> Result<()> {
    let user = resolve_user(ratings, user_label)?;
    let recommendations = model.recommend(user, ratings, limit)?;

    println!("{}", format!("Recommendations for {}:", user_label).bold().blue());
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} - Predicted rating: {:.3}",
            (rank + 1).to_string().green(),
            item_label(model, rec.item),
            rec.rating
        );
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(
    model: &NaiveBayesRecommender,
    ratings: &RatingMatrix,
    test_path: PathBuf,
) -> Result<()> {
    let test = RatingMatrix::load_for_users(&test_path, model.catalog(), ratings.users())
        .with_context(|| format!("Failed to load held-out ratings from {}", test_path.display()))?;
    let evaluation = model.evaluate(&test)?;

    println!("{}", "Evaluation results:".bold().blue());
    println!("Ratings scored: {}", evaluation.count);
    println!("MAE: {:.4}", evaluation.mae);
    println!("RMSE: {:.4}", evaluation.rmse);
    Ok(())
}
