use anyhow::Result;
use clap::Parser;
use ratewise::utils::validation::parse_rating_assignment;
use ratewise::{init_tracing, AppState, Config, RecommenderError};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rate a few products, get deterministic recommendations", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Catalog CSV (overrides the config file)
    #[arg(long)]
    catalog: Option<String>,

    /// Transaction log CSV used for co-occurrence similarity
    #[arg(long)]
    transactions: Option<String>,

    /// A rating as PRODUCT_ID=VALUE; repeat for several products
    #[arg(short, long = "rate", value_name = "PRODUCT_ID=VALUE")]
    ratings: Vec<String>,

    /// Number of recommendations
    #[arg(short, long)]
    num: Option<usize>,

    /// Print the catalog and exit
    #[arg(long)]
    list: bool,

    /// Print products whose description contains QUERY and exit
    #[arg(long, value_name = "QUERY")]
    find: Option<String>,

    /// Print an explanation for each recommendation
    #[arg(long)]
    explain: bool,

    /// Emit the response as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    if let Err(e) = run(args).await {
        match e.downcast_ref::<RecommenderError>() {
            Some(rec_err) => eprintln!("{}", rec_err.user_message()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    if let Some(path) = args.catalog {
        config.catalog.path = path;
    }
    if let Some(path) = args.transactions {
        config.transactions.path = Some(path);
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.serving.workers)
        .build_global()?;

    let state = AppState::load(config)?;

    if args.list {
        for product in state.catalog.iter() {
            match product.popularity {
                Some(popularity) => println!("{}\t{}\t{}", product.id, product.description, popularity),
                None => println!("{}\t{}\t-", product.id, product.description),
            }
        }
        return Ok(());
    }

    if let Some(query) = &args.find {
        let matches = state.catalog.search(query);
        if matches.is_empty() {
            println!("No products match '{}'", query);
        }
        for product in matches {
            println!("{}\t{}", product.id, product.description);
        }
        return Ok(());
    }

    let serving = &state.serving_service;
    let session_id = serving.create_session();

    for assignment in &args.ratings {
        let (product_id, value) = parse_rating_assignment(assignment)?;
        serving.submit_rating(session_id, &product_id, value)?;
    }

    let response = serving.request_recommendations(session_id, args.num).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("Your recommendations:");
        for rec in &response.recommendations {
            let product = state.catalog.lookup(&rec.product_id)?;
            println!("  {}: predicted rating {:.2}", product.description, rec.predicted_score);
        }
    }

    if args.explain {
        println!();
        for rec in &response.recommendations {
            println!("{}", serving.get_explanation(session_id, rec)?);
        }
        println!();
        println!("{}", serving.summarize(session_id, &response.recommendations)?);
    }

    serving.end_session(session_id);
    Ok(())
}
