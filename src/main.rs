use anyhow::Context;
use arcade_client::{
    init_tracing,
    inspect::CartridgeFetcher,
    ranking::{
        Ranking,
        format_score,
    },
    session::{
        GameSession,
        graphql_client::GraphQlRollupClient,
        notice_decoder::Utf8NoticeDecoder,
    },
};
use clap::Parser;
use std::{
    fs,
    path::PathBuf,
    time::Duration,
};
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// GraphQL endpoint of the rollup node
    #[arg(short, long)]
    graphql_url: Url,

    /// Inspect endpoint of the rollup node, needed for cartridge downloads
    #[arg(short, long)]
    inspect_url: Option<Url>,

    /// Cartridge id of the game to open
    #[arg(long)]
    game_id: String,

    /// Await the score produced by this input and merge it into the ranking
    #[arg(long)]
    watch_input: Option<u64>,

    /// Check the replay verification outcome of this input
    #[arg(long)]
    verify_input: Option<u64>,

    /// Download the cartridge binary to this path
    #[arg(long)]
    download_cartridge: Option<PathBuf>,

    /// Grace period in milliseconds before falling back to the error
    /// report lookup
    #[arg(long, default_value = "1000")]
    grace_period_ms: u64,

    #[arg(short, long, default_value = "false")]
    tracing: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.tracing {
        init_tracing();
    }

    tracing::info!(
        "Opening game {} against {}",
        args.game_id,
        args.graphql_url
    );
    let query = GraphQlRollupClient::new(args.graphql_url.clone());
    let mut session = GameSession::new(query, Utf8NoticeDecoder, args.game_id.clone())
        .with_grace_period(Duration::from_millis(args.grace_period_ms));

    if let Err(err) = session.load_ranking().await {
        // Show an empty board rather than failing the whole view; the
        // watcher flows below still report their own errors.
        tracing::warn!(%err, "could not load the score history");
    }
    print_ranking(session.ranking());

    if let Some(input_index) = args.watch_input {
        match session.await_score_result(input_index).await {
            Ok(record) => {
                session.apply_score(&record);
                println!();
                println!("Score confirmed: {} - {}", record.player, record.score);
                print_ranking(session.ranking());
            }
            Err(err) => {
                println!();
                println!("{err}");
            }
        }
    }

    if let Some(input_index) = args.verify_input {
        println!();
        match session.await_replay_verification(input_index).await {
            Ok(()) => println!("Replay verified"),
            Err(err) => println!("{err}"),
        }
    }

    if let Some(path) = args.download_cartridge {
        let inspect_url = args
            .inspect_url
            .context("--download-cartridge needs --inspect-url")?;
        let fetcher = CartridgeFetcher::new(inspect_url);
        let data = fetcher.cartridge(&args.game_id).await;
        println!();
        if data.is_empty() {
            println!("No cartridge data for {}", args.game_id);
        } else {
            fs::write(&path, &data)
                .with_context(|| format!("writing cartridge to {}", path.display()))?;
            println!(
                "Cartridge downloaded to {} ({} bytes)",
                path.display(),
                data.len()
            );
        }
    }

    Ok(())
}

fn print_ranking(ranking: &Ranking) {
    println!("== Ranking ==");
    let Some(leader) = ranking.leader() else {
        println!("Be the first to play!");
        return;
    };
    println!("1. {} - {}", leader.user, leader.score);
    for (place, entry) in ranking.entries().iter().enumerate().skip(1) {
        println!(
            "{}. {} - {}",
            place + 1,
            entry.user,
            format_score(leader.score, entry.score)
        );
    }
}
