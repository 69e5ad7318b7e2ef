//! In-process probe: drives the engine through a scripted random scenario and
//! prints tick snapshots as JSON lines. Useful for eyeballing price dynamics
//! and book behavior without a transport.

use anyhow::{bail, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use market_engine::{
    BookConfig, EngineConfig, MarketEngine, OrderSpec, PlayerId, PriceMode, Side,
};

#[derive(Debug, Parser)]
#[command(name = "market-probe", about = "Drive the market engine through a scripted scenario")]
struct Args {
    /// Ticks to run after the warmup
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// Number of probe traders
    #[arg(long, default_value_t = 4)]
    bots: usize,

    /// Seed for the scenario, the book and the price process
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Price mode: "orderflow" or "news"
    #[arg(long, default_value = "news")]
    mode: String,

    /// Print a snapshot every N ticks
    #[arg(long, default_value_t = 10)]
    print_every: u64,

    /// Push a random news shock every N ticks
    #[arg(long)]
    news_every: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let mode = match args.mode.as_str() {
        "orderflow" => PriceMode::Orderflow,
        "news" => PriceMode::News,
        other => bail!("unknown mode {other:?}, expected \"orderflow\" or \"news\""),
    };

    let mut engine = MarketEngine::new(
        EngineConfig { seed: args.seed, mode, ..Default::default() },
        BookConfig { seed: args.seed, ..Default::default() },
    )?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let bots: Vec<PlayerId> =
        (0..args.bots).map(|i| engine.register_player(format!("probe-{i}")).id).collect();

    // Warm the ambient book before the scenario starts.
    for _ in 0..20 {
        engine.step_tick();
    }

    for tick in 1..=args.ticks {
        for &bot in &bots {
            if rng.gen_bool(0.4) {
                submit_random_order(&mut engine, &mut rng, bot);
            }
            if rng.gen_bool(0.02) {
                engine.cancel_orders(bot, None);
            }
        }
        if let Some(every) = args.news_every {
            if tick % every == 0 {
                let delta = rng.gen_range(-3.0..3.0);
                engine.push_news(delta);
            }
        }
        let snapshot = engine.step_tick();
        if tick % args.print_every == 0 {
            println!("{}", serde_json::to_string(&snapshot)?);
        }
    }

    let trades = engine.get_recent_trades(u64::MAX);
    eprintln!(
        "ran {} ticks, {} trades, final price {:.2}",
        args.ticks,
        trades.len(),
        engine.get_snapshot().price
    );
    Ok(())
}

fn submit_random_order(engine: &mut MarketEngine, rng: &mut StdRng, bot: PlayerId) {
    let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
    let qty = rng.gen_range(1..=20) as f64;
    let spec = if rng.gen_bool(0.5) {
        OrderSpec::market(side, qty)
    } else {
        let top = engine.get_top_of_book(1);
        let Some(mid) = top.mid else {
            return;
        };
        let offset = rng.gen_range(-2.0..2.0);
        OrderSpec::limit(side, mid + offset, qty)
    };
    engine.submit_order(bot, spec);
}
