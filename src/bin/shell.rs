//! Interactive storefront shell.
//!
//! Reads one command per line from stdin and prints the current page of
//! products to stdout. Logs go to stderr.

use std::path::PathBuf;

use storefront::affiliate::affiliate_link;
use storefront::search::{SessionPhase, SessionState};
use storefront::startup;
use storefront_catalog::ProductCatalog;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  <text>               search for text
  search <text>        search for text (blank clears the search)
  category <id>        browse a category
  categories           list categories and subcategories
  sub <name>           search a subcategory, e.g. `sub skin care`
  market <id>          switch marketplace
  markets              list marketplaces
  open <n>             print the tagged link of result n
  usage                provider usage counters
  refresh              run the current search again
  help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront=warn,storefront_catalog=warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                config_path = Some(PathBuf::from(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("{arg} requires a path"))?,
                ));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let config = startup::load_config(config_path.as_deref())?;
    let storefront = startup::initialize(config).await?;
    let session = storefront.session();

    let mut updates = session.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            if updates.borrow_and_update().phase == SessionPhase::Fetching {
                eprintln!("searching...");
            }
        }
    });

    println!(
        "storefront shell ({}). type `help` for commands.",
        session.marketplace().domain
    );
    session.refresh().await;
    print_page(&session.state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "categories" => {
                for category in storefront.orchestrator.taxonomy().categories() {
                    println!("{:<10} {}", category.id, category.label);
                    for sub in &category.subcategories {
                        println!("           - {sub}");
                    }
                }
            }
            "markets" => {
                let current = session.marketplace().id;
                for m in storefront.marketplaces.registry().all() {
                    let marker = if m.id == current { "*" } else { " " };
                    println!("{marker} {:<3} {:<16} {}", m.id, m.name, m.domain);
                }
            }
            "usage" => {
                for usage in storefront.orchestrator.catalog().usage_stats() {
                    println!(
                        "{:<16} requests={} ok={} failed={} products={} circuit={:?}",
                        usage.provider.name(),
                        usage.requests,
                        usage.successes,
                        usage.failures,
                        usage.products_returned,
                        usage.circuit
                    );
                }
            }
            "open" => {
                let state = session.state();
                let index = rest.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
                match index.and_then(|i| state.products.get(i)) {
                    Some(product) => println!("{}", affiliate_link(product, &session.marketplace())),
                    None => println!("no result {rest:?}"),
                }
            }
            "search" => {
                session.set_search_text(rest).await;
                print_page(&session.state());
            }
            "category" => {
                if storefront.orchestrator.taxonomy().category(rest).is_none() {
                    println!("unknown category {rest:?}");
                    continue;
                }
                session.set_category(rest).await;
                print_page(&session.state());
            }
            "sub" => {
                session.select_subcategory(rest).await;
                print_page(&session.state());
            }
            "market" => match session.set_marketplace(rest).await {
                Ok(_) => print_page(&session.state()),
                Err(e) => println!("{e}"),
            },
            "refresh" => {
                session.refresh().await;
                print_page(&session.state());
            }
            _ => {
                session.set_search_text(line).await;
                print_page(&session.state());
            }
        }
    }

    Ok(())
}

fn print_page(state: &SessionState) {
    let query = state.resolved_query.as_deref().unwrap_or_default();
    let source = state
        .source
        .map(|s| format!("{s:?}").to_lowercase())
        .unwrap_or_default();
    println!(
        "[{}] {query:?}: {} products ({source})",
        state.marketplace_id,
        state.products.len()
    );
    for (i, product) in state.products.iter().enumerate() {
        let prime = if product.prime { " prime" } else { "" };
        println!(
            "{:>3}. {} | {} | {:.1}* ({} reviews){prime}",
            i + 1,
            product.title,
            if product.price.is_empty() { "-" } else { product.price.as_str() },
            product.rating,
            product.reviews
        );
    }
}
