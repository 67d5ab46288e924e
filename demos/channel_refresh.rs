//! Example: Refreshing from a channel
//!
//! This example feeds synthetic master sheet rows through a channel and
//! watches the cache react: live rows, an outage served from cache, and a
//! mostly blank row rejected as a schema mismatch.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example channel_refresh
//! ```

use std::sync::Arc;

use batchwatch::data::layout::DEFAULT_WIDTH;
use batchwatch::{Dashboard, Pipeline, RefreshPolicy, Refresher};
use batchwatch_sources::{ChannelSource, FetchError, SourceRef};

fn row(total_batches: u64, deviations: u64) -> Vec<String> {
    let mut cells = vec![String::new(); DEFAULT_WIDTH];
    let values = [
        (0, total_batches.to_string()),
        (1, (total_batches - 15).to_string()),
        (2, "15".to_string()),
        (3, "96.3".to_string()),
        (6, "98.2".to_string()),
        (7, "1,247".to_string()),
        (8, "23".to_string()),
        (9, "145".to_string()),
        (10, "2,840".to_string()),
        (11, "89,500".to_string()),
        (14, deviations.to_string()),
        (15, "1".to_string()),
        (20, "156".to_string()),
        (21, "12".to_string()),
        (22, "3".to_string()),
    ];
    for (index, value) in values {
        cells[index] = value;
    }
    cells
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Channel refresh example\n");

    // Create a channel source - this returns both a sender and the source
    let (tx, client) = ChannelSource::create("synthetic-rows");
    let source = SourceRef::new("synthetic", None, "H2:AD2".parse()?);
    let refresher = Refresher::new(
        Arc::new(client),
        source,
        Pipeline::master_sheet()?,
        RefreshPolicy::default(),
    );
    let cache = refresher.cache();

    let steps: Vec<(&str, Option<Result<Vec<String>, FetchError>>)> = vec![
        ("first live row", Some(Ok(row(147, 8)))),
        ("second live row", Some(Ok(row(152, 6)))),
        ("upstream outage", Some(Err(FetchError::Network("connection reset".into())))),
        ("mostly blank row", Some(Ok(vec!["147".to_string()]))),
        ("recovered", Some(Ok(row(155, 4)))),
    ];

    for (label, next) in steps {
        tx.send(next)?;
        let outcome = refresher.refresh_now().await;
        let entry = cache.get();

        println!("{label}: {outcome:?}");
        println!(
            "  source={} total_batches={:?} last_error={:?}",
            entry.source_kind,
            entry.snapshot.value("total_batches"),
            entry.last_error
        );
        for (name, kpi) in &entry.kpis {
            println!(
                "  {} {:<20} {:>8.1} ({:+.1}%)",
                kpi.status.symbol(),
                name,
                kpi.value,
                kpi.change_percent
            );
        }
        println!();
    }

    let dashboard = Dashboard::compose(cache.as_ref(), Some(42));
    println!("{}", serde_json::to_string_pretty(&dashboard.deviation_analysis)?);

    Ok(())
}
