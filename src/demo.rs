use chrono::Utc;
use rand::Rng;

use crate::models::NewTransfer;

const SECONDS_PER_DAY: i64 = 86_400;

/// Random illustrative transfers from the last week: 0.1–10 tokens and
/// 5–100 g CO₂ saved each.
pub fn demo_transfers(count: usize) -> Vec<NewTransfer> {
    let mut rng = rand::thread_rng();
    let now = Utc::now().timestamp();

    (0..count)
        .map(|_| {
            let amount: f64 = rng.gen_range(0.1..10.0);
            let carbon_saved: f64 = rng.gen_range(5.0..100.0);
            let days_ago: i64 = rng.gen_range(0..7);

            NewTransfer {
                from_chain: "Fuji".to_string(),
                to_chain: format!("Chain{}", rng.gen_range(0..10_000)),
                amount: format!("{:.2}", amount),
                carbon_saved: (carbon_saved * 100.0).round() / 100.0,
                timestamp: Some(now - days_ago * SECONDS_PER_DAY),
            }
        })
        .collect()
}
