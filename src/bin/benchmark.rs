use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::Client;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const DURATION_SECS: u64 = 20;
const BASE_URL: &str = "http://localhost:8000";

struct Target {
    name: &'static str,
    method: &'static str,
    url: String,
    body: Option<serde_json::Value>,
}

#[tokio::main]
async fn main() {
    println!("{}", "🚀 Starting Benchmark Suite".bold().green());
    println!("Target URL: {}", BASE_URL);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    if client.get(format!("{}/health", BASE_URL)).send().await.is_err() {
        eprintln!("{}", "❌ Server is NOT reachable at localhost:8000. Please start it first.".red().bold());
        return;
    }

    println!("\n{}", "⚙️  Setting up benchmark data...".yellow());
    let tenant_id = setup_tenant(&client).await;
    let (product_id, sku) = setup_product(&client, &tenant_id).await;

    println!("{}", "✅ Data created successfully.".green());
    println!("   Tenant ID:  {}", tenant_id);
    println!("   Product ID: {}", product_id);

    let targets = vec![
        Target {
            name: "Health Check (Public)",
            method: "GET",
            url: format!("{}/health", BASE_URL),
            body: None,
        },
        Target {
            name: "Catalog Read (Master Store)",
            method: "GET",
            url: format!("{}/api/v1/catalog/{}", BASE_URL, sku),
            body: None,
        },
        Target {
            name: "Sale Event (Tenant Transaction)",
            method: "POST",
            url: format!("{}/api/v1/{}/sales", BASE_URL, tenant_id),
            body: Some(json!({
                "product_id": product_id,
                "quantity": 1
            })),
        },
    ];

    let rps_stages = vec![10, 50, 200, 1000];

    for target in targets {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking Endpoint: {}", target.name.cyan().bold());
        println!("URL: {}", target.url);
        println!("{}", "=".repeat(60));

        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&client, &target, rps).await;
        }
    }
}

async fn setup_tenant(client: &Client) -> String {
    let subdomain = format!("bench{}", Uuid::new_v4().simple());
    let res = client.post(format!("{}/api/v1/tenants", BASE_URL))
        .json(&json!({
            "store_name": "Benchmark Mart",
            "subdomain": subdomain,
            "admin_email": "bench@example.com"
        }))
        .send()
        .await
        .expect("Failed to send tenant register request");

    if !res.status().is_success() {
        panic!("Failed to register tenant: status {}", res.status());
    }

    let body: Value = res.json().await.expect("Failed to parse tenant response");
    body["tenant_id"].as_str().expect("No tenant_id").to_string()
}

async fn setup_product(client: &Client, tenant_id: &str) -> (String, String) {
    let sku = format!("BENCH-{}", Uuid::new_v4().simple());
    let res = client.post(format!("{}/api/v1/{}/products", BASE_URL, tenant_id))
        .json(&json!({
            "name": "Benchmark Cola 330ml",
            "sku": sku,
            "price": 1.5
        }))
        .send()
        .await
        .expect("Failed to create product");

    if !res.status().is_success() {
        panic!("Failed to create product: status {}", res.status());
    }

    let body: Value = res.json().await.unwrap();
    let product_id = body["id"].as_str().expect("No product id").to_string();

    // Enough stock that the sale target never runs dry mid-stage.
    let expiry = (Utc::now() + ChronoDuration::days(365)).date_naive();
    let res = client.post(format!("{}/api/v1/{}/inventory/receive", BASE_URL, tenant_id))
        .json(&json!({
            "product_id": product_id,
            "quantity": 10_000_000,
            "expiry_date": expiry
        }))
        .send()
        .await
        .expect("Failed to receive stock");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Failed to receive stock. Status: {}. Body: {}", status, txt);
    }

    (product_id, sku)
}

async fn run_stage(client: &Client, target: &Target, rps: u32) {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(rps).unwrap())
    ));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let body = target.body.clone();
            let method = target.method;
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = match method {
                    "GET" => client.get(&url).send().await,
                    "POST" => {
                        let mut req = client.post(&url);
                        if let Some(b) = body {
                            req = req.json(&b);
                        }
                        req.send().await
                    },
                    _ => client.get(&url).send().await,
                };
                let latency = req_start.elapsed();

                let success = match res {
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                };

                let _ = tx.send((latency, success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).unwrap();
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        histogram.record(latency.as_micros() as u64).unwrap();
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!(
        "{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%",
        rps,
        mean_ms,
        p99_ms,
        success_rate
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
}
