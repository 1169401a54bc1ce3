//! `treatorhell check-store` — Verify the Upstash Redis connection.

use treatorhell_config::AppConfig;
use treatorhell_storage::UpstashBackend;

const TEST_KEY: &str = "test_key";
const TEST_VALUE: &str = "test_value";

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Some((url, token)) = config.storage.remote_credentials() else {
        println!("❌ No remote store configured.");
        println!();
        println!("Set one of these pairs of environment variables:");
        println!("  - UPSTASH_KV_REST_API_URL and UPSTASH_KV_REST_API_TOKEN");
        println!("  - KV_REST_API_URL and KV_REST_API_TOKEN");
        return Err("remote store credentials missing".into());
    };

    match exercise(url, token).await {
        Ok(()) => {
            println!();
            println!("✅ Upstash Redis connection validated successfully!");
            Ok(())
        }
        Err(e) => {
            println!();
            println!("❌ Error connecting to Upstash Redis: {e}");
            Err(e)
        }
    }
}

async fn exercise(url: &str, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = UpstashBackend::new(url, token)?;
    println!("🔍 Checking Upstash Redis at {}", store.host());

    store.set(TEST_KEY, TEST_VALUE).await?;
    println!("✓ Successfully wrote to Redis");

    let value = store.get(TEST_KEY).await?;
    println!(
        "✓ Successfully read from Redis: {}",
        value.as_deref().unwrap_or("<missing>")
    );
    if value.as_deref() != Some(TEST_VALUE) {
        return Err(format!("read back {value:?}, expected {TEST_VALUE:?}").into());
    }

    store.del(TEST_KEY).await?;
    println!("✓ Successfully deleted test key");
    Ok(())
}
