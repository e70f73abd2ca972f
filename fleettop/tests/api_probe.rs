use std::time::Duration;

use fleettop::api::ApiClient;

// Integration probe: only runs when FLEETTOP_URL points at a live dashboard API.
// Example: FLEETTOP_URL=http://127.0.0.1:3232 cargo test -p fleettop --test api_probe -- --nocapture
#[tokio::test]
async fn probe_api_endpoints() {
    let url = match std::env::var("FLEETTOP_URL") {
        Ok(v) if !v.is_empty() => v,
        _ => {
            eprintln!("skipping api_probe: set FLEETTOP_URL=http://host:port to run this integration test");
            return;
        }
    };

    let client = ApiClient::new(&url, Duration::from_secs(10)).expect("valid url");
    let servers = client.fetch_summary().await.expect("summary");
    eprintln!("{} servers", servers.len());

    if let Some(s) = servers.first() {
        let events = client.fetch_event_data(&s.machine_name).await.expect("events");
        let avail = client
            .fetch_availability_data(&s.machine_name)
            .await
            .expect("availability");
        eprintln!(
            "{}: {} events, {} availability records",
            s.machine_name,
            events.len(),
            avail.len()
        );
    }
}
