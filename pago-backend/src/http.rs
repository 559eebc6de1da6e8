use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

// Every outbound call goes through one pooled client with a hard deadline,
// so a stuck collaborator cannot hang a turn indefinitely.
static SHARED: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(90))
        .build()
        .expect("failed to build shared HTTP client")
});

pub fn shared_client() -> &'static Client {
    &SHARED
}
