use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;

// Per-call deadlines (video info 10 s, media 20 s) override this ceiling.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}
