//! Container health probe: exits non-zero unless the service answers.
//!
//! Takes the URL to check as its only argument, defaulting to the local
//! `/api/health` endpoint on `$PORT`.

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::args().len() > 2 {
        return Err("`mcprobe-healthcheck` takes at most one argument.".into());
    }
    let url = std::env::args().nth(1).unwrap_or_else(|| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_owned());
        format!("http://127.0.0.1:{port}/api/health")
    });
    reqwest::get(&url).await?.error_for_status()?;
    println!("Health check of {url} succeeded");
    Ok(())
}
