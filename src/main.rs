use anyhow::Context;

mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the real environment.
    let dotenv = dotenvy::dotenv();

    telemetry::init().context("failed to install tracing subscriber")?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => tracing::debug!("no .env file, using process environment"),
        Err(e) => return Err(e).context("failed to read .env"),
    }

    api::start().await.context("api server failed")?;

    Ok(())
}
