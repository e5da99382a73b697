use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use lexora_backend::config::Settings;
use lexora_backend::llm::{LlmProvider, OpenAiProvider};
use lexora_backend::logging;
use lexora_backend::pipeline::Pipeline;
use lexora_backend::server::router;
use lexora_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    logging::init(Path::new(&settings.logging.dir));

    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(
        settings.llm.base_url.clone(),
        Settings::api_key(),
        settings.request_timeout(),
    )?);

    let pipeline = Arc::new(
        Pipeline::construct(&settings, provider)
            .await
            .context("Failed to build the RAG pipeline")?,
    );
    tracing::info!("pipeline ready ({} chunks indexed)", pipeline.chunk_count());

    // One-shot mode: `lexora-backend --ask "question"` prints the answer
    // and exits instead of serving.
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--ask") {
        let question = args
            .get(pos + 1)
            .context("--ask requires a question argument")?;
        let answer = pipeline.ask(question).await?;
        println!("{}", answer);
        return Ok(());
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let bind_addr = format!("{}:{}", settings.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let state = Arc::new(AppState {
        settings: Arc::new(settings),
        pipeline,
    });
    let app: Router = router::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
