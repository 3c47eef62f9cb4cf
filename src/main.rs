use social_graph::{config::Config, state::AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(config: &Config) {
    let json = config.json_logs();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// 初始化存储（SurrealDB 后端会创建表和唯一索引）并检查服务能正常装配
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config);

    info!("Starting social-graph ({})...", config.environment);

    let state = match AppState::new(config).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return Err(anyhow::anyhow!("Storage initialization failed: {}", e));
        }
    };

    info!(
        "social-graph ready: storage={:?}, production={}",
        state.config.storage_backend,
        state.is_production()
    );
    Ok(())
}
