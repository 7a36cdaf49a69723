//! FedHub Server 入口

use anyhow::Result;
use clap::Parser;
use fedhub_server::config::ServerConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// 成员集群注册与资源同步服务
#[derive(Debug, Parser)]
#[command(name = "fedhub-server", version, about)]
struct Args {
    /// 配置文件路径（YAML 或 JSON）
    #[arg(short, long, env = "FEDHUB_CONFIG")]
    config: Option<PathBuf>,

    /// 日志级别，覆盖配置文件中的设置
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref())?;

    // RUST_LOG 优先
    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    fedhub_server::serve(config).await
}
