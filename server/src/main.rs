use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use docrank_server::build_app;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "docrank-server")]
#[command(about = "Serve ranked search and document updates over a docrank snapshot", long_about = None)]
struct Args {
    /// Snapshot file; created on first commit if missing
    #[arg(long, default_value = "./index.json")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app: Router = build_app(args.index.clone())?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serve_local_snapshot() {
        let args = Args::try_parse_from(["docrank-server"]).unwrap();
        assert_eq!(args.index, "./index.json");
        assert_eq!(args.port, 8080);

        let args = Args::try_parse_from(["docrank-server", "--index", "/tmp/a.json", "--port", "9000"]).unwrap();
        assert_eq!(args.index, "/tmp/a.json");
        assert_eq!(args.port, 9000);
    }
}
