use mock_service::MockOptions;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("drove=debug,drove_runtime=debug,mock_service=info"));
        // NOTE: Another test binary may already have installed one.
        let _ = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Start a mock glossary and return its base URL.
#[allow(unused)]
pub async fn mock(options: MockOptions) -> String {
    let addr = mock_service::spawn(options).await.unwrap();
    format!("http://{addr}")
}

/// An address nothing listens on.
#[allow(unused)]
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
