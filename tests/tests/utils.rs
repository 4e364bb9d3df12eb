use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

pub const MOCK_ADDR: &str = "127.0.0.1:3005";

#[allow(unused)]
pub async fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
            std::process::exit(1);
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("stampede=debug,mock_service=debug")
            .try_init();

        // The server needs a runtime that outlives whichever test runtime
        // happens to call init() first, so it gets its own thread.
        std::thread::spawn(|| {
            let addr: SocketAddr = MOCK_ADDR.parse().expect("mock address");
            let rt = tokio::runtime::Runtime::new().expect("mock service runtime");
            rt.block_on(mock_service::run(addr));
        });
    });

    // A caller can win the race against the listener; poll until it accepts.
    for _ in 0..50 {
        if std::net::TcpStream::connect(MOCK_ADDR).is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("mock service never came up on {MOCK_ADDR}");
}

#[allow(unused)]
pub fn mock_host() -> String {
    format!("http://{MOCK_ADDR}")
}
