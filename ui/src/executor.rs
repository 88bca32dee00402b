use std::future::Future;

use iced::executor::Executor;
use iced::futures;
use tokio::runtime::{Builder, Runtime};

const TOKIO_WORKER_STACK_SIZE_BYTES: usize = 4_200_000;

/// Runs every command future and engine task on one tokio worker, so panel
/// handlers interleave at await points instead of running in parallel.
#[derive(Debug)]
pub struct PanelExecutor {
    runtime: Runtime,
}

impl Executor for PanelExecutor {
    fn new() -> Result<Self, futures::io::Error> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("qbctl-engine")
            .thread_stack_size(TOKIO_WORKER_STACK_SIZE_BYTES)
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    fn spawn(&self, future: impl Future<Output = ()> + Send + 'static) {
        let _ = self.runtime.spawn(future);
    }

    fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.runtime.enter();
        f()
    }
}
