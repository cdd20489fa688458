mod error;

pub use self::error::Error;

pub type Result<T = ()> = std::result::Result<T, error::Error>;

/// Runtime context for the daemon.
///
/// Owns the shutdown event bus. Every service task listens for the
/// shutdown signal and winds down on its own; the actuator services
/// disarm their channel before returning.
pub struct RuntimeContext {
    /// Runtime shutdown bus.
    shutdown: (
        tokio::sync::broadcast::Sender<()>,
        tokio::sync::broadcast::Receiver<()>,
    ),
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            shutdown: tokio::sync::broadcast::channel(1),
        }
    }

    /// Listen for shutdown signal.
    pub fn shutdown_signal(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown.0.subscribe()
    }

    /// Spawn a service task.
    ///
    /// The service is expected to listen for the shutdown signal handed to
    /// it and terminate itself. The returned handle joins the task once it
    /// has wound down.
    pub fn spawn_service<T>(&self, service: T) -> tokio::task::JoinHandle<()>
    where
        T: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(service)
    }

    /// Trigger the shutdown signal on termination request.
    pub fn shutdown_on_signal(&self) {
        let sender = self.shutdown.0.clone();

        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();

            info!("Termination requested");

            sender.send(()).ok();
        });
    }

    /// Wait for the runtime to shutdown.
    ///
    /// This method will block until the shutdown signal is received.
    pub async fn wait_for_shutdown(&self) {
        let mut shutdown = self.shutdown_signal();

        shutdown.recv().await.ok();
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}
