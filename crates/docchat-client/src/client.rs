use std::rc::Rc;

use crate::config::{ClientConfig, TransportKind};
use crate::controller::{ConversationController, RequestState, SendOutcome};
use crate::error::ConfigError;
use crate::spawn::Spawner;
use crate::store::KeyValueBackend;
use crate::timer::Timer;
use crate::transport::{HttpTransport, SocketConnector, SocketTransport, Transport};
use crate::view::ChatView;

/// Build the transport the configuration asks for
pub fn build_transport(
    config: &ClientConfig,
    timer: Rc<dyn Timer>,
    spawner: Rc<dyn Spawner>,
    connector: Option<Box<dyn SocketConnector>>,
) -> Result<Box<dyn Transport>, ConfigError> {
    match config.transport {
        TransportKind::Http => Ok(Box::new(HttpTransport::from_config(config, timer))),
        TransportKind::Socket => {
            let connector = connector.ok_or(ConfigError::MissingConnector)?;
            Ok(Box::new(SocketTransport::from_config(config, connector, timer, spawner)))
        }
    }
}

/// One chat client per page: owns the transport and the view binding
pub struct ChatClient<V, B> {
    config: ClientConfig,
    controller: ConversationController<Box<dyn Transport>, V, B>,
}

impl<V, B> ChatClient<V, B>
where
    V: ChatView,
    B: KeyValueBackend,
{
    pub fn new(
        config: ClientConfig,
        timer: Rc<dyn Timer>,
        spawner: Rc<dyn Spawner>,
        connector: Option<Box<dyn SocketConnector>>,
        view: V,
        backend: B,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = build_transport(&config, timer, spawner, connector)?;
        Self::with_transport(config, transport, view, backend)
    }

    /// Use an already built transport
    pub fn with_transport(
        config: ClientConfig,
        transport: Box<dyn Transport>,
        view: V,
        backend: B,
    ) -> Result<Self, ConfigError> {
        if config.database_name.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }

        log::info!(
            "Chat client ready: {} transport to {}",
            config.transport.as_str(),
            config.endpoint
        );
        let controller = ConversationController::from_config(&config, transport, view, backend);
        Ok(Self { config, controller })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn controller(&self) -> &ConversationController<Box<dyn Transport>, V, B> {
        &self.controller
    }

    pub fn state(&self) -> RequestState {
        self.controller.state()
    }

    pub fn load(&self) -> usize {
        self.controller.load()
    }

    pub async fn send(&self, input: &str) -> SendOutcome {
        self.controller.send(input).await
    }

    pub async fn clear(&self) -> bool {
        self.controller.clear().await
    }

    /// Tear down the transport
    pub async fn shutdown(&self) {
        log::info!("Shutting down chat client for {}", self.config.endpoint);
        self.controller.shutdown().await;
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<V, B> ChatClient<V, B>
where
    V: ChatView,
    B: KeyValueBackend,
{
    /// Client wired with tokio and the tungstenite connector
    ///
    /// A socket client spawns local tasks, so it must run inside a
    /// `tokio::task::LocalSet`.
    pub fn native(config: ClientConfig, view: V, backend: B) -> Result<Self, ConfigError> {
        let connector: Box<dyn SocketConnector> = Box::new(crate::native::TungsteniteConnector::new());
        Self::new(
            config,
            Rc::new(crate::native::TokioTimer),
            Rc::new(crate::native::TokioSpawner),
            Some(connector),
            view,
            backend,
        )
    }
}
