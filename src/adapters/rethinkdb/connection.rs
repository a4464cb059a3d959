use crate::adapters::rethinkdb::endpoint::resolve_endpoint;
use crate::domain::model::{Connection, Endpoint};
use crate::domain::ports::{Connector, Query, Session};
use crate::utils::error::{EtlError, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// 依序嘗試每個端點，回傳第一個連上的 session
pub struct DefaultConnectionFactory {
    endpoints: Vec<Endpoint>,
    connector: Arc<dyn Connector>,
}

impl DefaultConnectionFactory {
    pub fn new(endpoints: Vec<Endpoint>, connector: Arc<dyn Connector>) -> Self {
        Self {
            endpoints,
            connector,
        }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub async fn get(&self) -> Result<Box<dyn Session>> {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            match self.connector.connect(endpoint).await {
                Ok(session) => return Ok(session),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", endpoint, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| EtlError::ConnectionError {
            endpoint: "<none>".to_string(),
            message: "no endpoints configured".to_string(),
        }))
    }
}

impl fmt::Debug for DefaultConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultConnectionFactory")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// 連線失敗或逾時時重試
#[derive(Debug)]
pub struct ReliableConnectionFactory {
    inner: DefaultConnectionFactory,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ReliableConnectionFactory {
    pub fn new(inner: DefaultConnectionFactory) -> Self {
        Self {
            inner,
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        self.inner.endpoints()
    }

    pub async fn get(&self) -> Result<Box<dyn Session>> {
        let inner = &self.inner;
        self.retry(move || inner.get()).await
    }

    pub async fn run(&self, query: &Query) -> Result<serde_json::Value> {
        let inner = &self.inner;
        self.retry(move || async move {
            let mut session = inner.get().await?;
            session.run(query).await
        })
        .await
    }

    pub(crate) async fn retry<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {}, retrying",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// 重複使用閒置 session，每個查詢都受 query_timeout 限制
pub struct PoolingConnectionFactory {
    inner: ReliableConnectionFactory,
    query_timeout: Duration,
    idle: Mutex<Vec<Box<dyn Session>>>,
}

impl PoolingConnectionFactory {
    pub fn new(inner: ReliableConnectionFactory, query_timeout: Duration) -> Self {
        Self {
            inner,
            query_timeout,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        self.inner.endpoints()
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub async fn idle_count(&self) -> usize {
        self.idle.lock().await.len()
    }

    /// 取閒置 session，沒有時直接向端點開新連線；重試由外層負責
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        let pooled = self.idle.lock().await.pop();
        match pooled {
            Some(session) => Ok(session),
            None => self.inner.inner.get().await,
        }
    }

    async fn run_once(&self, query: &Query) -> Result<serde_json::Value> {
        let mut session = self.acquire().await?;

        let outcome = tokio::time::timeout(self.query_timeout, session.run(query)).await;
        match outcome {
            Ok(Ok(value)) => {
                self.idle.lock().await.push(session);
                Ok(value)
            }
            // a failed session is not returned to the pool
            Ok(Err(e)) => Err(e),
            Err(_) => Err(EtlError::QueryTimeout {
                millis: self.query_timeout.as_millis() as u64,
            }),
        }
    }

    /// 失敗的 session 會被丟棄，重試時改用另一個閒置或新開的 session
    pub async fn run(&self, query: &Query) -> Result<serde_json::Value> {
        let pool = self;
        self.inner.retry(move || pool.run_once(query)).await
    }
}

impl fmt::Debug for PoolingConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolingConnectionFactory")
            .field("inner", &self.inner)
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ConnectionFactory {
    /// 多節點叢集：pooling(reliable(default))
    Pooled(PoolingConnectionFactory),
    /// 單一節點：reliable(default)
    Reliable(ReliableConnectionFactory),
}

impl ConnectionFactory {
    pub fn is_pooled(&self) -> bool {
        matches!(self, ConnectionFactory::Pooled(_))
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        match self {
            ConnectionFactory::Pooled(factory) => factory.endpoints(),
            ConnectionFactory::Reliable(factory) => factory.endpoints(),
        }
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        match self {
            ConnectionFactory::Pooled(factory) => Some(factory.query_timeout()),
            ConnectionFactory::Reliable(_) => None,
        }
    }

    pub async fn run(&self, query: &Query) -> Result<serde_json::Value> {
        match self {
            ConnectionFactory::Pooled(factory) => factory.run(query).await,
            ConnectionFactory::Reliable(factory) => factory.run(query).await,
        }
    }

    pub fn describe(&self) -> String {
        let endpoints = self
            .endpoints()
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        match self {
            ConnectionFactory::Pooled(factory) => format!(
                "pooling(reliable(default[{}]), timeout={:?})",
                endpoints,
                factory.query_timeout()
            ),
            ConnectionFactory::Reliable(_) => format!("reliable(default[{}])", endpoints),
        }
    }
}

/// 依連線定義建立連線工廠
///
/// 有列出 servers 時走叢集路徑（含 pooling），否則只用單一的 server/port。
pub fn build_connection_factory(
    connection: &Connection,
    connector: Arc<dyn Connector>,
) -> ConnectionFactory {
    if !connection.servers.is_empty() {
        let endpoints = connection
            .servers
            .iter()
            .map(|server| resolve_endpoint(&server.name, server.port))
            .collect();

        return ConnectionFactory::Pooled(PoolingConnectionFactory::new(
            ReliableConnectionFactory::new(DefaultConnectionFactory::new(endpoints, connector)),
            Duration::from_secs(connection.request_timeout),
        ));
    }

    let endpoint = resolve_endpoint(&connection.server, connection.port);
    ConnectionFactory::Reliable(ReliableConnectionFactory::new(
        DefaultConnectionFactory::new(vec![endpoint], connector),
    ))
}
