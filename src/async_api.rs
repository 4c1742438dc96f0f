use crate::assets::{AssetFetcher, HttpFetcher};
use crate::{Dispatcher, Error, RenderConfig, RenderedImage, Result, SharePayload};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Render(SharePayload, oneshot::Sender<Result<RenderedImage>>),
    RenderJson(String, oneshot::Sender<Result<RenderedImage>>),
    Overlay(Vec<String>, Option<String>, oneshot::Sender<Result<RenderedImage>>),
    Close(oneshot::Sender<Result<()>>),
}

/// A share-card renderer backed by a dedicated worker thread.
///
/// The worker thread owns the [`Dispatcher`] and a single-threaded runtime
/// and serves requests one at a time, so callers on any runtime can await
/// renders without sharing a surface across threads.
#[derive(Clone)]
pub struct ShareWorker {
    cmd_tx: Sender<Command>,
}

impl ShareWorker {
    /// Spawn a worker fetching assets over HTTP from `config.asset_origin`.
    pub async fn spawn(config: RenderConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Self::spawn_with(config, Arc::new(fetcher)).await
    }

    /// Spawn a worker with a caller-provided asset source.
    pub async fn spawn_with(config: RenderConfig, fetcher: Arc<dyn AssetFetcher>) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(err) => {
                    let _ = init_tx.send(Err(Error::Other(format!("Failed to start worker runtime: {}", err))));
                    return;
                }
            };
            let dispatcher = Dispatcher::new(config, fetcher);
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Render(payload, resp) => {
                        let res = runtime.block_on(dispatcher.handle_request(&payload));
                        let _ = resp.send(res);
                    }
                    Command::RenderJson(raw, resp) => {
                        let res = runtime.block_on(dispatcher.handle_json(&raw));
                        let _ = resp.send(res);
                    }
                    Command::Overlay(layers, caption, resp) => {
                        let res = runtime.block_on(dispatcher.render_overlay(&layers, caption.as_deref()));
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
            log::debug!("share worker stopped");
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| Error::Other("Share worker has stopped".to_string()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Render canceled: {}", e)))?
    }

    pub async fn render(&self, payload: SharePayload) -> Result<RenderedImage> {
        self.request(|tx| Command::Render(payload, tx)).await
    }

    pub async fn render_json(&self, raw: &str) -> Result<RenderedImage> {
        let raw = raw.to_string();
        self.request(|tx| Command::RenderJson(raw, tx)).await
    }

    pub async fn render_overlay(&self, layers: Vec<String>, caption: Option<String>) -> Result<RenderedImage> {
        self.request(|tx| Command::Overlay(layers, caption, tx)).await
    }

    /// Shutdown the background worker.
    pub async fn close(self) -> Result<()> {
        self.request(Command::Close).await
    }
}
