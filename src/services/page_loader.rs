//! 页面加载服务 - 业务能力层
//!
//! 只负责"把页面导航到入口文件并等到就绪"，按加载策略逐级降级

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{DeckError, DeckResult};
use crate::infrastructure::JsExecutor;

const SNAPSHOT_JS: &str = r#"
(() => ({
    url: document.URL,
    readyState: document.readyState
}))()
"#;

/// 页面就绪判定标准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// 文档加载完成且静默窗口内没有未完成的网络请求
    NetworkIdle,
    /// DOM 解析完成
    DomContentLoaded,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::NetworkIdle => write!(f, "networkidle"),
            ReadinessState::DomContentLoaded => write!(f, "domcontentloaded"),
        }
    }
}

/// 一级加载策略：就绪标准 + 超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTier {
    pub state: ReadinessState,
    pub timeout: Duration,
}

impl LoadTier {
    pub fn new(state: ReadinessState, timeout: Duration) -> Self {
        Self { state, timeout }
    }
}

/// 加载结果
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub url: String,
    pub state: ReadinessState,
    pub elapsed_ms: u64,
    /// 是否使用了降级策略
    pub fallback_used: bool,
}

/// 页面状态快照
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub ready_state: String,
    /// 尚未完成的网络请求数，来自网络事件而非页面脚本
    #[serde(skip)]
    pub in_flight: usize,
}

/// 根据连续的快照判断页面是否达到就绪标准
#[derive(Debug)]
pub struct ReadinessTracker {
    state: ReadinessState,
    quiet: Duration,
    idle_since: Option<Instant>,
}

impl ReadinessTracker {
    pub fn new(state: ReadinessState, quiet: Duration) -> Self {
        Self {
            state,
            quiet,
            idle_since: None,
        }
    }

    /// 记录一次快照，返回是否已就绪
    pub fn observe(&mut self, snapshot: &PageSnapshot, now: Instant) -> bool {
        // 导航尚未提交时仍是旧的空白文档
        if snapshot.url.is_empty() || snapshot.url == "about:blank" {
            self.idle_since = None;
            return false;
        }

        match self.state {
            ReadinessState::DomContentLoaded => {
                matches!(snapshot.ready_state.as_str(), "interactive" | "complete")
            }
            ReadinessState::NetworkIdle => {
                if snapshot.ready_state != "complete" || snapshot.in_flight > 0 {
                    self.idle_since = None;
                    return false;
                }

                let idle_since = *self.idle_since.get_or_insert(now);
                now.duration_since(idle_since) >= self.quiet
            }
        }
    }
}

/// 跟踪页面上尚未完成的网络请求
///
/// 订阅 `Network.requestWillBeSent` / `loadingFinished` / `loadingFailed`，
/// 后台任务在监听器被丢弃时停止。
pub struct NetworkMonitor {
    pending: Arc<Mutex<HashSet<String>>>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    /// 启用网络域并开始监听，需在导航之前调用
    pub async fn attach(page: &Page) -> DeckResult<Self> {
        let listen_error = |e| DeckError::script("监听网络请求", e);

        page.execute(EnableParams::default()).await.map_err(listen_error)?;
        let mut sent = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listen_error)?;
        let mut finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(listen_error)?;
        let mut failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listen_error)?;

        let pending = Arc::new(Mutex::new(HashSet::new()));
        let tracked = pending.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = sent.next() => {
                        tracked.lock().await.insert(event.request_id.inner().clone());
                    }
                    Some(event) = finished.next() => {
                        tracked.lock().await.remove(event.request_id.inner());
                    }
                    Some(event) = failed.next() => {
                        tracked.lock().await.remove(event.request_id.inner());
                    }
                    else => break,
                }
            }
        });

        Ok(Self { pending, task })
    }

    /// 当前未完成的请求数
    pub async fn in_flight(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 页面加载服务
pub struct PageLoader {
    poll_interval: Duration,
    network_quiet: Duration,
}

impl PageLoader {
    pub fn new(poll_interval: Duration, network_quiet: Duration) -> Self {
        Self {
            poll_interval,
            network_quiet,
        }
    }

    /// 按策略依次尝试加载
    ///
    /// 只有导航超时会降级到下一级策略，其它错误直接返回；
    /// 最后一级超时则返回 [`DeckError::NavigationTimeout`]。
    pub async fn load(
        &self,
        executor: &JsExecutor,
        url: &str,
        tiers: &[LoadTier],
    ) -> DeckResult<LoadOutcome> {
        load_with_fallback(url, tiers, move |tier| self.load_tier(executor, url, tier)).await
    }

    /// 导航并等待单级就绪标准，整体受超时约束
    async fn load_tier(
        &self,
        executor: &JsExecutor,
        url: &str,
        tier: LoadTier,
    ) -> DeckResult<Duration> {
        info!("🌐 正在加载: {} (等待 {}, 超时 {}秒)", url, tier.state, tier.timeout.as_secs());
        let started = Instant::now();

        let navigate_and_wait = async {
            let monitor = NetworkMonitor::attach(executor.page()).await?;
            let response = executor
                .page()
                .execute(NavigateParams::new(url))
                .await
                .map_err(|e| DeckError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

            if let Some(error_text) = &response.result.error_text {
                return Err(DeckError::Navigation {
                    url: url.to_string(),
                    reason: error_text.clone(),
                });
            }

            self.wait_until_ready(executor, &monitor, tier.state).await
        };

        match timeout(tier.timeout, navigate_and_wait).await {
            Ok(Ok(())) => {
                debug!("页面就绪 ({}), 用时 {:?}", tier.state, started.elapsed());
                Ok(started.elapsed())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DeckError::NavigationTimeout {
                url: url.to_string(),
                state: tier.state.to_string(),
                timeout_secs: tier.timeout.as_secs(),
            }),
        }
    }

    async fn wait_until_ready(
        &self,
        executor: &JsExecutor,
        monitor: &NetworkMonitor,
        state: ReadinessState,
    ) -> DeckResult<()> {
        let mut tracker = ReadinessTracker::new(state, self.network_quiet);

        loop {
            match executor.eval_as::<PageSnapshot>("读取页面状态", SNAPSHOT_JS).await {
                Ok(mut snapshot) => {
                    snapshot.in_flight = monitor.in_flight().await;
                    if tracker.observe(&snapshot, Instant::now()) {
                        return Ok(());
                    }
                }
                // 文档切换期间执行上下文可能暂时不可用
                Err(e) => debug!("页面状态暂不可读: {}", e),
            }
            sleep(self.poll_interval).await;
        }
    }
}

/// 逐级执行 `attempt`，导航超时时降级到下一级
async fn load_with_fallback<F, Fut>(
    url: &str,
    tiers: &[LoadTier],
    mut attempt: F,
) -> DeckResult<LoadOutcome>
where
    F: FnMut(LoadTier) -> Fut,
    Fut: Future<Output = DeckResult<Duration>>,
{
    let (last, fallbacks) = tiers
        .split_last()
        .ok_or_else(|| DeckError::Config("没有配置任何加载策略".to_string()))?;

    let mut fallback_used = false;
    for tier in fallbacks {
        match attempt(*tier).await {
            Ok(elapsed) => return Ok(outcome(url, tier, elapsed, fallback_used)),
            Err(e) if e.is_navigation_timeout() => {
                warn!("⚠️ {}，降级为下一级加载策略", e);
                fallback_used = true;
            }
            Err(e) => return Err(e),
        }
    }

    let elapsed = attempt(*last).await?;
    Ok(outcome(url, last, elapsed, fallback_used))
}

fn outcome(url: &str, tier: &LoadTier, elapsed: Duration, fallback_used: bool) -> LoadOutcome {
    LoadOutcome {
        url: url.to_string(),
        state: tier.state,
        elapsed_ms: elapsed.as_millis() as u64,
        fallback_used,
    }
}
