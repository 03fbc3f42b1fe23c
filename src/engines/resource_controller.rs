// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use dashmap::DashMap;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, PageFetcher};

/// 单个源的访问闸门
///
/// 限制该源同时在途的请求数，并保证相邻请求间隔不小于礼貌延迟。
pub struct SourceGate {
    semaphore: Arc<Semaphore>,
    limiter: Option<DefaultDirectRateLimiter>,
    delay: Duration,
    permits: usize,
}

impl SourceGate {
    fn new(permits: usize, delay: Duration) -> Self {
        let limiter = Quota::with_period(delay).map(RateLimiter::direct);
        Self {
            semaphore: Arc::new(Semaphore::new(permits.max(1))),
            limiter,
            delay,
            permits,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// 在途请求许可，释放时自动归还计数
pub struct FetchPermit {
    _source: OwnedSemaphorePermit,
    _global: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for FetchPermit {
    fn drop(&mut self) {
        let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::gauge!("fetch_in_flight").set(remaining as f64);
    }
}

/// 资源与退避控制器
///
/// 负责三件事：每个请求的超时、每个源的礼貌延迟与并发上限、
/// 全局在途请求上限。
pub struct ResourceController {
    global: Arc<Semaphore>,
    gates: DashMap<Uuid, Arc<SourceGate>>,
    in_flight: Arc<AtomicUsize>,
    per_source_concurrency: usize,
}

impl ResourceController {
    pub fn new(per_source_concurrency: usize, global_fetch_limit: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global_fetch_limit.max(1))),
            gates: DashMap::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            per_source_concurrency: per_source_concurrency.max(1),
        }
    }

    pub fn per_source_concurrency(&self) -> usize {
        self.per_source_concurrency
    }

    /// 当前在途请求数
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 获取或创建源闸门
    ///
    /// 同一个源在并发任务之间共享闸门；延迟变化时替换为新闸门。
    pub fn gate(&self, source_id: Uuid, delay: Duration) -> Arc<SourceGate> {
        let mut entry = self
            .gates
            .entry(source_id)
            .or_insert_with(|| Arc::new(SourceGate::new(self.per_source_concurrency, delay)));
        if entry.delay != delay || entry.permits != self.per_source_concurrency {
            *entry = Arc::new(SourceGate::new(self.per_source_concurrency, delay));
        }
        entry.clone()
    }

    /// 等待源并发许可、礼貌延迟与全局许可
    pub async fn acquire(&self, gate: &SourceGate) -> Result<FetchPermit, EngineError> {
        let source = gate
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| EngineError::Other(format!("source gate closed: {}", e)))?;

        if let Some(limiter) = &gate.limiter {
            limiter.until_ready().await;
        }

        let global = self
            .global
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| EngineError::Other(format!("fetch limit closed: {}", e)))?;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::gauge!("fetch_in_flight").set(current as f64);

        Ok(FetchPermit {
            _source: source,
            _global: global,
            in_flight: self.in_flight.clone(),
        })
    }

    /// 在资源约束下执行一次抓取
    ///
    /// 超过请求超时返回 `EngineError::Timeout`，即便引擎自身没有遵守超时。
    pub async fn fetch(
        &self,
        fetcher: &dyn PageFetcher,
        gate: &SourceGate,
        request: &FetchRequest,
    ) -> Result<FetchResponse, EngineError> {
        let _permit = self.acquire(gate).await?;
        match tokio::time::timeout(request.timeout, fetcher.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout),
        }
    }
}
