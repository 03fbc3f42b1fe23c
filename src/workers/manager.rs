// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// 协作式取消标记
///
/// 只在候选之间检查，不会中断正在进行的抓取。
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 运行中任务管理器
///
/// 记录本进程内正在运行的任务及其取消标记与句柄。
#[derive(Default)]
pub struct JobManager {
    flags: DashMap<Uuid, CancellationFlag>,
    handles: DashMap<Uuid, JoinHandle<()>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记任务并返回其取消标记
    pub fn register(&self, job_id: Uuid) -> CancellationFlag {
        self.flags.entry(job_id).or_default().clone()
    }

    /// 保存任务句柄，顺便清理已结束的句柄
    pub fn track(&self, job_id: Uuid, handle: JoinHandle<()>) {
        self.handles.retain(|_, h| !h.is_finished());
        self.handles.insert(job_id, handle);
    }

    /// 任务结束后移除取消标记
    pub fn finish(&self, job_id: Uuid) {
        self.flags.remove(&job_id);
    }

    /// 请求取消任务
    ///
    /// 任务不在本进程运行时返回 `false`。
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.flags.get(&job_id) {
            Some(flag) => {
                flag.cancel();
                info!(%job_id, "Cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, job_id: Uuid) -> bool {
        self.flags.contains_key(&job_id)
    }

    pub fn running_jobs(&self) -> Vec<Uuid> {
        self.flags.iter().map(|entry| *entry.key()).collect()
    }

    /// 等待任务结束
    pub async fn wait(&self, job_id: Uuid) {
        let handle = self.handles.remove(&job_id).map(|(_, h)| h);
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(%job_id, "Job task ended abnormally: {}", e);
            }
        }
    }

    /// 取消所有任务并等待其结束
    pub async fn shutdown(&self) {
        for entry in self.flags.iter() {
            entry.value().cancel();
        }

        let job_ids: Vec<Uuid> = self.handles.iter().map(|entry| *entry.key()).collect();
        info!("Waiting for {} job(s) to stop", job_ids.len());
        for job_id in job_ids {
            self.wait(job_id).await;
        }
    }
}
