// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 结构化事件日志
//!
//! 调用方只管投递，事件由单个写入任务按投递顺序落库。
//! 每个事件在投递时获得单调递增的序号与不回退的时间戳，
//! 因此同一任务的事件按时间读回即为投递顺序。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::models::job_event::{EventType, JobEvent, Severity};
use crate::domain::repositories::job_event_repository::JobEventRepository;
use crate::engines::resource_controller::ResourceController;

const MAX_BATCH: usize = 64;

enum LoggerMessage {
    Event(JobEvent),
    Flush(oneshot::Sender<()>),
}

/// 序号与时间戳
struct Stamp {
    sequence: i64,
    last: DateTime<Utc>,
}

struct LoggerInner {
    tx: mpsc::UnboundedSender<LoggerMessage>,
    stamp: Mutex<Stamp>,
    active_jobs: Mutex<HashSet<Uuid>>,
    controller: Arc<ResourceController>,
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl LoggerInner {
    fn next_stamp(&self) -> (i64, DateTime<Utc>) {
        let mut stamp = self.stamp.lock();
        stamp.sequence += 1;
        stamp.last = stamp.last.max(Utc::now());
        (stamp.sequence, stamp.last)
    }

    fn submit(&self, mut event: JobEvent) {
        let (sequence, created_at) = self.next_stamp();
        event.sequence = sequence;
        event.created_at = created_at;
        mirror_to_tracing(&event);
        if self.tx.send(LoggerMessage::Event(event)).is_err() {
            tracing::warn!("Event writer stopped, dropping job event");
        }
    }

    /// 进程级资源快照
    fn snapshot(&self) -> Value {
        let mut system = self.system.lock();
        let process_memory = self.pid.and_then(|pid| {
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::nothing().with_memory(),
            );
            system.process(pid).map(|p| p.memory())
        });
        system.refresh_memory();

        json!({
            "process_memory_bytes": process_memory,
            "system_used_memory_bytes": system.used_memory(),
            "system_total_memory_bytes": system.total_memory(),
            "active_requests": self.controller.in_flight(),
            "active_jobs": self.active_jobs.lock().len(),
        })
    }
}

/// 结构化事件记录器
pub struct EventLogger {
    inner: Arc<LoggerInner>,
    snapshot_interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl EventLogger {
    /// 创建记录器并启动写入任务
    pub fn new(
        repository: Arc<dyn JobEventRepository>,
        controller: Arc<ResourceController>,
        snapshot_interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(repository, rx));

        Self {
            inner: Arc::new(LoggerInner {
                tx,
                stamp: Mutex::new(Stamp {
                    sequence: 0,
                    last: Utc::now(),
                }),
                active_jobs: Mutex::new(HashSet::new()),
                controller,
                system: Mutex::new(System::new()),
                pid: sysinfo::get_current_pid().ok(),
            }),
            snapshot_interval,
            ticker: Mutex::new(None),
            writer: Mutex::new(Some(writer)),
        }
    }

    /// 记录一条事件
    pub fn record(
        &self,
        job_id: Uuid,
        source_id: Option<Uuid>,
        severity: Severity,
        event_type: EventType,
        message: impl Into<String>,
        payload: Value,
    ) {
        let mut event = JobEvent::new(job_id, severity, event_type, message).with_payload(payload);
        if let Some(source_id) = source_id {
            event = event.with_source(source_id);
        }
        self.inner.submit(event);
    }

    /// 记录已构建好的事件
    pub fn record_event(&self, event: JobEvent) {
        self.inner.submit(event);
    }

    /// 任务级作用域
    pub fn scope(&self, job_id: Uuid) -> EventScope {
        EventScope {
            inner: self.inner.clone(),
            job_id,
            source_id: None,
            correlation_id: None,
        }
    }

    /// 等待此前投递的事件全部落库
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.inner.tx.send(LoggerMessage::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// 登记活跃任务，第一个任务登记时启动快照定时器
    pub fn register_job(&self, job_id: Uuid) {
        // 加锁顺序固定为 ticker → active_jobs，计数与启停在同一临界区内完成
        let mut ticker = self.ticker.lock();
        let count = {
            let mut active = self.inner.active_jobs.lock();
            active.insert(job_id);
            active.len()
        };
        metrics::gauge!("jobs_active").set(count as f64);

        if ticker.as_ref().map_or(true, |handle| handle.is_finished()) {
            tracing::debug!(interval = ?self.snapshot_interval, "Starting performance snapshot ticker");
            *ticker = Some(tokio::spawn(run_ticker(
                self.inner.clone(),
                self.snapshot_interval,
            )));
        }
    }

    /// 注销任务，没有活跃任务时停止定时器
    pub fn unregister_job(&self, job_id: Uuid) {
        let mut ticker = self.ticker.lock();
        let remaining = {
            let mut active = self.inner.active_jobs.lock();
            active.remove(&job_id);
            active.len()
        };
        metrics::gauge!("jobs_active").set(remaining as f64);

        if remaining == 0 {
            if let Some(handle) = ticker.take() {
                tracing::debug!("Stopping performance snapshot ticker");
                handle.abort();
            }
        }
    }

    /// 定时器是否在运行
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// 立即生成一次资源快照
    pub fn snapshot(&self) -> Value {
        self.inner.snapshot()
    }

    /// 停止定时器并等待写入完成
    pub async fn shutdown(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
        self.flush().await;
        if let Some(handle) = self.writer.lock().take() {
            handle.abort();
        }
    }
}

/// 带任务、源与关联 ID 的事件作用域
///
/// 一次抓取与随后的抽取、保存共享同一个关联 ID。
#[derive(Clone)]
pub struct EventScope {
    inner: Arc<LoggerInner>,
    job_id: Uuid,
    source_id: Option<Uuid>,
    correlation_id: Option<Uuid>,
}

impl EventScope {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    pub fn for_source(&self, source_id: Uuid) -> Self {
        Self {
            source_id: Some(source_id),
            ..self.clone()
        }
    }

    /// 开启新的因果链
    pub fn correlated(&self) -> Self {
        Self {
            correlation_id: Some(Uuid::new_v4()),
            ..self.clone()
        }
    }

    pub fn emit(&self, severity: Severity, event_type: EventType, message: impl Into<String>, payload: Value) {
        let mut event = JobEvent::new(self.job_id, severity, event_type, message).with_payload(payload);
        if let Some(source_id) = self.source_id {
            event = event.with_source(source_id);
        }
        if let Some(correlation_id) = self.correlation_id {
            event = event.with_correlation(correlation_id);
        }
        self.inner.submit(event);
    }

    pub fn info(&self, event_type: EventType, message: impl Into<String>, payload: Value) {
        self.emit(Severity::Info, event_type, message, payload);
    }

    pub fn warn(&self, event_type: EventType, message: impl Into<String>, payload: Value) {
        self.emit(Severity::Warning, event_type, message, payload);
    }

    pub fn error(&self, event_type: EventType, message: impl Into<String>, payload: Value) {
        self.emit(Severity::Error, event_type, message, payload);
    }
}

async fn run_writer(
    repository: Arc<dyn JobEventRepository>,
    mut rx: mpsc::UnboundedReceiver<LoggerMessage>,
) {
    let mut batch = Vec::with_capacity(MAX_BATCH);
    while let Some(message) = rx.recv().await {
        let mut flushes = Vec::new();
        match message {
            LoggerMessage::Event(event) => batch.push(event),
            LoggerMessage::Flush(ack) => flushes.push(ack),
        }
        while batch.len() < MAX_BATCH {
            match rx.try_recv() {
                Ok(LoggerMessage::Event(event)) => batch.push(event),
                Ok(LoggerMessage::Flush(ack)) => {
                    flushes.push(ack);
                    break;
                }
                Err(_) => break,
            }
        }

        if !batch.is_empty() {
            if let Err(e) = repository.append(&batch).await {
                tracing::error!(count = batch.len(), "Failed to persist job events: {}", e);
            }
            batch.clear();
        }
        for ack in flushes {
            let _ = ack.send(());
        }
    }
}

async fn run_ticker(inner: Arc<LoggerInner>, period: Duration) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        interval.tick().await;
        let jobs: Vec<Uuid> = inner.active_jobs.lock().iter().copied().collect();
        if jobs.is_empty() {
            continue;
        }
        let snapshot = inner.snapshot();
        for job_id in jobs {
            inner.submit(
                JobEvent::new(job_id, Severity::Debug, EventType::Performance, "performance snapshot")
                    .with_payload(snapshot.clone()),
            );
        }
    }
}

fn mirror_to_tracing(event: &JobEvent) {
    let job_id = event.job_id;
    let event_type = event.event_type;
    match event.severity {
        Severity::Error => tracing::error!(%job_id, %event_type, "{}", event.message),
        Severity::Warning => tracing::warn!(%job_id, %event_type, "{}", event.message),
        Severity::Info => tracing::info!(%job_id, %event_type, "{}", event.message),
        Severity::Debug => tracing::debug!(%job_id, %event_type, "{}", event.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::job_event_repository::JobEventQuery;
    use crate::domain::repositories::job_repository::RepositoryError;
    use async_trait::async_trait;

    #[derive(Default)]
    struct MemoryEvents {
        events: Mutex<Vec<JobEvent>>,
    }

    #[async_trait]
    impl JobEventRepository for MemoryEvents {
        async fn append(&self, events: &[JobEvent]) -> Result<(), RepositoryError> {
            self.events.lock().extend_from_slice(events);
            Ok(())
        }

        async fn query(&self, query: JobEventQuery) -> Result<Vec<JobEvent>, RepositoryError> {
            Ok(self
                .events
                .lock()
                .iter()
                .filter(|e| e.job_id == query.job_id)
                .filter(|e| query.event_type.map_or(true, |t| t == e.event_type))
                .cloned()
                .collect())
        }
    }

    fn logger(repo: Arc<MemoryEvents>, interval: Duration) -> EventLogger {
        EventLogger::new(repo, Arc::new(ResourceController::new(2, 4)), interval)
    }

    #[tokio::test]
    async fn test_events_are_persisted_in_emission_order() {
        let repo = Arc::new(MemoryEvents::default());
        let logger = logger(repo.clone(), Duration::from_secs(30));
        let job_id = Uuid::new_v4();

        for i in 0..100 {
            logger.record(job_id, None, Severity::Info, EventType::Lifecycle, format!("e{}", i), json!({ "i": i }));
        }
        logger.flush().await;

        let events = repo.events.lock().clone();
        assert_eq!(events.len(), 100);
        for pair in events.windows(2) {
            assert!(pair[0].sequence < pair[1].sequence);
            assert!(pair[0].created_at <= pair[1].created_at);
        }
        assert_eq!(events[99].payload["i"], 99);
    }

    #[tokio::test]
    async fn test_scope_threads_correlation_id() {
        let repo = Arc::new(MemoryEvents::default());
        let logger = logger(repo.clone(), Duration::from_secs(30));
        let job_id = Uuid::new_v4();
        let source_id = Uuid::new_v4();

        let chain = logger.scope(job_id).for_source(source_id).correlated();
        chain.info(EventType::Http, "fetched", json!({ "status": 200 }));
        chain.info(EventType::Extraction, "extracted", json!({}));
        logger.scope(job_id).correlated().warn(EventType::Http, "other chain", json!({}));
        logger.flush().await;

        let events = repo.events.lock().clone();
        let correlation = chain.correlation_id().unwrap();
        let linked: Vec<_> = events
            .iter()
            .filter(|e| e.correlation_id == Some(correlation))
            .collect();
        assert_eq!(linked.len(), 2);
        assert!(linked.iter().all(|e| e.source_id == Some(source_id)));
        assert_eq!(linked[0].payload["correlation_id"], correlation.to_string());
        assert_ne!(events[2].correlation_id, Some(correlation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_runs_only_while_jobs_are_active() {
        let repo = Arc::new(MemoryEvents::default());
        let logger = logger(repo.clone(), Duration::from_secs(1));
        let job_id = Uuid::new_v4();

        assert!(!logger.is_ticking());
        logger.register_job(job_id);
        assert!(logger.is_ticking());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        logger.flush().await;

        let snapshots: Vec<_> = repo
            .events
            .lock()
            .iter()
            .filter(|e| e.event_type == EventType::Performance)
            .cloned()
            .collect();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[0].payload.get("active_requests").is_some());
        assert!(snapshots[0].source_id.is_none());

        logger.unregister_job(job_id);
        assert!(!logger.is_ticking());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ticker_survives_concurrent_handover_between_jobs() {
        let repo = Arc::new(MemoryEvents::default());
        let logger = Arc::new(logger(repo, Duration::from_secs(30)));

        for _ in 0..200 {
            let finishing = Uuid::new_v4();
            let starting = Uuid::new_v4();
            logger.register_job(finishing);

            let a = {
                let logger = logger.clone();
                tokio::spawn(async move { logger.unregister_job(finishing) })
            };
            let b = {
                let logger = logger.clone();
                tokio::spawn(async move { logger.register_job(starting) })
            };
            a.await.unwrap();
            b.await.unwrap();

            // 仍有活跃任务时定时器必须在运行
            assert!(logger.is_ticking());
            logger.unregister_job(starting);
            assert!(!logger.is_ticking());
        }
    }
}
