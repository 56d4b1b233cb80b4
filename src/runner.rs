//! Drives a single group member through its lifecycle: join/sync, the
//! fetch-process-commit loop, heartbeat cadence, rebalance recovery, and
//! graceful shutdown.

use crate::batch::Batch;
use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::group::ConsumerGroup;
use crate::handler::{BatchContext, BatchHandler, Handler, MessageHandler};
use crate::instrumentation::{InstrumentationEmitter, InstrumentationEvent, TracingEmitter};
use crate::limiter::ConcurrencyLimiter;
use crate::retry::{RetryExecutor, RetrySignal};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::yield_now;
use tracing::{debug, error, info, warn};

/// Callback invoked at most once with the fatal error that killed the runner.
pub type CrashHandler = Arc<dyn Fn(&RunnerError) + Send + Sync>;

/// Consumer runner for one group member.
///
/// `start` joins the group and launches the fetch loop; `stop` drains the
/// in-flight cycle and leaves the group. Rebalance signals are recovered by
/// re-joining; everything else goes through the retry policy and, on
/// exhaustion, the crash handler.
pub struct Runner {
    group: Arc<dyn ConsumerGroup>,
    handler: Handler,
    emitter: Arc<dyn InstrumentationEmitter>,
    on_crash: CrashHandler,
    config: RunnerConfig,
    limiter: ConcurrencyLimiter,
    running: AtomicBool,
    consuming: AtomicBool,
    crashed: AtomicBool,
}

impl Runner {
    /// Create a runner. Fails when the configuration is invalid.
    pub fn new(
        group: Arc<dyn ConsumerGroup>,
        handler: Handler,
        config: RunnerConfig,
    ) -> RunnerResult<Self> {
        config.validate().map_err(RunnerError::Config)?;

        let limiter = ConcurrencyLimiter::new(config.partitions_consumed_concurrently);

        Ok(Self {
            group,
            handler,
            emitter: Arc::new(TracingEmitter),
            on_crash: Arc::new(|_| {}),
            config,
            limiter,
            running: AtomicBool::new(false),
            consuming: AtomicBool::new(false),
            crashed: AtomicBool::new(false),
        })
    }

    /// Replace the default tracing emitter.
    pub fn with_instrumentation(mut self, emitter: Arc<dyn InstrumentationEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Install the crash callback.
    pub fn with_on_crash(mut self, on_crash: CrashHandler) -> Self {
        self.on_crash = on_crash;
        self
    }

    /// Whether the runner is between `start` and `stop` (or a crash).
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether a fetch cycle is currently in flight.
    pub fn consuming(&self) -> bool {
        self.consuming.load(Ordering::SeqCst)
    }

    /// Join the group and launch the fetch loop. Idempotent. A join
    /// failure is routed to the crash handler; it is not returned.
    pub async fn start(self: &Arc<Self>) {
        if self.running.load(Ordering::SeqCst) {
            warn!(group_id = %self.group.group_id(), "runner already started");
            return;
        }

        if let Err(error) = self.join().await {
            self.crash(error);
            return;
        }

        self.running.store(true, Ordering::SeqCst);

        let runner = Arc::clone(self);
        tokio::spawn(async move { runner.fetch_loop().await });
    }

    /// Stop the runner: wait for the in-flight cycle to drain, then leave
    /// the group. Idempotent and best-effort; leave errors are swallowed.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!(group_id = %self.group.group_id(), "stopping runner");

        if !self.config.test_mode {
            self.wait_for_consumer().await;
        }

        if let Err(error) = self.group.leave().await {
            debug!(group_id = %self.group.group_id(), %error, "error while leaving group, ignoring");
        }
    }

    async fn wait_for_consumer(&self) {
        while self.consuming.load(Ordering::SeqCst) {
            debug!(group_id = %self.group.group_id(), "waiting for in-flight fetch cycle");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Join and sync under the retry policy. Rebalance signals are
    /// retried with backoff since recovery needs a fresh coordinator
    /// lookup; anything else bails. Also restores `running`, which matters
    /// when the fetch loop re-joins after a rebalance.
    async fn join(&self) -> RunnerResult<()> {
        let started = Instant::now();
        let executor = RetryExecutor::new(self.config.retry.clone());

        executor
            .run(|context| {
                let group = Arc::clone(&self.group);
                async move {
                    if context.attempt > 0 {
                        debug!(attempt = context.attempt, "retrying group join");
                    }
                    group.join().await.map_err(classify_join_error)?;
                    group.sync().await.map_err(classify_join_error)?;
                    Ok(())
                }
            })
            .await?;

        self.running.store(true, Ordering::SeqCst);

        self.emitter.emit(InstrumentationEvent::GroupJoin {
            group_id: self.group.group_id(),
            member_id: self.group.member_id(),
            leader_id: self.group.leader_id(),
            is_leader: self.group.is_leader(),
            member_assignment: self.group.member_assignment(),
            group_protocol: self.group.group_protocol(),
            duration: started.elapsed(),
        });

        Ok(())
    }

    /// While running, drive one fetch cycle at a time, yielding between
    /// cycles so `stop` and handler wakeups get scheduled.
    async fn fetch_loop(self: Arc<Self>) {
        loop {
            if !self.running.load(Ordering::SeqCst) {
                debug!(group_id = %self.group.group_id(), "runner stopped, exiting fetch loop");
                return;
            }

            if let Err(error) = self.run_fetch_cycle().await {
                self.crash(error);
                return;
            }

            yield_now().await;
        }
    }

    /// One retried unit of the fetch loop. `consuming` brackets the cycle
    /// so `stop` can drain even when a handler fails mid-batch.
    async fn run_fetch_cycle(&self) -> RunnerResult<()> {
        let executor = RetryExecutor::new(self.config.retry.clone());

        executor
            .run(|_context| async move {
                self.consuming.store(true, Ordering::SeqCst);
                let result = self.fetch().await;
                self.consuming.store(false, Ordering::SeqCst);

                match result {
                    Ok(()) => Ok(()),
                    Err(error) => self.recover(error).await,
                }
            })
            .await
    }

    /// Decide what a failed cycle means: clean exit, local recovery,
    /// backoff, or a fatal bail.
    async fn recover(&self, error: RunnerError) -> Result<(), RetrySignal> {
        if !self.running.load(Ordering::SeqCst) {
            debug!(%error, "runner stopped during fetch cycle, discarding error");
            return Ok(());
        }

        match error {
            error if error.is_rebalancing() => {
                error!(
                    group_id = %self.group.group_id(),
                    member_id = self.group.member_id().as_deref().unwrap_or(""),
                    %error,
                    "the group is rebalancing, re-joining"
                );
                self.join().await.map_err(RetrySignal::Bail)?;
                Ok(())
            }
            RunnerError::UnknownMemberId => {
                error!(
                    group_id = %self.group.group_id(),
                    member_id = self.group.member_id().as_deref().unwrap_or(""),
                    "member id rejected by the coordinator, re-joining with a new id"
                );
                self.group.clear_member_id();
                self.join().await.map_err(RetrySignal::Bail)?;
                Ok(())
            }
            RunnerError::OffsetOutOfRange { topic, partition } => {
                debug!(%topic, partition, "offset out of range, cursor already repositioned");
                Ok(())
            }
            error @ RunnerError::NotImplemented(_) => Err(RetrySignal::Bail(error)),
            error => Err(RetrySignal::Retry(error)),
        }
    }

    /// One fetch cycle: fetch, fan batches out through the limiter,
    /// auto-commit, trailing heartbeat.
    async fn fetch(&self) -> RunnerResult<()> {
        let started = Instant::now();
        let batches = self.group.fetch().await?;

        self.emitter.emit(InstrumentationEvent::Fetch {
            number_of_batches: batches.len(),
            duration: started.elapsed(),
        });

        let tasks = batches
            .into_iter()
            .map(|batch| self.limiter.run(self.process_batch(batch)));

        for result in join_all(tasks).await {
            result?;
        }

        self.auto_commit_offsets().await?;
        self.group.heartbeat(self.config.heartbeat_interval).await?;

        Ok(())
    }

    async fn process_batch(&self, batch: Batch) -> RunnerResult<()> {
        if !self.running.load(Ordering::SeqCst) || batch.is_empty() {
            return Ok(());
        }

        let started = Instant::now();

        self.emitter.emit(InstrumentationEvent::StartBatchProcess {
            topic: batch.topic.clone(),
            partition: batch.partition,
            high_watermark: batch.high_watermark,
            offset_lag: batch.offset_lag(),
            batch_size: batch.messages.len(),
            first_offset: batch.first_offset(),
            last_offset: batch.last_offset(),
        });

        match &self.handler {
            Handler::Message(handler) => self.process_each_message(&batch, handler.as_ref()).await?,
            Handler::Batch(handler) => self.process_each_batch(&batch, handler.as_ref()).await?,
        }

        self.emitter.emit(InstrumentationEvent::EndBatchProcess {
            topic: batch.topic.clone(),
            partition: batch.partition,
            high_watermark: batch.high_watermark,
            offset_lag: batch.offset_lag(),
            batch_size: batch.messages.len(),
            first_offset: batch.first_offset(),
            last_offset: batch.last_offset(),
            duration: started.elapsed(),
        });

        Ok(())
    }

    /// Invoke the message handler in offset order. A seek or `stop`
    /// abandons the rest of the batch. On handler failure the previously
    /// resolved offsets are committed before the error propagates.
    async fn process_each_message(
        &self,
        batch: &Batch,
        handler: &dyn MessageHandler,
    ) -> RunnerResult<()> {
        let topic = batch.topic.as_str();
        let partition = batch.partition;

        for message in &batch.messages {
            if !self.running.load(Ordering::SeqCst) || self.group.has_seek_offset(topic, partition)
            {
                break;
            }

            if let Err(error) = handler.each_message(topic, partition, message).await {
                if !error.is_protocol() {
                    error!(
                        %topic,
                        partition,
                        offset = message.offset,
                        %error,
                        "message handler failed"
                    );
                }
                self.group.commit_offsets(None).await?;
                return Err(error);
            }

            self.group.resolve_offset(topic, partition, message.offset);
            self.group.heartbeat(self.config.heartbeat_interval).await?;
            self.group.commit_offsets_if_necessary().await?;
        }

        Ok(())
    }

    /// Invoke the batch handler with its control surface. On failure the
    /// resolved offsets are auto-committed before the error propagates;
    /// on success the last offset resolves automatically unless the
    /// handler owns advancement.
    async fn process_each_batch(
        &self,
        batch: &Batch,
        handler: &dyn BatchHandler,
    ) -> RunnerResult<()> {
        let context = BatchContext::new(
            batch,
            self.group.as_ref(),
            &self.running,
            self.config.heartbeat_interval,
        );

        if let Err(error) = handler.each_batch(context).await {
            if !error.is_protocol() {
                error!(
                    topic = %batch.topic,
                    partition = batch.partition,
                    %error,
                    "batch handler failed"
                );
            }
            self.auto_commit_offsets().await?;
            return Err(error);
        }

        if self.config.each_batch_auto_resolve {
            self.group
                .resolve_offset(&batch.topic, batch.partition, batch.last_offset());
        }

        Ok(())
    }

    async fn auto_commit_offsets(&self) -> RunnerResult<()> {
        if self.config.auto_commit {
            self.group.commit_offsets(None).await?;
        }
        Ok(())
    }

    /// Surface a fatal error exactly once and leave the runner stopped.
    fn crash(&self, error: RunnerError) {
        self.running.store(false, Ordering::SeqCst);

        if self
            .crashed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            error!(
                group_id = %self.group.group_id(),
                %error,
                "runner crashed"
            );
            (self.on_crash)(&error);
        }
    }
}

fn classify_join_error(error: RunnerError) -> RetrySignal {
    if error.is_rebalancing() {
        RetrySignal::Retry(error)
    } else {
        RetrySignal::Bail(error)
    }
}
