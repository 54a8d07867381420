//! Runs a [`Session`]'s service calls on tokio.
//!
//! Each queued [`Task`] is spawned and sends exactly one [`Completion`] back
//! through a single channel, even when the service call panics. Completions are applied here, on the driver's
//! task, so the session is only ever touched from one place.

use infinicraft_core::{Completion, CraftService, ServiceError, Session, Task};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

/// What a call to [`Driver::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A service call finished and was applied.
    Applied,
    /// The feedback window elapsed and was cleared.
    FeedbackExpired,
    /// Nothing in flight and no feedback pending.
    Idle,
}

/// Owns the session and the completion queue.
pub struct Driver {
    session: Session,
    service: Arc<dyn CraftService>,
    completion_tx: UnboundedSender<Completion>,
    completion_rx: UnboundedReceiver<Completion>,
    /// Spawned tasks whose completion has not been applied yet.
    pending: usize,
}

impl Driver {
    pub fn new(session: Session, service: Arc<dyn CraftService>) -> Self {
        let (completion_tx, completion_rx) = unbounded_channel();
        Self {
            session,
            service,
            completion_tx,
            completion_rx,
            pending: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access for gestures. Call [`Driver::flush`] afterwards to
    /// issue any requests they queued.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Service calls spawned but not yet applied.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Spawn every queued task.
    pub fn flush(&mut self) {
        for task in self.session.take_tasks() {
            self.spawn(task);
        }
    }

    fn spawn(&mut self, task: Task) {
        log::debug!("Spawning {:?}", task);
        let service = Arc::clone(&self.service);
        let tx = self.completion_tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let fallback = task.clone();
            let completion = match tokio::spawn(task.run(service)).await {
                Ok(completion) => completion,
                Err(err) => {
                    log::error!("Service call {:?} did not finish: {}", fallback, err);
                    fallback.fail(ServiceError::Internal(format!("Service call did not finish: {}", err)))
                }
            };
            if tx.send(completion).is_err() {
                log::debug!("Driver dropped before completion arrived");
            }
        });
    }

    /// Apply completions that already arrived, without waiting.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        self.session.tick(now());
        self.flush();
        applied
    }

    /// Wait for the next completion or the feedback deadline, whichever
    /// comes first, and apply it.
    pub async fn step(&mut self) -> Step {
        self.flush();
        let deadline = self.session.feedback_deadline().map(Instant::from_std);
        if self.pending == 0 && deadline.is_none() {
            return Step::Idle;
        }

        let sleep = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let arrived = tokio::select! {
            Some(completion) = self.completion_rx.recv(), if self.pending > 0 => Some(completion),
            _ = sleep => None,
        };
        let step = match arrived {
            Some(completion) => {
                self.apply(completion);
                Step::Applied
            }
            None => {
                self.session.tick(now());
                Step::FeedbackExpired
            }
        };
        self.flush();
        step
    }

    /// Step until no service call is in flight. Pending feedback is left
    /// visible.
    pub async fn settle(&mut self) {
        self.flush();
        while self.pending > 0 {
            self.step().await;
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.pending = self.pending.saturating_sub(1);
        if let Some(resolution) = self.session.apply(completion, now()) {
            log::debug!("Combination resolved: {:?}", resolution);
        }
    }
}

/// Session clock. Goes through tokio so paused-time tests stay consistent.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinicraft_core::service::BoxFuture;
    use infinicraft_core::{
        ClientConfig, CombineRequest, CombineResponse, DropOutcome, Element, FeedbackOutcome, MemoryCraftService,
        PointerSource, Progress, ServiceResult, UserId,
    };
    use kurbo::{Point, Rect};
    use std::time::Duration;

    fn service() -> Arc<MemoryCraftService> {
        let service = MemoryCraftService::with_base(vec![
            Element::new("1", "Water", "💧"),
            Element::new("2", "Fire", "🔥"),
        ]);
        service.add_recipe(&"1".into(), &"2".into(), Element::new("3", "Steam", "💨"));
        Arc::new(service)
    }

    fn crash<T>() -> T {
        panic!("backend crashed")
    }

    fn crashing<T: Send + 'static>() -> BoxFuture<'static, T> {
        Box::pin(async { crash::<T>() })
    }

    /// Backend whose every call panics.
    struct CrashingService;

    impl CraftService for CrashingService {
        fn base_elements(&self) -> BoxFuture<'_, ServiceResult<Vec<Element>>> {
            crashing()
        }

        fn discovered_elements(&self, _user: &UserId) -> BoxFuture<'_, ServiceResult<Vec<Element>>> {
            crashing()
        }

        fn progress(&self, _user: &UserId) -> BoxFuture<'_, ServiceResult<Progress>> {
            crashing()
        }

        fn reset(&self, _user: &UserId) -> BoxFuture<'_, ServiceResult<()>> {
            crashing()
        }

        fn combine(&self, _request: &CombineRequest) -> BoxFuture<'_, ServiceResult<CombineResponse>> {
            crashing()
        }
    }

    async fn started(user: &str) -> Driver {
        let mut session = Session::new(UserId::from(user), ClientConfig::default());
        session.start();
        let mut driver = Driver::new(session, service());
        driver.settle().await;
        driver
    }

    fn drop_catalog(driver: &mut Driver, element: &str, at: Point) -> DropOutcome {
        let session = driver.session_mut();
        session.pointer_down_catalog(&element.into(), Point::new(5.0, 5.0), Rect::new(0.0, 0.0, 120.0, 44.0), PointerSource::Mouse);
        session.pointer_move(at);
        session.pointer_up(at)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_loads_everything() {
        let driver = started("alice").await;

        assert_eq!(driver.pending(), 0);
        assert_eq!(driver.session().catalog().base().len(), 2);
        assert_eq!(driver.session().catalog().discovered().len(), 2);
        assert_eq!(driver.session().catalog().discovery_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_combination_round_trip() {
        let mut driver = started("alice").await;
        drop_catalog(&mut driver, "2", Point::new(305.0, 205.0));
        let outcome = drop_catalog(&mut driver, "1", Point::new(320.0, 215.0));
        assert!(matches!(outcome, DropOutcome::Combine(_)));

        driver.settle().await;

        let session = driver.session();
        assert_eq!(session.workspace().len(), 1);
        assert_eq!(session.workspace().list()[0].element.name, "Steam");
        assert_eq!(session.catalog().discovery_count(), 3);
        let feedback = session.feedback(now()).unwrap();
        assert!(matches!(&feedback.outcome, FeedbackOutcome::Success(e) if e.name == "Steam"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_expires_through_step() {
        let mut driver = started("alice").await;
        drop_catalog(&mut driver, "1", Point::new(305.0, 205.0));
        drop_catalog(&mut driver, "1", Point::new(320.0, 215.0));
        driver.settle().await;
        assert!(driver.session().feedback_deadline().is_some());

        let start = Instant::now();
        assert_eq!(driver.step().await, Step::FeedbackExpired);
        assert!(Instant::now() - start >= Duration::from_secs(2));
        assert!(driver.session().feedback(now()).is_none());
        assert_eq!(driver.step().await, Step::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_restores_source() {
        let mut driver = started("alice").await;
        drop_catalog(&mut driver, "1", Point::new(305.0, 205.0));
        drop_catalog(&mut driver, "1", Point::new(320.0, 215.0));
        driver.settle().await;

        let session = driver.session();
        assert_eq!(session.workspace().len(), 2);
        let restored = session.workspace().list().last().unwrap();
        assert_eq!(restored.position, Point::new(240.0, 200.0));
        assert_eq!(
            session.feedback(now()).unwrap().outcome,
            FeedbackOutcome::Failure("These elements cannot be combined".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_workspace() {
        let mut driver = started("bob").await;
        drop_catalog(&mut driver, "2", Point::new(305.0, 205.0));
        drop_catalog(&mut driver, "1", Point::new(320.0, 215.0));
        driver.settle().await;
        assert_eq!(driver.session().catalog().discovery_count(), 3);

        driver.session_mut().reset_progress();
        driver.settle().await;

        assert!(driver.session().workspace().is_empty());
        assert_eq!(driver.session().catalog().discovery_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_applies_arrived_completions() {
        let mut session = Session::new(UserId::default(), ClientConfig::default());
        session.start();
        let mut driver = Driver::new(session, service());
        driver.flush();
        assert_eq!(driver.pending(), 3);

        tokio::task::yield_now().await;
        let mut applied = driver.poll();
        while driver.pending() > 0 {
            tokio::task::yield_now().await;
            applied += driver.poll();
        }
        assert_eq!(applied, 3);
        assert_eq!(driver.session().catalog().base().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_call_still_settles() {
        let mut session = Session::new(UserId::from("alice"), ClientConfig::default());
        session.start();
        let mut driver = Driver::new(session, Arc::new(CrashingService));
        driver.flush();
        assert_eq!(driver.pending(), 3);

        driver.settle().await;

        assert_eq!(driver.pending(), 0);
        assert!(driver.session().catalog().base().is_empty());
        assert_eq!(driver.step().await, Step::Idle);
    }
}
