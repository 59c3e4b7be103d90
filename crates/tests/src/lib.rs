//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 每种 publish 策略的端到端行为 (registry -> dispatcher -> strategy -> handler)
//! - 配置加载到 dispatcher 构建

#[cfg(test)]
mod contract_tests {
    use contracts::{HandlerContract, Notification, StrategyKind};

    struct Audit;
    impl Notification for Audit {}

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(StrategyKind::default(), StrategyKind::Sequential);
        assert!(HandlerContract::of::<Audit>().to_string().contains("Audit"));
    }
}

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use contracts::{
        CancellationToken, HandlerError, Notification, NotificationHandler, StrategyKind,
    };
    use dispatcher::{Dispatcher, HandlerRegistry};

    /// Notification A
    pub struct OrderPlaced {
        pub id: u64,
    }
    impl Notification for OrderPlaced {}

    /// Notification B
    pub struct OrderShipped;
    impl Notification for OrderShipped {}

    #[derive(Clone, Copy)]
    pub enum Behaviour {
        Succeed,
        Fail(&'static str),
        Sleep(u64),
        Panic,
    }

    /// Handler that counts invocations and records start/end events
    pub struct Recorder {
        pub name: &'static str,
        pub behaviour: Behaviour,
        pub calls: Arc<AtomicUsize>,
        pub log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        pub fn new(name: &'static str, behaviour: Behaviour, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                behaviour,
                calls: Arc::new(AtomicUsize::new(0)),
                log: Arc::clone(log),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationHandler<OrderPlaced> for Recorder {
        async fn handle(
            &self,
            _notification: Arc<OrderPlaced>,
            _cancel: CancellationToken,
        ) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("{}:start", self.name));

            let result = match self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::Fail(message) => Err(HandlerError::failed(message)),
                Behaviour::Sleep(ms) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(())
                }
                Behaviour::Panic => panic!("{} blew up", self.name),
            };

            self.log.lock().unwrap().push(format!("{}:end", self.name));
            result
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    pub fn dispatcher(kind: StrategyKind, handlers: &[Arc<Recorder>]) -> Dispatcher {
        let registry = HandlerRegistry::new();
        for handler in handlers {
            registry
                .register::<OrderPlaced>(Arc::clone(handler) as Arc<dyn NotificationHandler<OrderPlaced>>)
                .unwrap();
        }
        Dispatcher::builder(registry).strategy(kind).build()
    }

    pub fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }
}

#[cfg(test)]
mod strategy_tests {
    use contracts::{CancellationToken, PublishError, StrategyKind};
    use dispatcher::{Dispatcher, HandlerRegistry};

    use crate::support::{dispatcher, log, Behaviour, OrderPlaced, OrderShipped, Recorder};

    const CONCURRENT: [StrategyKind; 2] = [StrategyKind::Concurrent, StrategyKind::WhenAll];

    #[tokio::test]
    async fn test_empty_fanout_succeeds_for_every_strategy() {
        for kind in StrategyKind::ALL {
            let dispatcher = Dispatcher::builder(HandlerRegistry::new()).strategy(kind).build();
            let outcome = dispatcher.publish_default(OrderPlaced { id: 1 }).await.unwrap();
            assert_eq!(outcome.handlers, 0, "strategy {kind}");
        }
    }

    #[tokio::test]
    async fn test_sequential_runs_in_order() {
        let log = log();
        let handlers = [
            Recorder::new("h1", Behaviour::Sleep(10), &log),
            Recorder::new("h2", Behaviour::Sleep(5), &log),
            Recorder::new("h3", Behaviour::Succeed, &log),
        ];

        dispatcher(StrategyKind::Sequential, &handlers)
            .publish_default(OrderPlaced { id: 2 })
            .await
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["h1:start", "h1:end", "h2:start", "h2:end", "h3:start", "h3:end"]
        );
    }

    #[tokio::test]
    async fn test_sequential_short_circuits() {
        let log = log();
        let handlers = [
            Recorder::new("h1", Behaviour::Succeed, &log),
            Recorder::new("h2", Behaviour::Fail("payment declined"), &log),
            Recorder::new("h3", Behaviour::Succeed, &log),
        ];

        let err = dispatcher(StrategyKind::Sequential, &handlers)
            .publish_default(OrderPlaced { id: 3 })
            .await
            .unwrap_err();

        assert_eq!(err.handler_names(), vec!["h2"]);
        assert!(err.to_string().contains("payment declined"));
        assert_eq!(handlers[0].calls(), 1);
        assert_eq!(handlers[2].calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_strategies_run_every_handler() {
        for kind in CONCURRENT {
            let log = log();
            let handlers = [
                Recorder::new("h1", Behaviour::Fail("h1 broke"), &log),
                Recorder::new("h2", Behaviour::Sleep(10), &log),
            ];

            let err = dispatcher(kind, &handlers)
                .publish_default(OrderPlaced { id: 4 })
                .await
                .unwrap_err();

            assert_eq!(err.handler_names(), vec!["h1"], "strategy {kind}");
            assert_eq!(handlers[1].calls(), 1, "strategy {kind}");
        }
    }

    #[tokio::test]
    async fn test_concurrent_strategies_aggregate_failures() {
        for kind in CONCURRENT {
            let log = log();
            let handlers = [
                Recorder::new("h1", Behaviour::Fail("inventory unavailable"), &log),
                Recorder::new("h2", Behaviour::Fail("mailer offline"), &log),
            ];

            let err = dispatcher(kind, &handlers)
                .publish_default(OrderPlaced { id: 5 })
                .await
                .unwrap_err();

            assert!(matches!(err, PublishError::Aggregate(_)), "strategy {kind}");
            let message = err.to_string();
            assert!(message.contains("inventory unavailable"), "{message}");
            assert!(message.contains("mailer offline"), "{message}");
        }
    }

    #[tokio::test]
    async fn test_type_isolation() {
        for kind in StrategyKind::ALL {
            let log = log();
            let handlers = [Recorder::new("placed_only", Behaviour::Succeed, &log)];

            let outcome = dispatcher(kind, &handlers)
                .publish_default(OrderShipped)
                .await
                .unwrap();

            assert_eq!(outcome.handlers, 0);
            assert_eq!(handlers[0].calls(), 0, "strategy {kind}");
        }
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_invokes_nothing() {
        for kind in StrategyKind::ALL {
            let log = log();
            let handlers = [
                Recorder::new("h1", Behaviour::Succeed, &log),
                Recorder::new("h2", Behaviour::Succeed, &log),
            ];

            let cancel = CancellationToken::new();
            cancel.cancel();
            let err = dispatcher(kind, &handlers)
                .publish(OrderPlaced { id: 6 }, cancel)
                .await
                .unwrap_err();

            assert!(err.is_cancelled(), "strategy {kind}");
            assert!(handlers.iter().all(|h| h.calls() == 0), "strategy {kind}");
        }
    }

    #[tokio::test]
    async fn test_panicking_handler_is_a_failure() {
        for kind in StrategyKind::ALL {
            let log = log();
            let handlers = [
                Recorder::new("healthy", Behaviour::Succeed, &log),
                Recorder::new("buggy", Behaviour::Panic, &log),
            ];

            let err = dispatcher(kind, &handlers)
                .publish_default(OrderPlaced { id: 7 })
                .await
                .unwrap_err();

            assert_eq!(err.handler_names(), vec!["buggy"], "strategy {kind}");
            assert!(err.to_string().contains("blew up"), "{err}");
        }
    }

    #[tokio::test]
    async fn test_metrics_track_outcomes() {
        let log = log();
        let handlers = [Recorder::new("h1", Behaviour::Succeed, &log)];
        let dispatcher = dispatcher(StrategyKind::Concurrent, &handlers);

        dispatcher.publish_default(OrderPlaced { id: 8 }).await.unwrap();
        dispatcher.publish_default(OrderPlaced { id: 9 }).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let _ = dispatcher.publish(OrderPlaced { id: 10 }, cancel).await;

        let snap = dispatcher.metrics();
        assert_eq!(snap.publish_count, 3);
        assert_eq!(snap.success_count, 2);
        assert_eq!(snap.cancelled_count, 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        CancellationToken, HandlerContract, HandlerError, HandlerFn, HandlerLookup, LookupError,
        NotificationHandler, PublishError, ResolvedHandler,
    };
    use dispatcher::{
        global, install_global, Dispatcher, HandlerBinding, HandlerRegistry, PublishOutcome,
        PublishStrategy, RegistrationError,
    };

    use crate::support::OrderPlaced;

    struct ClosedScope;

    impl HandlerLookup for ClosedScope {
        fn resolve(&self, _: &HandlerContract) -> Result<Vec<ResolvedHandler>, LookupError> {
            Err(LookupError::Other("scope already disposed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates_unmodified() {
        let dispatcher = Dispatcher::builder(ClosedScope).build();
        let err = dispatcher.publish_default(OrderPlaced { id: 1 }).await.unwrap_err();

        match err {
            PublishError::Lookup(LookupError::Other(message)) => {
                assert_eq!(message, "scope already disposed")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Strategy that drops every binding unseen
    struct Discard;

    #[async_trait]
    impl PublishStrategy for Discard {
        fn name(&self) -> &str {
            "discard"
        }

        async fn publish(
            &self,
            bindings: Vec<HandlerBinding>,
            _notification: Arc<dyn contracts::Notification>,
            _cancel: CancellationToken,
        ) -> Result<PublishOutcome, PublishError> {
            drop(bindings);
            Ok(PublishOutcome::new(0))
        }
    }

    #[tokio::test]
    async fn test_custom_strategy_receives_bindings() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let registry = HandlerRegistry::new();
        registry
            .register::<OrderPlaced>(HandlerFn::arc(
                "counter",
                move |_n: Arc<OrderPlaced>, _c: CancellationToken| {
                    let calls = Arc::clone(&calls_clone);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, HandlerError>(())
                    }
                },
            ))
            .unwrap();

        let dispatcher = Dispatcher::builder(registry)
            .custom_strategy(Arc::new(Discard))
            .build();
        assert_eq!(dispatcher.strategy_name(), "discard");

        dispatcher.publish_default(OrderPlaced { id: 2 }).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_config_drives_when_all_cap() {
        let config = ConfigLoader::load_from_str(
            "[publisher]\nstrategy = \"when_all\"\nmax_concurrency = 2\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new();
        for _ in 0..5 {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            let handler: Arc<dyn NotificationHandler<OrderPlaced>> = HandlerFn::arc(
                "bounded",
                move |_n: Arc<OrderPlaced>, _c: CancellationToken| {
                    let in_flight = Arc::clone(&in_flight);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, HandlerError>(())
                    }
                },
            );
            registry.register(handler).unwrap();
        }

        let dispatcher = Dispatcher::builder(registry)
            .from_config(&config)
            .unwrap()
            .build();
        let outcome = dispatcher.publish_default(OrderPlaced { id: 3 }).await.unwrap();

        assert_eq!(dispatcher.strategy_name(), "when_all");
        assert_eq!(outcome.handlers, 5);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_builder_cap_overrides_config() {
        let dispatcher = Dispatcher::builder(HandlerRegistry::new())
            .strategy(contracts::StrategyKind::WhenAll)
            .max_concurrency(NonZeroUsize::new(1).unwrap())
            .build();
        assert_eq!(dispatcher.strategy_name(), "when_all");
    }

    #[tokio::test]
    async fn test_global_install_once() {
        let installed = install_global(Dispatcher::builder(HandlerRegistry::new()).build()).unwrap();
        let again = install_global(Dispatcher::builder(HandlerRegistry::new()).build());

        assert!(matches!(again, Err(RegistrationError::AlreadyInstalled { .. })));
        let current = global().unwrap();
        assert!(Arc::ptr_eq(&installed, &current));

        let outcome = current.publish_default(OrderPlaced { id: 4 }).await.unwrap();
        assert_eq!(outcome.handlers, 0);
    }

    #[tokio::test]
    async fn test_concurrent_publishes_share_dispatcher() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let registry = HandlerRegistry::new();
        registry
            .register::<OrderPlaced>(HandlerFn::arc(
                "shared",
                move |n: Arc<OrderPlaced>, _c: CancellationToken| {
                    let calls = Arc::clone(&calls_clone);
                    async move {
                        calls.fetch_add(n.id as usize, Ordering::SeqCst);
                        Ok::<_, HandlerError>(())
                    }
                },
            ))
            .unwrap();

        let dispatcher = Arc::new(
            Dispatcher::builder(registry)
                .strategy(contracts::StrategyKind::Concurrent)
                .build(),
        );

        let tasks: Vec<_> = (1..=10)
            .map(|id| {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.publish_default(OrderPlaced { id }).await })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 55);
        assert_eq!(dispatcher.metrics().publish_count, 10);
    }
}
