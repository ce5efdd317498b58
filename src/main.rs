//! Service entry point: configuration, adapter wiring, worker spawn, HTTP.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gatherly::adapters::cache::{CachedUserRepository, RedisCacheStore};
use gatherly::adapters::events::{
    EventRouter, IdempotentHandler, QueueWorker, RedisNotificationPublisher, RedisQueueTransport,
};
use gatherly::adapters::http::{api_router, EventHandlers, JwtVerifier, UserHandlers};
use gatherly::adapters::idempotency::RedisIdempotencyStore;
use gatherly::adapters::memory::InMemoryProcessedEventStore;
use gatherly::adapters::pii::FieldCipher;
use gatherly::adapters::postgres::{
    PostgresLiveEventReader, PostgresLiveEventRepository, PostgresOutboxStore,
    PostgresRegistrationReader, PostgresRegistrationStore, PostgresUserRepository,
};
use gatherly::application::handlers::live_event::{
    CreateEventHandler, DeleteEventHandler, GetEventHandler, ListEventsHandler,
    PublishEventHandler, UpdateEventHandler,
};
use gatherly::application::handlers::notifications::{AuditHandler, NotifierHandler};
use gatherly::application::handlers::registration::{
    CancelRegistrationHandler, ConfirmRegistrationHandler, GetWaitlistHandler,
    ListRegistrationsHandler, RegisterHandler,
};
use gatherly::application::handlers::user::{EraseUserHandler, ExportUserHandler};
use gatherly::application::handlers::waitlist::{PositionNotifier, PromotionHandler, ReindexHandler};
use gatherly::application::{EventDispatcher, Metrics};
use gatherly::config::{AppConfig, QueueKind};
use gatherly::ports::{EventSubscriber, QueueTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    // ── Infrastructure ──────────────────────────────────────────────────────
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;

    let cipher: Arc<dyn gatherly::ports::PiiCipher> =
        Arc::new(FieldCipher::from_optional_key(config.pii.key_hex.as_deref())?);

    let metrics = Arc::new(Metrics::new());

    // ── Stores ──────────────────────────────────────────────────────────────
    let event_repo = Arc::new(PostgresLiveEventRepository::new(pool.clone()));
    let event_reader = Arc::new(PostgresLiveEventReader::new(pool.clone()));
    let registration_store = Arc::new(PostgresRegistrationStore::new(pool.clone()));
    let registration_reader = Arc::new(PostgresRegistrationReader::new(pool.clone()));
    let outbox = Arc::new(PostgresOutboxStore::new(pool.clone()));

    let cache = Arc::new(RedisCacheStore::new(redis_conn.clone()));
    let idempotency = Arc::new(RedisIdempotencyStore::new(redis_conn.clone()));
    let notifications = Arc::new(RedisNotificationPublisher::new(redis_conn.clone()));

    let user_repo: Arc<dyn gatherly::ports::UserRepository> = Arc::new(CachedUserRepository::new(
        Arc::new(PostgresUserRepository::new(pool.clone(), cipher)),
        cache.clone(),
        config.cache.user_ttl(),
    ));

    // ── Synchronous pipeline ────────────────────────────────────────────────
    let dispatcher = Arc::new(EventDispatcher::new());
    let promotion = Arc::new(PromotionHandler::new(
        registration_store.clone(),
        metrics.clone(),
    ));
    dispatcher.on_sync("registration.cancelled.v1", promotion.clone());
    dispatcher.on_sync("event.capacity_increased.v1", promotion);
    dispatcher.on_sync(
        "waitlist.removed.v1",
        Arc::new(ReindexHandler::new(registration_store.clone())),
    );
    dispatcher.on_sync(
        "waitlist.position_changed.v1",
        Arc::new(PositionNotifier::new(
            event_reader.clone(),
            user_repo.clone(),
            notifications.clone(),
        )),
    );

    // ── Asynchronous pipeline ───────────────────────────────────────────────
    let router = Arc::new(EventRouter::new());
    router.register_type::<gatherly::domain::registration::RegistrationCreated>(
        "registration.created.v1",
    );
    router.register_type::<gatherly::domain::registration::RegistrationWaitlisted>(
        "registration.waitlisted.v1",
    );
    router.register_type::<gatherly::domain::registration::RegistrationPromoted>(
        "registration.promoted.v1",
    );

    let processed = Arc::new(InMemoryProcessedEventStore::new());
    let notifier = Arc::new(IdempotentHandler::new(
        NotifierHandler::new(
            event_reader.clone(),
            user_repo.clone(),
            notifications.clone(),
        ),
        processed.clone(),
    ));
    let audit = Arc::new(IdempotentHandler::new(AuditHandler::new(), processed));
    let async_types = [
        "registration.created.v1",
        "registration.waitlisted.v1",
        "registration.promoted.v1",
    ];
    router.subscribe_all(&async_types, notifier);
    router.subscribe_all(&async_types, audit);

    let transport: Option<Arc<dyn QueueTransport>> = match config.queue.kind {
        QueueKind::External => Some(Arc::new(RedisQueueTransport::new(
            redis_conn,
            config.queue.name.clone(),
            config.queue.dead_letter_name.clone(),
        ))),
        QueueKind::InMemory => None,
    };

    let worker = Arc::new(QueueWorker::new(
        outbox,
        transport,
        router,
        metrics.clone(),
        config
            .outbox
            .to_worker_config(format!("worker-{}", uuid::Uuid::new_v4())),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = {
        let worker = worker.clone();
        tokio::spawn(async move { worker.run(shutdown_rx).await })
    };

    // ── Application handlers ────────────────────────────────────────────────
    let limits = config.limits.to_event_limits();
    let event_handlers = EventHandlers {
        create: Arc::new(CreateEventHandler::new(
            event_repo.clone(),
            cache.clone(),
            limits.clone(),
        )),
        update: Arc::new(UpdateEventHandler::new(
            event_repo.clone(),
            registration_reader.clone(),
            dispatcher.clone(),
            cache.clone(),
            limits,
        )),
        publish: Arc::new(PublishEventHandler::new(event_repo.clone(), cache.clone())),
        delete: Arc::new(DeleteEventHandler::new(
            event_repo.clone(),
            registration_reader.clone(),
            cache.clone(),
        )),
        get: Arc::new(GetEventHandler::new(
            event_reader.clone(),
            cache.clone(),
            metrics.clone(),
            config.cache.event_ttl(),
        )),
        list: Arc::new(ListEventsHandler::new(
            event_reader,
            cache.clone(),
            metrics.clone(),
            config.cache.list_ttl(),
        )),
        register: Arc::new(RegisterHandler::new(
            user_repo.clone(),
            event_repo,
            registration_store.clone(),
            idempotency,
            metrics.clone(),
            config.idempotency.ttl(),
        )),
        cancel: Arc::new(CancelRegistrationHandler::new(
            registration_store.clone(),
            user_repo.clone(),
            dispatcher.clone(),
            metrics.clone(),
        )),
        confirm: Arc::new(ConfirmRegistrationHandler::new(
            registration_store,
            dispatcher,
            metrics.clone(),
        )),
        list_registrations: Arc::new(ListRegistrationsHandler::new(registration_reader.clone())),
        waitlist: Arc::new(GetWaitlistHandler::new(registration_reader.clone())),
    };

    let user_handlers = UserHandlers {
        export: Arc::new(ExportUserHandler::new(
            user_repo.clone(),
            registration_reader,
        )),
        erase: Arc::new(EraseUserHandler::new(user_repo, cache)),
    };

    // ── HTTP ────────────────────────────────────────────────────────────────
    let app = api_router(
        event_handlers,
        user_handlers,
        JwtVerifier::new(&config.auth.jwt_secret),
        metrics,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = config.server.socket_addr()?;
    info!(%addr, "gatherly listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    // Stop the worker after the HTTP server drains.
    let _ = shutdown_tx.send(true);
    match worker_handle.await {
        Ok(result) => result?,
        Err(e) => tracing::error!(error = %e, "worker task panicked"),
    }

    Ok(())
}
