use crate::cli::ServeArgs;
use crate::infra::{seeded_profiles, AppState, InMemoryFormProvider, DEMO_USER};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use workforce::config::AppConfig;
use workforce::error::AppError;
use workforce::forms::{FormsService, ProviderAggregator};
use workforce::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let provider = InMemoryFormProvider::new(config.forms.provider_id.clone());
    let mut providers = ProviderAggregator::default();
    providers.register(Arc::new(provider));
    let forms_service = Arc::new(FormsService::new(Arc::new(seeded_profiles()), providers));

    let app = with_service_routes(forms_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        provider_id = %config.forms.provider_id,
        seeded_user = DEMO_USER,
        "workforce forms service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
