//! Application context - dependency injection container

use std::sync::Arc;

use bizlink_core::{
    ConnectionController, PopupLauncher, PopupSupervisor, PopupSupervisorConfig,
    ProviderGateway, SelectionController,
};
use bizlink_domain::{Config, ConnectionSnapshot, Provider, Result};
use bizlink_infra::{
    token_provider, BackendClient, BrowserPopupLauncher, CalendarBackendGateway,
    PaymentBackendGateway,
};
use tracing::info;

/// Application context - holds the controllers for every provider
pub struct AppContext {
    pub config: Config,

    // Connection state machines, one per provider
    pub calendar: Arc<ConnectionController>,
    pub payment: Arc<ConnectionController>,

    // Calendar picker layered on the calendar connection
    pub calendar_selection: Arc<SelectionController>,
}

impl AppContext {
    /// Create the context from the probed configuration.
    ///
    /// # Errors
    /// Returns `LinkError::Config` if configuration cannot be loaded.
    pub fn new() -> Result<Self> {
        let config = bizlink_infra::config::load()?;
        Self::new_with_config(config)
    }

    /// Create the context with popups opened in the configured browser.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let launcher = Arc::new(BrowserPopupLauncher::new(config.popup.browser.clone()));
        Self::new_with_launcher(config, launcher)
    }

    /// Create the context with a caller-supplied popup launcher.
    pub fn new_with_launcher(config: Config, launcher: Arc<dyn PopupLauncher>) -> Result<Self> {
        config.validate()?;

        let auth = token_provider(&config.auth.token_source);
        let client = Arc::new(BackendClient::new(&config.backend, auth)?);
        let popup_config = PopupSupervisorConfig::from(&config.popup);

        let calendar_gateway =
            Arc::new(CalendarBackendGateway::new(Arc::clone(&client), config.calendar.clone()));
        let payment_gateway =
            Arc::new(PaymentBackendGateway::new(Arc::clone(&client), config.payment.clone()));

        let calendar = Arc::new(connection_controller(
            calendar_gateway.clone(),
            Arc::clone(&launcher),
            popup_config.clone(),
        ));
        let payment = Arc::new(connection_controller(payment_gateway, launcher, popup_config));
        let calendar_selection =
            Arc::new(SelectionController::new(Arc::clone(&calendar), calendar_gateway));

        info!(
            backend = %config.backend.base_url,
            business = %config.business.name,
            "Application context initialized"
        );

        Ok(Self { config, calendar, payment, calendar_selection })
    }

    /// Controller owning the link to `provider`.
    pub fn connection(&self, provider: Provider) -> &Arc<ConnectionController> {
        match provider {
            Provider::Calendar => &self.calendar,
            Provider::Payment => &self.payment,
        }
    }

    /// Query both providers concurrently.
    ///
    /// The controllers share no state, so one provider failing never affects
    /// the other's result.
    pub async fn refresh_all(&self) -> [(Provider, Result<ConnectionSnapshot>); 2] {
        let (calendar, payment) = tokio::join!(self.calendar.refresh(), self.payment.refresh());
        [(Provider::Calendar, calendar), (Provider::Payment, payment)]
    }
}

fn connection_controller(
    gateway: Arc<dyn ProviderGateway>,
    launcher: Arc<dyn PopupLauncher>,
    config: PopupSupervisorConfig,
) -> ConnectionController {
    let popup = PopupSupervisor::new(gateway.provider(), launcher, config);
    ConnectionController::new(gateway, popup)
}
