//! Command runner.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use futures_util::FutureExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::application::{
    ClientContext, ClientPorts, DeliverPushUseCase, EventChannel, SessionStatus, ToggleOutcome,
};
use crate::domain::entities::{Permission, SessionCookie, endpoint_fingerprint};
use crate::domain::ports::PermissionPort;
use crate::infrastructure::{
    AppConfig, Command, DesktopNotificationService, LocalPushRegistry, PermissionAction,
    PermissionPrompt, ReqwestTransport, StorageManager, StoredPermission,
};
use crate::presentation::messages::{describe_event, describe_outcome};
use crate::presentation::toast::TerminalToast;

const PERMISSION_POLL: Duration = Duration::from_secs(1);

/// Asks on the terminal. An empty or unreadable answer counts as dismissing the prompt.
#[must_use]
pub fn terminal_prompt() -> PermissionPrompt {
    Arc::new(|| {
        async {
            eprint!("Allow pushwire to show notifications? [y/n] ");
            let _ = std::io::stderr().flush();

            let mut line = String::new();
            match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
                Ok(0) | Err(_) => Permission::Default,
                Ok(_) => parse_answer(&line),
            }
        }
        .boxed()
    })
}

fn parse_answer(line: &str) -> Permission {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Permission::Granted,
        "n" | "no" => Permission::Denied,
        _ => Permission::Default,
    }
}

/// Runs one command against the configured server and local platform state.
pub struct Cli<W> {
    config: AppConfig,
    storage: Option<StorageManager>,
    prompt: PermissionPrompt,
    out: W,
}

impl<W: Write + Send> Cli<W> {
    pub fn new(
        config: AppConfig,
        storage: Option<StorageManager>,
        prompt: PermissionPrompt,
        out: W,
    ) -> Self {
        Self {
            config,
            storage,
            prompt,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs `command`.
    ///
    /// # Errors
    /// Returns error if the command could not be carried out.
    pub async fn run(&mut self, command: Command) -> Result<()> {
        debug!(?command, "Running command");
        match command {
            Command::Permission { action } => self.permission(action),
            Command::Deliver { payload } => self.deliver(&payload),
            command => self.run_with_context(command).await,
        }
    }

    fn permission(&mut self, action: PermissionAction) -> Result<()> {
        let permission = match action {
            PermissionAction::Grant => Permission::Granted,
            PermissionAction::Deny => Permission::Denied,
            PermissionAction::Reset => Permission::Default,
        };

        StoredPermission::load(self.storage.clone(), self.prompt.clone())
            .set(permission)
            .wrap_err("failed to store notification permission")?;

        writeln!(self.out, "Notification permission: {permission}")?;
        Ok(())
    }

    fn deliver(&mut self, payload: &str) -> Result<()> {
        let notifier = Arc::new(DesktopNotificationService::new(
            self.config.notifications.enabled,
        ));

        match DeliverPushUseCase::new(notifier).execute(payload.as_bytes()) {
            Some(shown) => writeln!(self.out, "{}: {}", shown.title, shown.body)?,
            None => writeln!(self.out, "Empty push message ignored")?,
        }
        Ok(())
    }

    fn build_context(&self, permission: Arc<StoredPermission>) -> Result<ClientContext> {
        let config = &self.config;

        let mut transport = ReqwestTransport::builder()
            .user_agent(&config.http.user_agent)
            .timeout(Duration::from_secs(config.http.timeout_secs));
        if let Some(raw) = &config.session {
            let cookie =
                SessionCookie::parse(raw).ok_or_else(|| eyre!("session cookie is malformed"))?;
            transport = transport.session(cookie, &config.api_url);
        }
        let transport = transport.build().wrap_err("failed to create HTTP client")?;

        let ports = ClientPorts {
            transport: Arc::new(transport),
            registry: Arc::new(LocalPushRegistry::new(
                self.storage.clone(),
                &config.push.push_service_url,
            )),
            permission,
            toast: Arc::new(TerminalToast::stderr(Duration::from_millis(
                config.notifications.toast_cooldown_ms,
            ))),
            notifier: Arc::new(DesktopNotificationService::new(config.notifications.enabled)),
        };

        Ok(ClientContext::new(config.client_settings(), ports))
    }

    async fn run_with_context(&mut self, command: Command) -> Result<()> {
        let permission = Arc::new(StoredPermission::load(
            self.storage.clone(),
            self.prompt.clone(),
        ));
        let ctx = self.build_context(permission.clone())?;
        let status = ctx.initialize().await;

        let result = self.dispatch(&ctx, &permission, command, &status).await;

        ctx.dispose().await;
        self.render_events(ctx.events())?;
        result
    }

    async fn dispatch(
        &mut self,
        ctx: &ClientContext,
        permission: &StoredPermission,
        command: Command,
        status: &SessionStatus,
    ) -> Result<()> {
        match command {
            Command::Status => self.status(ctx, permission, status),
            Command::Whoami => self.whoami(status),
            Command::AgreeTerms => {
                if status.user().is_none() {
                    bail!("not signed in");
                }
                ctx.session().agree_to_terms().await?;
                writeln!(self.out, "Terms of service accepted")?;
                Ok(())
            }
            Command::Logout => {
                if let Err(e) = ctx.logout().await {
                    writeln!(self.out, "Signed out locally; server logout failed: {e}")?;
                } else {
                    writeln!(self.out, "Signed out")?;
                }
                Ok(())
            }
            Command::Subscribe => {
                let outcome = ctx.subscriptions().subscribe().await;
                self.report(outcome)
            }
            Command::Unsubscribe => {
                let outcome = ctx.subscriptions().unsubscribe().await;
                self.report(outcome)
            }
            Command::Demo { message } => {
                let outcome = ctx.subscriptions().send_demo(&message).await;
                if outcome == ToggleOutcome::Completed && ctx.events().is_empty() {
                    writeln!(self.out, "Demo notification requested")?;
                }
                self.report(outcome)
            }
            Command::Check => {
                let Some(endpoint) = ctx.subscriptions().endpoint() else {
                    writeln!(self.out, "No push subscription")?;
                    return Ok(());
                };
                let is_owner = ctx.push_api().check(&endpoint).await?;
                writeln!(
                    self.out,
                    "Server {} subscription {}",
                    if is_owner { "holds" } else { "does not hold" },
                    endpoint_fingerprint(&endpoint)
                )?;
                Ok(())
            }
            Command::Watch => self.watch(ctx, permission).await,
            Command::Permission { action } => self.permission(action),
            Command::Deliver { payload } => self.deliver(&payload),
        }
    }

    fn status(
        &mut self,
        ctx: &ClientContext,
        permission: &StoredPermission,
        status: &SessionStatus,
    ) -> Result<()> {
        match status.user() {
            Some(user) => writeln!(self.out, "Session:      signed in as {}", user.user_id)?,
            None => writeln!(self.out, "Session:      anonymous")?,
        }
        writeln!(self.out, "Permission:   {}", permission.current())?;
        writeln!(self.out, "Subscription: {}", ctx.subscriptions().phase())?;
        if let Some(endpoint) = ctx.subscriptions().endpoint() {
            writeln!(self.out, "Endpoint:     {}", endpoint_fingerprint(&endpoint))?;
        }
        Ok(())
    }

    fn whoami(&mut self, status: &SessionStatus) -> Result<()> {
        let Some(user) = status.user() else {
            writeln!(self.out, "Not signed in")?;
            return Ok(());
        };

        writeln!(self.out, "User:  {}", user.user_id)?;
        if let Some(email) = &user.email {
            writeln!(self.out, "Email: {email}")?;
        }
        writeln!(
            self.out,
            "Terms: {}",
            if user.terms_agreed { "accepted" } else { "not accepted" }
        )?;
        Ok(())
    }

    async fn watch(&mut self, ctx: &ClientContext, permission: &StoredPermission) -> Result<()> {
        writeln!(self.out, "Watching for push changes, press Ctrl-C to stop")?;

        let mut poll = tokio::time::interval(PERMISSION_POLL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    result.wrap_err("failed to listen for Ctrl-C")?;
                    break;
                }
                event = ctx.events().next() => {
                    writeln!(self.out, "{}", describe_event(&event))?;
                }
                _ = poll.tick() => {
                    if let Err(e) = permission.reload() {
                        warn!(error = %e, "Failed to reload notification permission");
                    }
                }
            }
        }
        Ok(())
    }

    fn report(&mut self, outcome: ToggleOutcome) -> Result<()> {
        if let Some(text) = describe_outcome(outcome) {
            writeln!(self.out, "{text}")?;
        }
        Ok(())
    }

    fn render_events(&mut self, events: &EventChannel) -> Result<()> {
        for event in events.drain() {
            writeln!(self.out, "{}", describe_event(&event))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use test_case::test_case;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::entities::push_subscription::fixtures;

    fn granting() -> PermissionPrompt {
        Arc::new(|| async { Permission::Granted }.boxed())
    }

    fn config(server: &MockServer) -> AppConfig {
        let mut config = AppConfig {
            api_url: server.uri(),
            vapid_key: fixtures::server_key().to_base64url(),
            ..AppConfig::default()
        };
        config.notifications.enabled = false;
        config
    }

    async fn mount_whoami(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/whoami"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "user_id": "u1", "email": "a@b.c", "terms_agreed": false }
            })))
            .mount(server)
            .await;
    }

    fn output(cli: Cli<Vec<u8>>) -> String {
        String::from_utf8(cli.into_output()).unwrap()
    }

    #[test_case("y", Permission::Granted ; "short yes")]
    #[test_case("YES\n", Permission::Granted ; "long yes")]
    #[test_case("n", Permission::Denied ; "no")]
    #[test_case("", Permission::Default ; "dismissed")]
    #[test_case("maybe", Permission::Default ; "unclear")]
    fn test_parse_answer(line: &str, expected: Permission) {
        assert_eq!(parse_answer(line), expected);
    }

    #[tokio::test]
    async fn test_subscribe_then_status() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        mount_whoami(&server).await;
        Mock::given(method("POST"))
            .and(path("/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": null
            })))
            .expect(1)
            .mount(&server)
            .await;
        let storage = StorageManager::with_dir(dir.path().to_path_buf());

        let mut cli = Cli::new(config(&server), Some(storage.clone()), granting(), Vec::new());
        cli.run(Command::Subscribe).await.unwrap();
        assert!(output(cli).contains("Push notifications enabled."));

        let state = storage.load_state().unwrap();
        assert_eq!(state.permission, Permission::Granted);
        assert!(state.subscription.is_some());

        let mut cli = Cli::new(config(&server), Some(storage), granting(), Vec::new());
        cli.run(Command::Status).await.unwrap();
        let text = output(cli);
        assert!(text.contains("signed in as u1"));
        assert!(text.contains("Permission:   granted"));
        assert!(text.contains("Subscription: Subscribed"));
    }

    #[tokio::test]
    async fn test_whoami_prints_user() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        mount_whoami(&server).await;

        let mut cli = Cli::new(
            config(&server),
            Some(StorageManager::with_dir(dir.path().to_path_buf())),
            granting(),
            Vec::new(),
        );
        cli.run(Command::Whoami).await.unwrap();

        let text = output(cli);
        assert!(text.contains("User:  u1"));
        assert!(text.contains("Terms: not accepted"));
    }

    #[tokio::test]
    async fn test_permission_command_persists() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::with_dir(dir.path().to_path_buf());

        let mut cli = Cli::new(AppConfig::default(), Some(storage.clone()), granting(), Vec::new());
        cli.run(Command::Permission {
            action: PermissionAction::Deny,
        })
        .await
        .unwrap();

        assert_eq!(storage.load_state().unwrap().permission, Permission::Denied);
        assert_eq!(output(cli), "Notification permission: denied\n");
    }

    #[tokio::test]
    async fn test_deliver_prints_payload() {
        let mut config = AppConfig::default();
        config.notifications.enabled = false;

        let mut cli = Cli::new(config, None, granting(), Vec::new());
        cli.run(Command::Deliver {
            payload: r#"{"title":"Hi","body":"there"}"#.to_string(),
        })
        .await
        .unwrap();

        assert_eq!(output(cli), "Hi: there\n");
    }

    #[tokio::test]
    async fn test_agree_terms_requires_session() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/users/whoami"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let mut cli = Cli::new(
            config(&server),
            Some(StorageManager::with_dir(dir.path().to_path_buf())),
            granting(),
            Vec::new(),
        );

        assert!(cli.run(Command::AgreeTerms).await.is_err());
    }
}
