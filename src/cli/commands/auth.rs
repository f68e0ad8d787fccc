//! Sign-in and organization commands: `login`, `logout`, `whoami`,
//! `organizations` and `use`.

use crate::auth::{
    ApiClient, AuthClient, Clock, DeviceAuthorization, ServiceEndpoint, SystemClock, TokenExchange,
};
use crate::cli::args::UseArgs;
use crate::cli::context::AppContext;
use crate::error::Result;
use crate::ui::{SpinnerHandle, Table, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// `kap login`
pub struct LoginCommand<'a> {
    ctx: &'a AppContext,
}

impl<'a> LoginCommand<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Run the device flow against `exchange`, timing polls with `clock`.
    pub fn run_with<E, C>(
        &self,
        ui: &mut dyn UserInterface,
        exchange: &E,
        clock: &C,
    ) -> Result<CommandResult>
    where
        E: TokenExchange + ?Sized,
        C: Clock + ?Sized,
    {
        let mut auth = self.ctx.auth()?;
        if auth.uses_service_credentials() {
            ui.warning("Service credentials are set in the environment and take precedence");
        }

        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;
        let result = auth.login_with(exchange, clock, |authorization| {
            show_code(ui, authorization);
            spinner = Some(ui.start_spinner("Waiting for verification"));
        });

        match (result, spinner.as_mut()) {
            (Ok(()), Some(spinner)) => spinner.finish_success("Verified"),
            (Err(e), Some(spinner)) => {
                spinner.finish_error("Verification failed");
                return Err(e);
            }
            (Err(e), None) => return Err(e),
            (Ok(()), None) => {}
        }

        match auth.current_identity() {
            Ok(identity) => ui.success(&format!(
                "Signed in as {} ({})",
                identity.display_name(),
                identity.handle
            )),
            Err(e) => {
                tracing::warn!("Could not look up the signed-in identity: {}", e);
                ui.success("Signed in");
            }
        }

        Ok(CommandResult::success())
    }
}

fn show_code(ui: &mut dyn UserInterface, authorization: &DeviceAuthorization) {
    let uri = authorization.browser_uri();
    ui.message(&format!("Open {} in your browser", uri));
    ui.message(&format!("and confirm the code {}", authorization.user_code));

    if ui.is_interactive() {
        if let Err(e) = open::that(uri) {
            tracing::debug!("Could not open a browser: {}", e);
        }
    }
}

impl Command for LoginCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = &self.ctx.settings;
        let api = ApiClient::new(ServiceEndpoint::new(&settings.base_url, &settings.client_id))?;
        self.run_with(ui, &api, &SystemClock)
    }
}

/// `kap logout`
pub struct LogoutCommand<'a> {
    ctx: &'a AppContext,
}

impl<'a> LogoutCommand<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }
}

impl Command for LogoutCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut auth = self.ctx.auth()?;

        if auth.logout()? {
            ui.success("Signed out");
        } else {
            ui.message("Not signed in");
        }

        Ok(CommandResult::success())
    }
}

/// `kap whoami`
pub struct WhoamiCommand<'a> {
    ctx: &'a AppContext,
}

impl<'a> WhoamiCommand<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }
}

impl Command for WhoamiCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut auth = self.ctx.auth()?;
        let identity = auth.current_identity()?;

        ui.message(&format!(
            "{} ({})",
            identity.display_name(),
            identity.handle
        ));
        if let Some(context) = auth.current_context() {
            ui.message(&format!(
                "Acting as {} ({})",
                context.identity.display_name(),
                context.handle()
            ));
        }

        Ok(CommandResult::success())
    }
}

/// `kap organizations`
pub struct OrganizationsCommand<'a> {
    ctx: &'a AppContext,
}

impl<'a> OrganizationsCommand<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }
}

impl Command for OrganizationsCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut auth = self.ctx.auth()?;
        let memberships = auth.memberships()?;

        if memberships.is_empty() {
            ui.message("You are not a member of any organization");
            return Ok(CommandResult::success());
        }

        let active = active_handle(&auth);
        let mut table = Table::new(vec!["", "Handle", "Name"]);
        for membership in &memberships {
            let marker = if active.as_deref() == Some(membership.handle()) {
                "*"
            } else {
                ""
            };
            table.add_row(&[
                marker,
                membership.handle(),
                membership.identity.display_name(),
            ]);
        }
        ui.message(&table.render());

        Ok(CommandResult::success())
    }
}

fn active_handle(auth: &AuthClient) -> Option<String> {
    auth.current_context().map(|m| m.handle().to_string())
}

/// `kap use`
pub struct UseCommand<'a> {
    ctx: &'a AppContext,
    args: UseArgs,
}

impl<'a> UseCommand<'a> {
    pub fn new(ctx: &'a AppContext, args: UseArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for UseCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut auth = self.ctx.auth()?;

        match &self.args.handle {
            Some(handle) => {
                let membership = auth.switch_context_to(handle)?;
                ui.success(&format!(
                    "Now acting as {} ({})",
                    membership.identity.display_name(),
                    membership.handle()
                ));
            }
            None => {
                auth.remove_context()?;
                ui.success("Now acting as yourself");
            }
        }

        Ok(CommandResult::success())
    }
}
