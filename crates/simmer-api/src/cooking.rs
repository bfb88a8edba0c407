// Cooking command dispatch
//
// Translates typed cook programs into the vendor's capability payload
// and submits them through `POST /cooking/execute`. All validation
// happens before the network is touched; commands are never retried
// after a non-auth failure because the appliance may already have
// acted.

use tracing::{debug, warn};

use crate::client::CloudClient;
use crate::error::Error;
use crate::models::{
    Appliance, Capability, CookCommand, CookProgram, ExecuteRequest, KeepWarmUpdate,
    PressureCookUpdate, PressureLevel, ProgramState, VentingMode, WarmTemp,
};

impl CloudClient {
    /// Cancel whatever program is active on the appliance.
    ///
    /// Idempotent at the vendor level: cancelling an idle appliance is
    /// accepted and changes nothing.
    pub async fn cancel(&self, appliance: &Appliance) -> Result<(), Error> {
        self.execute(appliance, CookCommand::Cancel, None).await?;
        self.note_state(&appliance.device_id, ProgramState::Idle);
        Ok(())
    }

    /// Start a keep-warm program.
    pub async fn start_keep_warm(
        &self,
        appliance: &Appliance,
        temp: WarmTemp,
        duration_seconds: u32,
    ) -> Result<(), Error> {
        self.start(
            appliance,
            &CookProgram::KeepWarm {
                temp,
                duration_seconds,
            },
        )
        .await
    }

    /// Start a pressure-cook program.
    pub async fn start_pressure_cook(
        &self,
        appliance: &Appliance,
        pressure: PressureLevel,
        cook_time_seconds: u32,
        venting: VentingMode,
        vent_time_seconds: Option<u32>,
        nutriboost: bool,
    ) -> Result<(), Error> {
        self.start(
            appliance,
            &CookProgram::PressureCook {
                pressure,
                cook_time_seconds,
                venting,
                vent_time_seconds,
                nutriboost,
            },
        )
        .await
    }

    /// Start any cook program.
    ///
    /// Known vendor quirk: if the appliance already has an active
    /// program, the cloud accepts this call and performs no state
    /// change -- indistinguishable from success at the protocol level.
    /// When the client's own state mirror says Active it flags the
    /// situation, but still returns Ok; callers that want the new
    /// program to actually run must [`cancel`](Self::cancel) first.
    pub async fn start(&self, appliance: &Appliance, program: &CookProgram) -> Result<(), Error> {
        program.validate()?;

        if self.program_state(&appliance.device_id) == ProgramState::Active {
            warn!(
                device_id = %appliance.device_id,
                "appliance already reports an active program; the cloud will accept this start \
                 and silently ignore it -- cancel first to switch programs"
            );
        }

        self.execute(appliance, CookCommand::Start, Some(program.capability()))
            .await?;
        self.note_state(&appliance.device_id, ProgramState::Active);
        Ok(())
    }

    /// Adjust the active keep-warm program.
    ///
    /// Assumes a program is active; with none, vendor behavior is
    /// undefined and any rejection surfaces as an ordinary
    /// [`Error::Command`].
    pub async fn update_keep_warm(
        &self,
        appliance: &Appliance,
        update: &KeepWarmUpdate,
    ) -> Result<(), Error> {
        let capability = update.capability()?;
        self.execute(appliance, CookCommand::Update, Some(capability))
            .await?;
        self.note_state(&appliance.device_id, ProgramState::Active);
        Ok(())
    }

    /// Adjust the active pressure-cook program. Same active-program
    /// assumption as [`update_keep_warm`](Self::update_keep_warm).
    pub async fn update_pressure_cook(
        &self,
        appliance: &Appliance,
        update: &PressureCookUpdate,
    ) -> Result<(), Error> {
        let capability = update.capability()?;
        self.execute(appliance, CookCommand::Update, Some(capability))
            .await?;
        self.note_state(&appliance.device_id, ProgramState::Active);
        Ok(())
    }

    /// `POST /cooking/execute`
    ///
    /// The cloud usually answers 202; any 2xx counts as accepted.
    async fn execute(
        &self,
        appliance: &Appliance,
        command: CookCommand,
        capability: Option<Capability>,
    ) -> Result<(), Error> {
        let url = self.endpoint("cooking/execute")?;
        let body = ExecuteRequest {
            appliance_module_idx: appliance.module_idx,
            device_id: &appliance.device_id,
            command: command.vendor_id(),
            composite_capabilities: Vec::new(),
            capability,
        };

        debug!(command = command.vendor_id(), device_id = %appliance.device_id, "POST {url}");

        let resp = self
            .send_authorized(|http, token| http.post(url.clone()).bearer_auth(token).json(&body))
            .await?;

        let status = resp.status();
        if status.is_success() {
            debug!(%status, "command accepted");
            return Ok(());
        }

        let message = resp.text().await.unwrap_or_default();
        Err(Error::Command {
            status: status.as_u16(),
            message,
        })
    }
}
