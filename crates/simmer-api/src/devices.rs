// Device discovery endpoints
//
// The account profile at `GET /user/` is the only place the cloud
// exposes which appliances an account owns; device ids from here feed
// every cooking command.

use tracing::debug;

use crate::client::CloudClient;
use crate::error::Error;
use crate::models::{Device, UserProfile};

impl CloudClient {
    /// List the appliances registered to the account, in cloud order.
    ///
    /// `GET /user/`
    ///
    /// An account with zero appliances is a lookup failure: there is
    /// nothing to command, and setup should tell the user so.
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        debug!("discovering appliances");
        let profile: UserProfile = self.get_json("user/").await.map_err(lookup_error)?;

        if profile.devices.is_empty() {
            return Err(Error::DeviceLookup {
                message: "no appliances are registered to this account".into(),
            });
        }
        Ok(profile.devices)
    }

    /// Find one appliance by device id. `None` when the account has
    /// devices but none matches.
    pub async fn find_device(&self, device_id: &str) -> Result<Option<Device>, Error> {
        let devices = self.list_devices().await?;
        Ok(devices.into_iter().find(|d| d.device_id == device_id))
    }

    /// Raw capability document for an appliance model.
    ///
    /// `GET /appliances/{model_id}`
    ///
    /// Returned unparsed: the document is large, vendor-versioned, and
    /// only consumed for diagnostics.
    pub async fn appliance_capabilities(
        &self,
        model_id: &str,
    ) -> Result<serde_json::Value, Error> {
        debug!(model_id, "fetching appliance capabilities");
        self.get_json(&format!("appliances/{model_id}")).await
    }
}

/// Remap generic call failures into the device-lookup taxonomy, leaving
/// credential and timeout failures recognizable to the setup flow.
fn lookup_error(err: Error) -> Error {
    match err {
        Error::Authentication { .. } | Error::Timeout { .. } | Error::Validation { .. } => err,
        other => Error::DeviceLookup {
            message: other.to_string(),
        },
    }
}
