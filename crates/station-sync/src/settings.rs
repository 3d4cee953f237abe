//! Cloud unit preferences.

use tracing::{debug, info};

use station_types::CloudSettings;

use crate::error::Result;
use crate::traits::{CloudClient, LocalConfig};

/// Fetch the account's settings and apply every preference the cloud has.
///
/// Fields the cloud leaves empty keep their local value. Fails only when the
/// fetch fails; applying a preference cannot fail.
pub async fn sync_settings(
    cloud: &dyn CloudClient,
    config: &dyn LocalConfig,
) -> Result<CloudSettings> {
    let settings = cloud.fetch_settings().await?;

    let preferences = settings.preferences();
    for preference in &preferences {
        debug!("Applying cloud preference {:?}", preference);
        config.set_unit(*preference);
    }

    info!("Applied {} cloud unit preference(s)", preferences.len());
    Ok(settings)
}
