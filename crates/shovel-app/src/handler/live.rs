//! Push channel events

use shovel_client::LiveEvent;
use shovel_core::prelude::*;

use crate::live_channel::LiveChange;
use crate::state::AppState;
use crate::timeline::TickClock;

use super::list::fresh_load;
use super::UpdateResult;

/// Fold a push event into the channel and react to what changed.
///
/// Repeated payloads change nothing and trigger nothing.
pub fn handle_live_event(state: &mut AppState, event: LiveEvent) -> UpdateResult {
    let kind = event.kind();
    let Some(change) = state.live.apply(event) else {
        trace!("Push event '{}' unchanged", kind);
        return UpdateResult::none();
    };

    match change {
        LiveChange::Offline(offline) => {
            if offline {
                info!("Push channel offline");
            } else {
                info!("Push channel connected");
            }
            state.push_offline = offline;
            UpdateResult::none()
        }
        LiveChange::Config => {
            let Some(config) = state.live.config() else {
                return UpdateResult::none();
            };
            state.clock = TickClock::from_config(config);
            debug!("Session config changed: {:?}", state.clock);
            // Tick markers and service labels depend on the config.
            fresh_load(state)
        }
        LiveChange::TimestampBounds | LiveChange::AppProtoList | LiveChange::TagList => {
            debug!("Push event '{}' applied", kind);
            UpdateResult::none()
        }
    }
}
