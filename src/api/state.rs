use crate::broadcast::StatusBroadcast;
use crate::storage::Pool;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub broadcast: StatusBroadcast,
}
