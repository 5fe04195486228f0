//! Actions - the transition table's alphabet

use serde::{Deserialize, Serialize};

use crate::state::CityRecord;

/// State transitions. Each data-access function dispatches exactly one
/// `FetchStarted` and at most one completion/failure action.
///
/// The enum is closed: an unrecognized action is unrepresentable, so the
/// reducer's match can be exhaustive without a catch-all arm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Intent: a request is about to go out
    FetchStarted,

    /// Result: the full city list arrived
    CitiesDidLoad(Vec<CityRecord>),

    /// Result: a single-city lookup finished (`None` when the id is unknown)
    CityDidLoad(Option<CityRecord>),

    /// Result: the backend accepted a new city and assigned its id
    CityDidCreate(CityRecord),

    /// Result: the city with this id was removed
    CityDidDelete(i64),

    /// Result: the request failed; payload is the operation's fixed message
    FetchDidError(String),
}
