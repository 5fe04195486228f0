//! Reducer - pure function: (state, action) -> next state

use crate::action::Action;
use crate::state::AppState;

/// Applies one transition in place. Deterministic and free of I/O; every
/// await point in the crate lives in the provider's data-access functions.
///
/// Completions do not clear `error`; only a newer failure overwrites it.
pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::FetchStarted => {
            state.is_loading = true;
        }

        Action::CitiesDidLoad(cities) => {
            state.is_loading = false;
            state.cities = cities;
        }

        Action::CityDidLoad(city) => {
            state.is_loading = false;
            state.current_city = city;
        }

        Action::CityDidCreate(city) => {
            state.is_loading = false;
            state.cities.push(city.clone());
            state.current_city = Some(city);
        }

        Action::CityDidDelete(id) => {
            state.is_loading = false;
            state.cities.retain(|city| city.id != id);
            state.current_city = None;
        }

        Action::FetchDidError(message) => {
            state.is_loading = false;
            state.error = message;
        }
    }
}
