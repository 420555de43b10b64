//! Helpers for observing simulation errors in tests.
use bevy::ecs::prelude::On;
use bevy::prelude::*;
use menagerie::sim::SimulationError;

/// Simulation errors captured during tests, in trigger order.
#[derive(Resource, Default, Debug)]
pub struct CapturedErrors(pub Vec<SimulationError>);

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn record_error(event: On<SimulationError>, mut errors: ResMut<CapturedErrors>) {
    errors.0.push(*event.event());
}

/// Installs the error-capturing observer and resource on the provided app.
pub fn install_error_observer(app: &mut App) {
    app.insert_resource(CapturedErrors::default());
    app.world_mut().add_observer(record_error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use menagerie::entity::EntityId;

    #[test]
    fn observer_records_triggered_error() {
        let mut app = App::new();
        install_error_observer(&mut app);
        app.world_mut()
            .trigger(SimulationError::UnknownItem { item: EntityId(4) });
        assert_eq!(
            app.world().resource::<CapturedErrors>().0,
            vec![SimulationError::UnknownItem { item: EntityId(4) }]
        );
    }
}
