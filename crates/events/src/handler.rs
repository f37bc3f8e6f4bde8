use wms_core::Aggregate;

/// Decide and evolve in one step, without persistence.
///
/// Calls `handle` and applies every emitted event to `aggregate`. The unit of
/// work in `wms-infra` does the same thing but also appends to the store; this
/// helper is what aggregate tests use.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
