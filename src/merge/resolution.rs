use crate::catalog::Entity;
use crate::locator::AssetKind;
use crate::resolver::ResolutionOutcome;

/// Folds a resolution outcome into an entity
///
/// Gap-filling: the path is recorded only when the entity has no path for
/// that kind yet. Failed and not-found outcomes never touch the entity.
///
/// Returns true if the entity changed.
pub fn apply_resolution(entity: &mut Entity, kind: AssetKind, outcome: &ResolutionOutcome) -> bool {
    let path = match outcome.path() {
        Some(path) => path,
        None => return false,
    };

    if entity.asset_refs.get(kind).is_some() {
        return false;
    }

    entity.asset_refs.set(kind, path.to_string());
    true
}
