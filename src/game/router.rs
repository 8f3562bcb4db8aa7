use super::{GameError, Resolution, Session, TileMachine};

/// Routes the shared "confirm" input to the tile that is waiting for it.
///
/// There is a single router per game instead of one listener per tile, and
/// the target is read from the session's active slot, so a confirmation can
/// only ever reach the one tile that currently shows a result. A result that
/// is still hidden, or any result after the game ended, is not committed.
pub struct AckRouter;

impl AckRouter {
    /// Returns `Ok(None)` when no tile is waiting for acknowledgment
    pub fn dispatch(
        session: &mut Session,
        tiles: &mut [TileMachine],
    ) -> Result<Option<Resolution>, GameError> {
        if session.is_game_finished() {
            return Ok(None);
        }
        let Some(index) = session.active_tile() else {
            return Ok(None);
        };
        let Some(tile) = tiles.get_mut(index) else {
            return Ok(None);
        };
        if !tile.awaits_acknowledgment() {
            return Ok(None);
        }

        tile.acknowledge(session).map(Some)
    }
}
