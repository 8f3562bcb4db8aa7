// Board engine: tile assembly, session state, tile state machines

pub mod assembler;
pub mod error;
pub mod loader;
pub mod quiz_game;
pub mod router;
pub mod session;
pub mod tile;

pub use assembler::{QuizAssembler, MAX_TILES};
pub use error::GameError;
pub use loader::{load_game, GameDefaults};
pub use quiz_game::{GameSnapshot, GroupScore, QuizGame};
pub use router::AckRouter;
pub use session::{Session, SessionRules};
pub use tile::{ClickOutcome, Outcome, Resolution, TileMachine, TileState};
