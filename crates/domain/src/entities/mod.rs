//! Entities tracked by a combat session

mod creature;
mod message;
mod monster;
mod player_input;
mod rules;
mod session;

pub use creature::Creature;
pub use message::{PlayerMessage, ThreadKey};
pub use monster::{CustomMonster, Monster};
pub use player_input::{PlayerInput, RollRequest};
pub use rules::{Condition, Skill, INITIATIVE_DESCRIPTION};
pub use session::{NewSession, Session, SessionGroup};
