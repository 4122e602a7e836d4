//! Scryer domain: creatures, sessions and the value objects shared by every
//! participant of a combat-tracking session. No I/O lives here.

extern crate self as scryer_domain;

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    Condition, Creature, CustomMonster, Monster, NewSession, PlayerInput, PlayerMessage,
    RollRequest, Session, SessionGroup, Skill, ThreadKey, INITIATIVE_DESCRIPTION,
};

pub use error::DomainError;

pub use ids::{ClientId, CreatureId, GroupId, MonsterId, SessionId};

pub use value_objects::{
    ApiReference, DiceFormula, DiceParseError, DiceRollResult, Filter, FilterField,
    FilterOperator, HealthDescription, HitPoints, LogicType, ResourceList, Role, RootFilter,
    SessionIdentity, DUNGEON_MASTER_NAME, OBSERVER_NAME, UNBOUNDED_MAXIMUM,
};
