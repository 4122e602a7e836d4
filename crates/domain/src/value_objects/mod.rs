//! Value objects - Immutable objects defined by their attributes

mod dice;
mod filter;
mod hit_points;
mod identity;
mod reference;
mod role;

pub use dice::{DiceFormula, DiceParseError, DiceRollResult};
pub use filter::{Filter, FilterField, FilterOperator, LogicType, RootFilter};
pub use hit_points::{HealthDescription, HitPoints, UNBOUNDED_MAXIMUM};
pub use identity::SessionIdentity;
pub use reference::{ApiReference, ResourceList};
pub use role::{Role, DUNGEON_MASTER_NAME, OBSERVER_NAME};
