//! Application services - typed REST calls against the session server and
//! the rules API.

pub mod character_service;
pub mod group_service;
pub mod monster_service;
pub mod rules_service;
pub mod session_service;

pub use character_service::CharacterService;
pub use group_service::GroupService;
pub use monster_service::MonsterService;
pub use rules_service::RulesService;
pub use session_service::SessionService;
