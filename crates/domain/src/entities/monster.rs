use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::MonsterId;
use crate::value_objects::{ApiReference, DiceFormula, HitPoints, Role};

use super::Creature;

/// A monster stat block, either from the rules API or authored by the DM.
///
/// Only the fields the tracker reads are typed; everything else the stat
/// block carries is kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub desc: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub monster_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_dice: Option<String>,
    /// Full hit-point formula, e.g. "2d6+2"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points_roll: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dexterity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Monster {
    pub fn reference(&self) -> ApiReference {
        ApiReference {
            index: self.index.clone(),
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }

    /// Dexterity modifier, the bonus applied to initiative rolls.
    pub fn initiative_bonus(&self) -> i32 {
        self.dexterity
            .map(|dex| (dex - 10).div_euclid(2))
            .unwrap_or(0)
    }

    /// A fresh non-player creature at full health for the initiative order.
    pub fn to_creature(&self, initiative: i32) -> Creature {
        self.creature_with(initiative, self.hit_points.unwrap_or(0).max(0))
    }

    /// A fresh non-player creature with rolled hit points and a
    /// 1d20 + dexterity initiative.
    ///
    /// Hit points come from `hit_points_roll`, then `hit_dice`; a stat block
    /// with neither falls back to its listed average.
    pub fn roll_creature(&self, roll_die: &mut impl FnMut(u32) -> u32) -> Creature {
        let hp = match self.hit_point_formula() {
            Some(formula) => formula.roll_with(&mut *roll_die).total.max(1),
            None => self.hit_points.unwrap_or(0).max(0),
        };
        let initiative = DiceFormula {
            count: 1,
            sides: 20,
            modifier: self.initiative_bonus(),
        }
        .roll_with(&mut *roll_die)
        .total;
        self.creature_with(initiative, hp)
    }

    fn hit_point_formula(&self) -> Option<DiceFormula> {
        [&self.hit_points_roll, &self.hit_dice]
            .into_iter()
            .flatten()
            .find_map(|raw| DiceFormula::parse(raw).ok())
    }

    fn creature_with(&self, initiative: i32, hp: i32) -> Creature {
        Creature::new(self.name.clone(), initiative, HitPoints::from((hp, hp)), Role::NonPlayer)
            .with_monster(self.index.clone())
    }
}

/// A DM-authored monster as stored for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMonster {
    #[serde(default = "MonsterId::nil")]
    pub monster_id: MonsterId,
    #[serde(flatten)]
    pub stat_block: Monster,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin_json() -> Value {
        serde_json::json!({
            "index": "goblin",
            "name": "Goblin",
            "url": "/api/monsters/goblin",
            "size": "Small",
            "type": "humanoid",
            "hit_points": 7,
            "hit_dice": "2d6",
            "hit_points_roll": "2d6",
            "dexterity": 14,
            "challenge_rating": 0.25,
            "speed": {"walk": "30 ft."},
            "actions": [{"name": "Scimitar"}]
        })
    }

    #[test]
    fn unknown_stat_block_fields_survive() {
        let monster: Monster = serde_json::from_value(goblin_json()).unwrap();
        assert_eq!(monster.monster_type.as_deref(), Some("humanoid"));
        assert!(monster.extra.contains_key("speed"));

        let back = serde_json::to_value(&monster).unwrap();
        assert_eq!(back["actions"][0]["name"], "Scimitar");
        assert_eq!(back["type"], "humanoid");
    }

    #[test]
    fn to_creature_starts_at_full_health() {
        let monster: Monster = serde_json::from_value(goblin_json()).unwrap();
        assert_eq!(monster.initiative_bonus(), 2);

        let creature = monster.to_creature(13);
        assert_eq!(creature.role, Role::NonPlayer);
        assert_eq!(creature.hit_points.current(), 7);
        assert_eq!(creature.hit_points.maximum(), Some(7));
        assert_eq!(creature.monster.as_deref(), Some("goblin"));
    }

    #[test]
    fn low_dexterity_gives_a_penalty() {
        let mut monster: Monster = serde_json::from_value(goblin_json()).unwrap();
        monster.dexterity = Some(7);
        assert_eq!(monster.initiative_bonus(), -2);
    }

    #[test]
    fn rolled_creature_uses_hit_point_roll_and_dexterity() {
        let mut monster: Monster = serde_json::from_value(goblin_json()).unwrap();
        monster.hit_points_roll = Some("2d6+2".into());
        let mut faces = [3, 5, 11].into_iter();

        let creature = monster.roll_creature(&mut |_| faces.next().unwrap_or(1));

        assert_eq!(creature.hit_points.current(), 10);
        assert_eq!(creature.hit_points.maximum(), Some(10));
        assert_eq!(creature.initiative, 13);
        assert_eq!(creature.role, Role::NonPlayer);
        assert_eq!(creature.monster.as_deref(), Some("goblin"));
        assert!(creature.creature_id.is_nil());
    }

    #[test]
    fn rolled_creature_falls_back_to_hit_dice_then_average() {
        let mut monster: Monster = serde_json::from_value(goblin_json()).unwrap();
        monster.hit_points_roll = Some("lots".into());
        let creature = monster.roll_creature(&mut |sides| sides);
        assert_eq!(creature.hit_points.current(), 12);
        assert_eq!(creature.initiative, 22);

        monster.hit_points_roll = None;
        monster.hit_dice = None;
        let creature = monster.roll_creature(&mut |_| 1);
        assert_eq!(creature.hit_points.current(), 7);
        assert_eq!(creature.initiative, 3);
    }
}
