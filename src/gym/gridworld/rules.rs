use std::{collections::HashMap, str::FromStr};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, VariantArray};

use super::{Grid, Pos};
use crate::{Error, Result};

/// A move on the grid
///
/// Parses from and displays as the single-letter tokens used in rule files.
#[derive(
    EnumIter,
    VariantArray,
    EnumString,
    Display,
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
)]
pub enum Action {
    #[strum(serialize = "L")]
    Left = 0,
    #[strum(serialize = "R")]
    Right = 1,
    #[strum(serialize = "U")]
    Up = 2,
    #[strum(serialize = "D")]
    Down = 3,
}

impl Action {
    /// Number of distinct moves
    pub const COUNT: usize = 4;

    /// `(row, column)` displacement of the move
    pub fn offset(self) -> (isize, isize) {
        match self {
            Action::Left => (0, -1),
            Action::Right => (0, 1),
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
        }
    }

    /// The neighbouring position in this direction, if it is not negative
    ///
    /// Upper bounds are not checked.
    pub fn apply(self, (row, col): Pos) -> Option<Pos> {
        let (dr, dc) = self.offset();
        Some((row.checked_add_signed(dr)?, col.checked_add_signed(dc)?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Actions,
    Rewards,
    Transitions,
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "ACTIONS" => Ok(Section::Actions),
            "REWARDS" => Ok(Section::Rewards),
            "TRANSITIONS" => Ok(Section::Transitions),
            _ => Err(Error::RuleFormat(format!("unknown section [{name}]"))),
        }
    }
}

/// Validated movement and reward rules for a [`Grid`]
#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    actions: Vec<Action>,
    default_reward: i32,
    custom_rewards: HashMap<(Pos, Action), i32>,
}

impl Rules {
    /// Build rules directly from already validated parts
    ///
    /// Actions are deduplicated and sorted into canonical `L, R, U, D` order.
    pub fn new(
        actions: impl IntoIterator<Item = Action>,
        default_reward: i32,
        custom_rewards: HashMap<(Pos, Action), i32>,
    ) -> Self {
        let mut actions = actions.into_iter().collect::<Vec<_>>();
        actions.sort_unstable();
        actions.dedup();
        Self {
            actions,
            default_reward,
            custom_rewards,
        }
    }

    /// Parse the sectioned rules format, validating custom reward targets against `grid`
    ///
    /// ```text
    /// [ACTIONS]
    /// L
    /// R
    /// [REWARDS]
    /// DEFAULT = -1
    /// 3,4-U = 0   # reaching the goal is free
    /// ```
    pub fn parse(text: &str, grid: &Grid) -> Result<Self> {
        let mut section = None;
        let mut actions = Vec::new();
        let mut default_reward = None;
        let mut custom_rewards = HashMap::new();

        for (n, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| {
                    Error::RuleFormat(format!("line {}: unterminated header {line:?}", n + 1))
                })?;
                section = Some(name.trim().parse::<Section>()?);
                continue;
            }

            match section {
                None => {
                    return Err(Error::RuleFormat(format!(
                        "line {}: {line:?} appears outside of any section",
                        n + 1
                    )))
                }
                Some(Section::Actions) => {
                    let action = line.parse::<Action>().map_err(|_| {
                        Error::RuleFormat(format!("line {}: invalid action {line:?}", n + 1))
                    })?;
                    actions.push(action);
                }
                Some(Section::Rewards) => {
                    let (key, value) = parse_assignment(line).ok_or_else(|| {
                        Error::RuleFormat(format!("line {}: malformed reward {line:?}", n + 1))
                    })?;
                    if key == "DEFAULT" {
                        default_reward = Some(value);
                    } else {
                        let target = parse_reward_target(key, grid).map_err(|msg| {
                            Error::RuleFormat(format!("line {}: {msg}", n + 1))
                        })?;
                        custom_rewards.insert(target, value);
                    }
                }
                Some(Section::Transitions) => {
                    log::debug!("ignoring transition rule {line:?}");
                }
            }
        }

        if actions.is_empty() {
            return Err(Error::RuleFormat(String::from("no actions configured")));
        }
        let default_reward = default_reward
            .ok_or_else(|| Error::RuleFormat(String::from("missing DEFAULT reward")))?;

        Ok(Self::new(actions, default_reward, custom_rewards))
    }

    /// Every configured action, in canonical order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn default_reward(&self) -> i32 {
        self.default_reward
    }

    pub fn custom_rewards(&self) -> &HashMap<(Pos, Action), i32> {
        &self.custom_rewards
    }

    /// Reward for taking `action` in `pos`: the custom override if there is one, else the default
    pub fn reward(&self, pos: Pos, action: Action) -> i32 {
        self.custom_rewards
            .get(&(pos, action))
            .copied()
            .unwrap_or(self.default_reward)
    }
}

impl Default for Rules {
    /// All four moves with a reward of `-1` each
    fn default() -> Self {
        Self::new(Action::iter(), -1, HashMap::new())
    }
}

/// Split `key = <int>`
fn parse_assignment(line: &str) -> Option<(&str, i32)> {
    let (key, value) = line.split_once('=')?;
    Some((key.trim(), value.trim().parse().ok()?))
}

/// Parse `<row>,<col>-<Action>` and check it addresses the grid
fn parse_reward_target(key: &str, grid: &Grid) -> std::result::Result<(Pos, Action), String> {
    let malformed = || format!("malformed reward target {key:?}");
    let (pos, action) = key.split_once('-').ok_or_else(malformed)?;
    let (row, col) = pos.split_once(',').ok_or_else(malformed)?;
    let pos = (
        row.trim().parse::<usize>().map_err(|_| malformed())?,
        col.trim().parse::<usize>().map_err(|_| malformed())?,
    );
    let action = action
        .trim()
        .parse::<Action>()
        .map_err(|_| format!("invalid action in reward target {key:?}"))?;
    if !grid.contains(pos) {
        return Err(format!("reward target {pos:?} is off the grid"));
    }
    Ok((pos, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gym::gridworld::fixtures::{GRID, RULES};

    fn grid() -> Grid {
        GRID.parse().unwrap()
    }

    fn parse_err(text: &str) -> String {
        match Rules::parse(text, &grid()) {
            Err(Error::RuleFormat(msg)) => msg,
            other => panic!("expected a rule format error, got {other:?}"),
        }
    }

    #[test]
    fn action_tokens() {
        assert_eq!("L".parse::<Action>().unwrap(), Action::Left);
        assert_eq!("D".parse::<Action>().unwrap(), Action::Down);
        assert!("l".parse::<Action>().is_err(), "Tokens are case-sensitive");
        assert_eq!(Action::Up.to_string(), "U");
    }

    #[test]
    fn action_apply() {
        assert_eq!(Action::Up.apply((0, 3)), None, "Cannot move above row 0");
        assert_eq!(Action::Left.apply((2, 0)), None, "Cannot move left of column 0");
        assert_eq!(Action::Down.apply((2, 0)), Some((3, 0)));
        assert_eq!(Action::Right.apply((2, 0)), Some((2, 1)));
    }

    #[test]
    fn parses_scenario_rules() {
        let rules = Rules::parse(RULES, &grid()).unwrap();
        assert_eq!(rules.actions(), Action::VARIANTS, "All actions, canonical order");
        assert_eq!(rules.default_reward(), -1, "Default reward");
        assert_eq!(rules.reward((1, 4), Action::Down), 0, "Custom reward 1,4-D");
        assert_eq!(rules.reward((2, 3), Action::Right), 0, "Custom reward 2,3-R");
        assert_eq!(rules.reward((3, 4), Action::Up), 0, "Custom reward 3,4-U");
        assert_eq!(rules.reward((3, 4), Action::Left), -1, "Falls back to default");
    }

    #[test]
    fn actions_are_deduplicated_and_ordered() {
        let rules = Rules::parse("[ACTIONS]\nU\nL\nU\n[REWARDS]\nDEFAULT=-2", &grid()).unwrap();
        assert_eq!(rules.actions(), [Action::Left, Action::Up]);
        assert_eq!(rules.default_reward(), -2);
    }

    #[test]
    fn transitions_section_is_inert() {
        let text = "[ACTIONS]\nR\n[TRANSITIONS]\nanything goes\n[REWARDS]\nDEFAULT = 0\n";
        let rules = Rules::parse(text, &grid()).unwrap();
        assert_eq!(rules.actions(), [Action::Right]);
    }

    #[test]
    fn rejects_invalid_action() {
        assert!(parse_err("[ACTIONS]\nL\nJ\n").contains("invalid action"));
    }

    #[test]
    fn rejects_malformed_rewards() {
        let head = "[ACTIONS]\nL\n[REWARDS]\nDEFAULT = -1\n";
        assert!(parse_err(&format!("{head}DEFAULT -1")).contains("malformed reward"));
        assert!(parse_err(&format!("{head}DEFAULT = x")).contains("malformed reward"));
        assert!(parse_err(&format!("{head}1;1-L = 0")).contains("malformed reward target"));
        assert!(parse_err(&format!("{head}1,1L = 0")).contains("malformed reward target"));
        assert!(parse_err(&format!("{head}1,1-Q = 0")).contains("invalid action"));
        assert!(parse_err(&format!("{head}5,0-U = 0")).contains("off the grid"));
    }

    #[test]
    fn rejects_structural_problems() {
        assert!(parse_err("L\n").contains("outside of any section"));
        assert!(parse_err("[ACTIONS\nL\n").contains("unterminated"));
        assert!(parse_err("[MOVES]\nL\n").contains("unknown section"));
        assert!(parse_err("[REWARDS]\nDEFAULT = 1\n").contains("no actions"));
        assert!(parse_err("[ACTIONS]\nL\n").contains("missing DEFAULT"));
    }
}
